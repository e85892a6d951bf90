//! Web Store page link parsing.
//!
//! Both link shapes the store has used are accepted:
//!
//! ```text
//! https://chromewebstore.google.com/detail/<name>/<id>
//! https://chrome.google.com/webstore/detail/<name>/<id>
//! ```
//!
//! The name segment is whatever slug the store put in the URL; it becomes
//! the directory name of the unpacked extension.

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{ExtensionId, is_valid_extension_id};

// ============================================================================
// Public Functions
// ============================================================================

/// Extracts `(name, id)` from a Web Store page link.
///
/// Query strings, fragments and trailing path segments (e.g. `/reviews`)
/// are ignored. Segments are percent-decoded.
///
/// # Errors
///
/// Returns [`Error::InvalidLink`] if the link is not a URL, contains no
/// extension id, or has no name segment before the id.
///
/// # Example
///
/// ```
/// use chrome_extension::webstore::parse_link;
///
/// let (name, id) = parse_link(
///     "https://chromewebstore.google.com/detail/adblock/cfhdojbkjhnklbpkdaibdccddilifddb?hl=en",
/// ).unwrap();
///
/// assert_eq!(name, "adblock");
/// assert_eq!(id.as_str(), "cfhdojbkjhnklbpkdaibdccddilifddb");
/// ```
pub fn parse_link(link: &str) -> Result<(String, ExtensionId)> {
    let url = Url::parse(link.trim()).map_err(|e| Error::invalid_link(link, e.to_string()))?;

    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| {
                    urlencoding::decode(s)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| s.to_string())
                })
                .collect()
        })
        .unwrap_or_default();

    let id_index = segments
        .iter()
        .position(|s| is_valid_extension_id(s))
        .ok_or_else(|| Error::invalid_link(link, "no extension id in path"))?;

    let name = segments[..id_index]
        .iter()
        .rev()
        .find(|s| !is_route_segment(s))
        .cloned()
        .ok_or_else(|| Error::invalid_link(link, "no extension name in path"))?;

    let id = ExtensionId::parse(segments[id_index].as_str())?;

    Ok((name, id))
}

// ============================================================================
// Internal Functions
// ============================================================================

/// Fixed route segments that never name an extension.
fn is_route_segment(segment: &str) -> bool {
    matches!(segment, "detail" | "webstore")
}

// ============================================================================
// Tests
// ============================================================================
