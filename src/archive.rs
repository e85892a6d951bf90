//! CRX and ZIP unpacking.
//!
//! A CRX package is a ZIP archive with a signed header in front:
//!
//! | Version | Layout |
//! |---------|--------|
//! | CRX2 | `Cr24`, `u32` version, `u32` key length, `u32` signature length, key, signature, ZIP |
//! | CRX3 | `Cr24`, `u32` version, `u32` header length, protobuf header, ZIP |
//!
//! All integers are little-endian. Signatures are not verified.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::io::Cursor;
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// CRX magic number.
const CRX_MAGIC: &[u8; 4] = b"Cr24";

/// ZIP local file header signature.
const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

/// ZIP end-of-central-directory signature (an empty archive starts with it).
const ZIP_EMPTY_MAGIC: &[u8; 4] = b"PK\x05\x06";

// ============================================================================
// Public Functions
// ============================================================================

/// Unpacks a CRX or ZIP payload into `dest`.
///
/// `dest` is created if it does not exist. Returns the number of archive
/// entries.
///
/// # Errors
///
/// Returns [`Error::InvalidArchive`] if the payload is neither CRX nor ZIP
/// or its header is truncated, and [`Error::Zip`] if the embedded archive
/// is corrupt.
pub fn unpack(bytes: &[u8], dest: &Path) -> Result<usize> {
    let zip_bytes = strip_crx_header(bytes)?;

    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))
        .map_err(|e| Error::invalid_archive(format!("Failed to read ZIP archive: {}", e)))?;
    let entries = archive.len();

    fs::create_dir_all(dest)?;
    archive.extract(dest)?;

    debug!(dest = %dest.display(), entries, "Unpacked extension archive");

    Ok(entries)
}

/// Returns the ZIP portion of a CRX payload.
///
/// Payloads that already start with a ZIP signature are returned as-is.
///
/// # Errors
///
/// Returns [`Error::InvalidArchive`] on unknown magic, unsupported CRX
/// version, or a header longer than the payload.
pub fn strip_crx_header(bytes: &[u8]) -> Result<&[u8]> {
    let Some(magic) = bytes.get(..4) else {
        return Err(Error::invalid_archive("payload shorter than a signature"));
    };

    if magic == ZIP_MAGIC || magic == ZIP_EMPTY_MAGIC {
        return Ok(bytes);
    }

    if magic != CRX_MAGIC {
        return Err(Error::invalid_archive(
            "payload is neither a CRX package nor a ZIP archive",
        ));
    }

    let version = read_u32_le(bytes, 4)?;
    let zip_start = match version {
        2 => {
            let key_len = read_u32_le(bytes, 8)? as usize;
            let sig_len = read_u32_le(bytes, 12)? as usize;
            16usize
                .checked_add(key_len)
                .and_then(|n| n.checked_add(sig_len))
        }
        3 => {
            let header_len = read_u32_le(bytes, 8)? as usize;
            12usize.checked_add(header_len)
        }
        other => {
            return Err(Error::invalid_archive(format!(
                "unsupported CRX version {}",
                other
            )));
        }
    };

    zip_start
        .and_then(|start| bytes.get(start..))
        .ok_or_else(|| Error::invalid_archive("CRX header exceeds payload length"))
}

// ============================================================================
// Private Helpers
// ============================================================================

/// Reads a little-endian `u32` at `offset`.
fn read_u32_le(bytes: &[u8], offset: usize) -> Result<u32> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| Error::invalid_archive("truncated CRX header"))
}

// ============================================================================
// Test Fixtures
// ============================================================================


// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn test_unpack_plain_zip() {
        let temp = tempfile::tempdir().unwrap();
        let zip = fixtures::zip(&[("manifest.json", "{}"), ("js/a.js", "a")]);

        let entries = unpack(&zip, temp.path()).unwrap();

        assert_eq!(entries, 2);
        assert_eq!(
            fs::read_to_string(temp.path().join("js/a.js")).unwrap(),
            "a"
        );
    }

    #[test]
    fn test_unpack_crx3() {
        let temp = tempfile::tempdir().unwrap();
        let crx = fixtures::crx3(&fixtures::zip(&[("manifest.json", "{}")]));

        unpack(&crx, temp.path()).unwrap();

        assert!(temp.path().join("manifest.json").is_file());
    }

    #[test]
    fn test_unpack_crx2() {
        let temp = tempfile::tempdir().unwrap();
        let crx = fixtures::crx2(&fixtures::zip(&[("manifest.json", "{}")]));

        unpack(&crx, temp.path()).unwrap();

        assert!(temp.path().join("manifest.json").is_file());
    }

    #[test]
    fn test_unpack_creates_destination() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("nested").join("ext");

        unpack(&fixtures::zip(&[("manifest.json", "{}")]), &dest).unwrap();

        assert!(dest.join("manifest.json").is_file());
    }

    #[test]
    fn test_strip_rejects_garbage() {
        let err = strip_crx_header(b"<html>not found</html>").unwrap_err();
        assert!(err.is_archive_error());
    }

    #[test]
    fn test_strip_rejects_short_payload() {
        assert!(strip_crx_header(b"PK").is_err());
    }

    #[test]
    fn test_strip_rejects_unknown_version() {
        let mut crx = fixtures::crx3(&fixtures::zip(&[("a", "b")]));
        crx[4..8].copy_from_slice(&7u32.to_le_bytes());

        let err = strip_crx_header(&crx).unwrap_err();
        assert!(err.to_string().contains("unsupported CRX version 7"));
    }

    #[test]
    fn test_strip_rejects_oversized_header() {
        let mut crx = b"Cr24".to_vec();
        crx.extend_from_slice(&3u32.to_le_bytes());
        crx.extend_from_slice(&u32::MAX.to_le_bytes());

        assert!(strip_crx_header(&crx).is_err());
    }

    #[test]
    fn test_unpack_corrupt_zip_fails() {
        let temp = tempfile::tempdir().unwrap();
        let mut zip = fixtures::zip(&[("manifest.json", "{}")]);
        zip.truncate(12);

        assert!(unpack(&zip, temp.path()).unwrap_err().is_archive_error());
    }
}
