//! Chrome Web Store access.
//!
//! # Components
//!
//! | Item | Description |
//! |------|-------------|
//! | [`parse_link`] | Extract name and id from a Web Store page link |
//! | [`download_url`] | Build the CRX download endpoint for an id |
//! | [`ArchiveSource`] | Seam for fetching extension archives |
//! | [`WebStoreClient`] | Blocking HTTP implementation of [`ArchiveSource`] |

// ============================================================================
// Submodules
// ============================================================================

/// Blocking HTTP client for the CRX download endpoint.
pub mod client;

/// Web Store page link parsing.
pub mod link;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{ArchiveSource, DEFAULT_PRODVERSION, WebStoreClient, download_url};
pub use link::parse_link;
