//! chrome-extension - Chrome Web Store extensions for browser automation.
//!
//! This library downloads an extension package from the Chrome Web Store,
//! unpacks it into a cached directory, lets you patch its source files once
//! (e.g. to inject an API key), and hands back the directory or a
//! `--load-extension=` flag for your browser launcher.
//!
//! # Lifecycle
//!
//! - The first [`Extension::load`] downloads, unpacks and runs the
//!   [`ExtensionConfigurator`]
//! - Later loads reuse the patched directory without touching the network
//! - Force-update, a missing directory, or a changed option bag trigger a
//!   fresh download and patch
//!
//! # Quick Start
//!
//! ```no_run
//! use chrome_extension::{Extension, Result};
//!
//! fn main() -> Result<()> {
//!     let extension = Extension::builder()
//!         .link("https://chromewebstore.google.com/detail/ublock-origin/cjpalhdlnbpafiamejdnhcphjbkeiagm")
//!         .build()?;
//!
//!     // Pass this to Chrome / Chromium on the command line
//!     let flag = extension.load_flag()?;
//!     println!("{flag}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`extension`] | [`Extension`], its builder, files and patch hook |
//! | [`webstore`] | Link parsing and the CRX download client |
//! | [`archive`] | CRX/ZIP unpacking |
//! | [`ledger`] | Record of applied patches |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Validated [`ExtensionId`] |

// ============================================================================
// Modules
// ============================================================================

/// CRX and ZIP unpacking.
pub mod archive;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Unpacked extensions, their files and patch hooks.
pub mod extension;

/// Type-safe identifiers.
pub mod identifiers;

/// Record of which options each cached extension was patched with.
pub mod ledger;

/// Chrome Web Store link parsing and downloads.
pub mod webstore;

// ============================================================================
// Re-exports
// ============================================================================

// Extension types
pub use extension::{
    Extension, ExtensionBuilder, ExtensionConfigurator, ExtensionFile, ExtensionOptions,
    Passthrough, load_extensions_flag,
};

// Web Store types
pub use webstore::{ArchiveSource, WebStoreClient};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ExtensionId;
