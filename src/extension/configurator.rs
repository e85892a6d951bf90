//! Patch hook applied once after a fresh unpack.
//!
//! Implement [`ExtensionConfigurator`] on your own type, or pass a closure:
//!
//! ```no_run
//! use chrome_extension::{Error, Extension, ExtensionOptions, Result};
//!
//! # fn example() -> Result<()> {
//! let extension = Extension::builder()
//!     .link("https://chromewebstore.google.com/detail/captcha-solver/pgojnojmmhpofjgdmaebadhbocahppod")
//!     .option("api_key", "secret")
//!     .configurator(|extension: &Extension, options: &ExtensionOptions| -> Result<()> {
//!         let key = options
//!             .get_str("api_key")
//!             .ok_or_else(|| Error::patch("api_key option is required"))?;
//!         extension
//!             .file("common/config.js")?
//!             .replace_all("YOUR_API_KEY", key)?;
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let flag = extension.load_flag()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;

use super::Extension;
use super::options::ExtensionOptions;

// ============================================================================
// ExtensionConfigurator
// ============================================================================

/// Caller-provided edits for a freshly unpacked extension.
///
/// [`update_files`](Self::update_files) runs exactly once per download:
/// after the archive is unpacked and before the directory is reported as
/// ready. Already patched directories are reused without running it again,
/// unless force-update is set or the options changed.
pub trait ExtensionConfigurator: Send + Sync {
    /// Applies edits to the unpacked files.
    ///
    /// The default implementation leaves the extension untouched.
    ///
    /// The hook may read and edit the extension through [`Extension::path`],
    /// [`Extension::file`], the file listings and [`Extension::manifest`].
    /// Calling [`Extension::load`], [`Extension::load_flag`] or
    /// [`load_extensions_flag`](super::load_extensions_flag) from here fails
    /// with [`Error::InvalidArgument`](crate::Error::InvalidArgument).
    ///
    /// # Errors
    ///
    /// Any error aborts the load and leaves the ledger unrecorded, so the
    /// next load downloads and patches again.
    fn update_files(&self, extension: &Extension, options: &ExtensionOptions) -> Result<()> {
        let _ = (extension, options);
        Ok(())
    }
}

// ============================================================================
// Passthrough
// ============================================================================

/// Configurator that leaves the extension unmodified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Passthrough;

impl ExtensionConfigurator for Passthrough {}

// ============================================================================
// Closure Support
// ============================================================================

impl<F> ExtensionConfigurator for F
where
    F: Fn(&Extension, &ExtensionOptions) -> Result<()> + Send + Sync,
{
    fn update_files(&self, extension: &Extension, options: &ExtensionOptions) -> Result<()> {
        self(extension, options)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use crate::archive::{self, fixtures};
    use crate::error::Error;

    fn unpacked(dir: &tempfile::TempDir) -> Extension {
        let extension = Extension::builder()
            .id("pgojnojmmhpofjgdmaebadhbocahppod")
            .name("solver")
            .extensions_dir(dir.path())
            .option("api_key", "secret")
            .build()
            .unwrap();
        archive::unpack(&fixtures::sample_extension(), extension.path()).unwrap();
        extension
    }

    fn background(extension: &Extension) -> String {
        fs::read_to_string(extension.path().join("background.js")).unwrap()
    }

    #[test]
    fn test_passthrough_leaves_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let extension = unpacked(&dir);

        Passthrough
            .update_files(&extension, extension.options())
            .unwrap();

        assert_eq!(background(&extension), "const API_KEY = 'YOUR_API_KEY';");
    }

    #[test]
    fn test_closure_receives_options() {
        let dir = tempfile::tempdir().unwrap();
        let extension = unpacked(&dir);

        let inject = |ext: &Extension, options: &ExtensionOptions| -> Result<()> {
            let key = options
                .get_str("api_key")
                .ok_or_else(|| Error::patch("api_key option is required"))?;
            ext.file("background.js")?.replace_all("YOUR_API_KEY", key)?;
            Ok(())
        };
        inject.update_files(&extension, extension.options()).unwrap();

        assert_eq!(background(&extension), "const API_KEY = 'secret';");
    }

    #[test]
    fn test_closure_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let extension = unpacked(&dir);

        let failing =
            |_: &Extension, _: &ExtensionOptions| -> Result<()> { Err(Error::patch("boom")) };
        let err = failing
            .update_files(&extension, extension.options())
            .unwrap_err();

        assert!(matches!(err, Error::Patch { .. }));
        assert_eq!(background(&extension), "const API_KEY = 'YOUR_API_KEY';");
    }
}
