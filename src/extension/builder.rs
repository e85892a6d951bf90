//! Builder pattern for extension configuration.
//!
//! Provides a fluent API for configuring and creating [`Extension`] instances.
//!
//! # Example
//!
//! ```no_run
//! use chrome_extension::Extension;
//!
//! # fn example() -> chrome_extension::Result<()> {
//! let extension = Extension::builder()
//!     .id("cjpalhdlnbpafiamejdnhcphjbkeiagm")
//!     .name("ublock-origin")
//!     .extensions_dir("./extensions")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{self, Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::ExtensionId;
use crate::ledger::LEDGER_FILE_NAME;
use crate::webstore::{ArchiveSource, WebStoreClient, parse_link};

use super::Extension;
use super::configurator::{ExtensionConfigurator, Passthrough};
use super::options::ExtensionOptions;

// ============================================================================
// Constants
// ============================================================================

/// Environment variable overriding the default extensions directory.
pub const EXTENSIONS_DIR_ENV: &str = "CHROME_EXTENSION_DIR";

/// Default extensions directory, relative to the working directory.
const DEFAULT_EXTENSIONS_DIR: &str = "extensions";

// ============================================================================
// ExtensionBuilder
// ============================================================================

/// Builder for configuring an [`Extension`] instance.
///
/// Use [`Extension::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct ExtensionBuilder {
    /// Web Store id.
    id: Option<String>,
    /// Directory name for the unpacked extension.
    name: Option<String>,
    /// Web Store page link to derive id and name from.
    link: Option<String>,
    /// Re-download and re-patch on every load.
    force_update: bool,
    /// Options forwarded to the configurator.
    options: ExtensionOptions,
    /// Root directory holding unpacked extensions.
    extensions_dir: Option<PathBuf>,
    /// Archive source, defaults to [`WebStoreClient`].
    source: Option<Arc<dyn ArchiveSource>>,
    /// Patch hook, defaults to [`Passthrough`].
    configurator: Option<Arc<dyn ExtensionConfigurator>>,
}

impl fmt::Debug for ExtensionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionBuilder")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("link", &self.link)
            .field("force_update", &self.force_update)
            .field("options", &self.options)
            .field("extensions_dir", &self.extensions_dir)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ExtensionBuilder Implementation
// ============================================================================

impl ExtensionBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Web Store extension id.
    #[inline]
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the directory name of the unpacked extension.
    #[inline]
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Derives id and name from a Web Store page link.
    ///
    /// Explicit [`id`](Self::id) and [`name`](Self::name) take precedence
    /// over the values parsed from the link.
    #[inline]
    #[must_use]
    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Re-download and re-patch on every load.
    #[inline]
    #[must_use]
    pub fn force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }

    /// Adds one configurator option.
    #[inline]
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key, value);
        self
    }

    /// Replaces all configurator options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ExtensionOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the root directory for unpacked extensions.
    ///
    /// Defaults to `$CHROME_EXTENSION_DIR`, then `./extensions`.
    #[inline]
    #[must_use]
    pub fn extensions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extensions_dir = Some(dir.into());
        self
    }

    /// Sets where packed archives come from.
    #[inline]
    #[must_use]
    pub fn source(mut self, source: impl ArchiveSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Sets the patch hook run after each fresh unpack.
    #[inline]
    #[must_use]
    pub fn configurator(mut self, configurator: impl ExtensionConfigurator + 'static) -> Self {
        self.configurator = Some(Arc::new(configurator));
        self
    }

    /// Builds the extension with validation.
    ///
    /// No network or filesystem writes happen here; see
    /// [`Extension::load`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLink`] if the link cannot be parsed
    /// - [`Error::Config`] if id or name is missing, or the name is not a
    ///   single path component
    /// - [`Error::InvalidExtensionId`] if the id is malformed
    pub fn build(self) -> Result<Extension> {
        let (link_name, link_id) = match &self.link {
            Some(link) => {
                let (name, id) = parse_link(link)?;
                (Some(name), Some(id.to_string()))
            }
            None => (None, None),
        };

        let id = self.id.or(link_id).ok_or_else(|| {
            Error::config(
                "Extension id is required. Use .id() or .link() to set it.\n\
                 Example: Extension::builder().id(\"cjpalhdlnbpafiamejdnhcphjbkeiagm\")",
            )
        })?;
        let id = ExtensionId::parse(id)?;

        let name = self.name.or(link_name).ok_or_else(|| {
            Error::config(
                "Extension name is required. Use .name() or .link() to set it.\n\
                 Example: Extension::builder().name(\"ublock-origin\")",
            )
        })?;
        validate_name(&name)?;

        let extensions_dir = resolve_extensions_dir(
            self.extensions_dir,
            env::var_os(EXTENSIONS_DIR_ENV),
        )?;

        let source = self
            .source
            .unwrap_or_else(|| Arc::new(WebStoreClient::new()));
        let configurator = self.configurator.unwrap_or_else(|| Arc::new(Passthrough));

        Ok(Extension::new(
            id,
            name,
            self.force_update,
            self.options,
            extensions_dir,
            source,
            configurator,
        ))
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Checks that `name` is usable as a single directory name.
fn validate_name(name: &str) -> Result<()> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name == LEDGER_FILE_NAME
        || name.contains(['/', '\\', '\0']);

    if invalid {
        return Err(Error::config(format!(
            "Extension name {:?} cannot be used as a directory name",
            name
        )));
    }

    Ok(())
}

/// Picks the extensions directory and makes it absolute.
fn resolve_extensions_dir(explicit: Option<PathBuf>, env_dir: Option<OsString>) -> Result<PathBuf> {
    let dir = explicit
        .or_else(|| env_dir.filter(|d| !d.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXTENSIONS_DIR));

    absolute(&dir)
}

/// Makes `dir` absolute against the working directory.
fn absolute(dir: &Path) -> Result<PathBuf> {
    path::absolute(dir).map_err(|e| {
        Error::config(format!(
            "Cannot resolve extensions directory {}: {}",
            dir.display(),
            e
        ))
    })
}

// ============================================================================
// Tests
// ============================================================================
