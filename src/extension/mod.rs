//! Unpacked Chrome extensions.
//!
//! An [`Extension`] owns one cached directory under the extensions root.
//! [`Extension::load`] makes sure that directory holds a freshly patched
//! copy and returns its path:
//!
//! 1. Skip everything if the directory exists and the ledger shows it was
//!    patched for the same id and options (unless force-update is set)
//! 2. Fetch the packed archive from the [`ArchiveSource`]
//! 3. Replace the directory with the unpacked archive
//! 4. Run the [`ExtensionConfigurator`] once
//! 5. Record the id and options in the ledger
//!
//! # Example
//!
//! ```no_run
//! use chrome_extension::Extension;
//!
//! # fn example() -> chrome_extension::Result<()> {
//! let extension = Extension::builder()
//!     .link("https://chromewebstore.google.com/detail/ublock-origin/cjpalhdlnbpafiamejdnhcphjbkeiagm")
//!     .build()?;
//!
//! // e.g. "--load-extension=/home/me/project/extensions/ublock-origin"
//! let flag = extension.load_flag()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::cell::Cell;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::archive;
use crate::error::{Error, Result};
use crate::identifiers::ExtensionId;
use crate::ledger::PatchLedger;
use crate::webstore::ArchiveSource;

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for extension configuration.
pub mod builder;

/// Patch hook trait and default implementations.
pub mod configurator;

/// Editable extension files.
pub mod file;

/// Configuration bag forwarded to patch hooks.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{EXTENSIONS_DIR_ENV, ExtensionBuilder};
pub use configurator::{ExtensionConfigurator, Passthrough};
pub use file::ExtensionFile;
pub use options::ExtensionOptions;

// ============================================================================
// Constants
// ============================================================================

/// Chrome flag for loading unpacked extensions.
const LOAD_EXTENSION_FLAG: &str = "--load-extension=";

/// Serialises refreshes of the extensions directory within this process.
static LOAD_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    /// Set while this thread holds [`LOAD_LOCK`].
    static LOADING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside [`Extension::load`].
///
/// Must be acquired before [`LOAD_LOCK`]; a second acquisition on the same
/// thread fails instead of deadlocking on the non-reentrant lock.
struct LoadReentryGuard;

impl LoadReentryGuard {
    fn enter() -> Result<Self> {
        if LOADING.with(Cell::get) {
            return Err(Error::invalid_argument(
                "Extension::load() cannot be called from inside an extension configurator",
            ));
        }
        LOADING.with(|loading| loading.set(true));
        Ok(Self)
    }
}

impl Drop for LoadReentryGuard {
    fn drop(&mut self) {
        LOADING.with(|loading| loading.set(false));
    }
}

// ============================================================================
// Extension
// ============================================================================

/// A Chrome Web Store extension cached as an unpacked directory.
///
/// Created with [`Extension::builder()`]. Cheap to clone.
#[derive(Clone)]
pub struct Extension {
    /// Web Store id.
    id: ExtensionId,

    /// Directory name under the extensions root.
    name: String,

    /// Re-download and re-patch on every load.
    force_update: bool,

    /// Options forwarded to the configurator.
    options: ExtensionOptions,

    /// Root directory holding all unpacked extensions.
    extensions_dir: PathBuf,

    /// Unpacked directory (`extensions_dir/name`).
    path: PathBuf,

    /// Where packed archives come from.
    source: Arc<dyn ArchiveSource>,

    /// Patch hook.
    configurator: Arc<dyn ExtensionConfigurator>,
}

// ============================================================================
// Extension - Display
// ============================================================================

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("force_update", &self.force_update)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Extension - Constructors
// ============================================================================

impl Extension {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ExtensionBuilder {
        ExtensionBuilder::new()
    }

    /// Assembles a validated extension. Called by the builder.
    pub(crate) fn new(
        id: ExtensionId,
        name: String,
        force_update: bool,
        options: ExtensionOptions,
        extensions_dir: PathBuf,
        source: Arc<dyn ArchiveSource>,
        configurator: Arc<dyn ExtensionConfigurator>,
    ) -> Self {
        let path = extensions_dir.join(&name);
        Self {
            id,
            name,
            force_update,
            options,
            extensions_dir,
            path,
            source,
            configurator,
        }
    }
}

// ============================================================================
// Extension - Accessors
// ============================================================================

impl Extension {
    /// Returns the Web Store id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ExtensionId {
        &self.id
    }

    /// Returns the directory name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if every load re-downloads.
    #[inline]
    #[must_use]
    pub fn force_update(&self) -> bool {
        self.force_update
    }

    /// Returns the options forwarded to the configurator.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ExtensionOptions {
        &self.options
    }

    /// Returns the extensions root directory.
    #[inline]
    #[must_use]
    pub fn extensions_dir(&self) -> &Path {
        &self.extensions_dir
    }

    /// Returns the absolute unpacked directory, loaded or not.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the unpacked directory exists.
    #[inline]
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Renders the unpacked directory as a Chrome command-line flag.
    ///
    /// Does not load the extension; see [`load_flag`](Self::load_flag).
    #[must_use]
    pub fn command_line_flag(&self) -> String {
        format!("{}{}", LOAD_EXTENSION_FLAG, self.path.display())
    }
}

// ============================================================================
// Extension - Lifecycle
// ============================================================================

impl Extension {
    /// Ensures the unpacked, patched directory is present and returns it.
    ///
    /// Downloads, unpacks and runs the configurator when the directory is
    /// missing, force-update is set, or the directory was patched for a
    /// different id or option bag. Otherwise the cached directory is reused
    /// without touching the network.
    ///
    /// # Errors
    ///
    /// - [`Error::DownloadFailed`] / [`Error::Http`] if the fetch fails
    /// - [`Error::InvalidArchive`] / [`Error::Zip`] if unpacking fails
    /// - Any error returned by the configurator
    /// - [`Error::InvalidArgument`] if called from inside a configurator
    pub fn load(&self) -> Result<PathBuf> {
        let _reentry = LoadReentryGuard::enter()?;
        let _guard = LOAD_LOCK.lock();

        let mut ledger = PatchLedger::open(&self.extensions_dir);

        if self.needs_refresh(&ledger) {
            self.refresh(&mut ledger)?;
        } else {
            debug!(
                extension = %self.name,
                path = %self.path.display(),
                "Reusing unpacked extension"
            );
        }

        Ok(self.path.clone())
    }

    /// Loads the extension and renders it as a `--load-extension=` flag.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_flag(&self) -> Result<String> {
        let path = self.load()?;
        Ok(format!("{}{}", LOAD_EXTENSION_FLAG, path.display()))
    }

    /// Decides whether the cached directory must be rebuilt.
    fn needs_refresh(&self, ledger: &PatchLedger) -> bool {
        self.force_update
            || !self.exists()
            || !ledger.is_current(&self.name, &self.id, &self.options)
    }

    /// Downloads, unpacks, patches and records the extension.
    fn refresh(&self, ledger: &mut PatchLedger) -> Result<()> {
        info!(extension = %self.name, extension_id = %self.id, "Downloading extension");
        let bytes = self.source.fetch(&self.id)?;

        // Any failure past this point must leave the directory stale
        ledger.forget(&self.name)?;

        if self.path.exists() {
            fs::remove_dir_all(&self.path)?;
            debug!(path = %self.path.display(), "Removed previous unpacked extension");
        }

        let entries = archive::unpack(&bytes, &self.path)?;
        info!(
            extension = %self.name,
            path = %self.path.display(),
            entries,
            "Unpacked extension"
        );

        self.configurator.update_files(self, &self.options)?;
        debug!(extension = %self.name, "Applied extension configurator");

        ledger.record(&self.name, &self.id, &self.options)
    }
}

// ============================================================================
// Extension - Files
// ============================================================================

impl Extension {
    /// Lists files whose extension equals `ext`, recursively, sorted by path.
    ///
    /// The comparison is case-sensitive; a leading dot is optional.
    /// Symlinked files are listed; symlinked directories are not descended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the extension is not unpacked.
    pub fn files_with_extension(&self, ext: &str) -> Result<Vec<ExtensionFile>> {
        if !self.exists() {
            return Err(Error::file_not_found(&self.path));
        }

        let ext = ext.trim_start_matches('.');
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.path) {
            let entry = entry.map_err(std::io::Error::from)?;
            let matches = entry.path().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some(ext);

            if matches {
                files.push(ExtensionFile::new(entry.into_path()));
            }
        }

        files.sort();
        Ok(files)
    }

    /// Lists `.js` files.
    ///
    /// # Errors
    ///
    /// Same as [`files_with_extension`](Self::files_with_extension).
    pub fn js_files(&self) -> Result<Vec<ExtensionFile>> {
        self.files_with_extension("js")
    }

    /// Lists `.json` files.
    ///
    /// # Errors
    ///
    /// Same as [`files_with_extension`](Self::files_with_extension).
    pub fn json_files(&self) -> Result<Vec<ExtensionFile>> {
        self.files_with_extension("json")
    }

    /// Lists `.html` files.
    ///
    /// # Errors
    ///
    /// Same as [`files_with_extension`](Self::files_with_extension).
    pub fn html_files(&self) -> Result<Vec<ExtensionFile>> {
        self.files_with_extension("html")
    }

    /// Lists `.css` files.
    ///
    /// # Errors
    ///
    /// Same as [`files_with_extension`](Self::files_with_extension).
    pub fn css_files(&self) -> Result<Vec<ExtensionFile>> {
        self.files_with_extension("css")
    }

    /// Looks up a file by its path relative to the unpacked directory.
    ///
    /// A leading `/` is ignored, so `"/js/app.js"` and `"js/app.js"` are
    /// the same file.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if the path leaves the directory
    /// - [`Error::FileNotFound`] if no such file exists
    pub fn file(&self, relative: impl AsRef<Path>) -> Result<ExtensionFile> {
        let relative = relative.as_ref();
        let relative = relative.strip_prefix("/").unwrap_or(relative);

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::invalid_argument(format!(
                "Path {} is not inside the extension directory",
                relative.display()
            )));
        }

        let path = self.path.join(relative);
        if !path.is_file() {
            return Err(Error::file_not_found(relative));
        }

        Ok(ExtensionFile::new(path))
    }

    /// Parses `manifest.json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if there is no manifest, or
    /// [`Error::Json`] if it is malformed.
    pub fn manifest(&self) -> Result<Value> {
        let content = self.file("manifest.json")?.contents()?;
        Ok(serde_json::from_str(&content)?)
    }
}

// ============================================================================
// Public Functions
// ============================================================================

/// Loads several extensions and renders one combined flag.
///
/// Chrome takes a single comma-separated `--load-extension=` list.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an empty slice, or the first
/// load error.
pub fn load_extensions_flag(extensions: &[&Extension]) -> Result<String> {
    if extensions.is_empty() {
        return Err(Error::invalid_argument("No extensions to load"));
    }

    let paths = extensions
        .iter()
        .map(|ext| ext.load().map(|p| p.display().to_string()))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!("{}{}", LOAD_EXTENSION_FLAG, paths.join(",")))
}

// ============================================================================
// Tests
// ============================================================================
