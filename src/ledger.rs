//! Record of which configuration each cached extension was patched with.
//!
//! The ledger lives next to the unpacked directories as
//! `.chrome-extension.json`:
//!
//! ```json
//! {
//!   "captcha-solver": {
//!     "id": "pgojnojmmhpofjgdmaebadhbocahppod",
//!     "options": { "api_key": "secret" }
//!   }
//! }
//! ```
//!
//! A directory whose entry is missing, or was recorded for another id or
//! option bag, is considered stale.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Result;
use crate::extension::ExtensionOptions;
use crate::identifiers::ExtensionId;

// ============================================================================
// Constants
// ============================================================================

/// Ledger file name inside the extensions directory.
pub const LEDGER_FILE_NAME: &str = ".chrome-extension.json";

// ============================================================================
// Types
// ============================================================================

/// What a cached directory was last patched with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Extension that was unpacked.
    pub id: ExtensionId,

    /// Options passed to the patch hook.
    pub options: ExtensionOptions,
}

// ============================================================================
// PatchLedger
// ============================================================================

/// Ledger of patched extension directories.
#[derive(Debug, Clone)]
pub struct PatchLedger {
    /// Ledger file path.
    path: PathBuf,

    /// Entries keyed by extension directory name.
    entries: BTreeMap<String, LedgerEntry>,
}

impl PatchLedger {
    /// Opens the ledger for an extensions directory.
    ///
    /// A missing or unreadable ledger yields an empty one; every extension
    /// under it is then treated as stale.
    #[must_use]
    pub fn open(extensions_dir: &Path) -> Self {
        let path = extensions_dir.join(LEDGER_FILE_NAME);

        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring corrupt patch ledger");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };

        Self { path, entries }
    }

    /// Returns the ledger file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the entry for `name`.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LedgerEntry> {
        self.entries.get(name)
    }

    /// Returns `true` if `name` was last patched for `id` with `options`.
    #[must_use]
    pub fn is_current(&self, name: &str, id: &ExtensionId, options: &ExtensionOptions) -> bool {
        self.entries
            .get(name)
            .is_some_and(|entry| &entry.id == id && &entry.options == options)
    }

    /// Records a finished patch and persists the ledger.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error if the ledger cannot be written.
    pub fn record(&mut self, name: &str, id: &ExtensionId, options: &ExtensionOptions) -> Result<()> {
        self.entries.insert(
            name.to_string(),
            LedgerEntry {
                id: id.clone(),
                options: options.clone(),
            },
        );
        self.save()
    }

    /// Drops the entry for `name` and persists the ledger.
    ///
    /// # Errors
    ///
    /// Returns an IO or JSON error if the ledger cannot be written.
    pub fn forget(&mut self, name: &str) -> Result<()> {
        if self.entries.remove(name).is_some() {
            self.save()?;
        }
        Ok(())
    }

    /// Writes the ledger atomically.
    fn save(&self) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let json = serde_json::to_string_pretty(&self.entries)?;
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "Saved patch ledger");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ExtensionId {
        ExtensionId::parse("pgojnojmmhpofjgdmaebadhbocahppod").unwrap()
    }

    #[test]
    fn test_open_missing_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let ledger = PatchLedger::open(temp.path());
        assert!(!ledger.is_current("solver", &id(), &ExtensionOptions::new()));
    }

    #[test]
    fn test_record_persists() {
        let temp = tempfile::tempdir().unwrap();
        let options = ExtensionOptions::new().with("api_key", "secret");

        PatchLedger::open(temp.path())
            .record("solver", &id(), &options)
            .unwrap();

        let reopened = PatchLedger::open(temp.path());
        assert!(reopened.is_current("solver", &id(), &options));
        assert!(temp.path().join(LEDGER_FILE_NAME).is_file());
    }

    #[test]
    fn test_changed_options_not_current() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = PatchLedger::open(temp.path());
        ledger
            .record("solver", &id(), &ExtensionOptions::new().with("api_key", "a"))
            .unwrap();

        assert!(!ledger.is_current("solver", &id(), &ExtensionOptions::new().with("api_key", "b")));
    }

    #[test]
    fn test_other_id_not_current() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = PatchLedger::open(temp.path());
        ledger
            .record("solver", &id(), &ExtensionOptions::new())
            .unwrap();

        let other = ExtensionId::parse("cjpalhdlnbpafiamejdnhcphjbkeiagm").unwrap();
        assert!(!ledger.is_current("solver", &other, &ExtensionOptions::new()));
    }

    #[test]
    fn test_forget() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = PatchLedger::open(temp.path());
        ledger
            .record("solver", &id(), &ExtensionOptions::new())
            .unwrap();
        ledger.forget("solver").unwrap();

        assert!(PatchLedger::open(temp.path()).get("solver").is_none());
    }

    #[test]
    fn test_corrupt_ledger_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(LEDGER_FILE_NAME), "{ not json").unwrap();

        let ledger = PatchLedger::open(temp.path());
        assert!(ledger.get("solver").is_none());
    }
}
