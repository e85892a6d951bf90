//! Editable view of one file inside an unpacked extension.
//!
//! # Example
//!
//! ```no_run
//! # fn example(extension: &chrome_extension::Extension) -> chrome_extension::Result<()> {
//! let file = extension.file("js/config.js")?;
//!
//! file.update_contents(|source| source.replace("YOUR_API_KEY", "secret"))?;
//! file.replace_regex(r"debug:\s*true", "debug: false")?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::error::Result;

// ============================================================================
// ExtensionFile
// ============================================================================

/// A file inside an unpacked extension.
///
/// Has no identity beyond its path; all reads and writes go straight to
/// disk as UTF-8 text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionFile {
    /// Absolute path of the file.
    path: PathBuf,
}

// ============================================================================
// ExtensionFile - Constructors
// ============================================================================

impl ExtensionFile {
    /// Wraps a path. The file is not checked for existence.
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

// ============================================================================
// ExtensionFile - Accessors
// ============================================================================

impl ExtensionFile {
    /// Returns the file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file name, if the path has one.
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

// ============================================================================
// ExtensionFile - Content
// ============================================================================

impl ExtensionFile {
    /// Reads the whole file as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file is missing or not
    /// valid UTF-8.
    pub fn contents(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.path)?)
    }

    /// Replaces the whole file content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the file cannot be written.
    pub fn write_contents(&self, contents: impl AsRef<str>) -> Result<()> {
        let contents = contents.as_ref();
        fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), bytes = contents.len(), "Wrote extension file");
        Ok(())
    }

    /// Reads the file, passes its content through `update`, and writes the
    /// result back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) on read or write failure.
    pub fn update_contents<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(String) -> String,
    {
        let updated = update(self.contents()?);
        self.write_contents(updated)
    }

    /// Like [`update_contents`](Self::update_contents), for edits that can
    /// fail. Nothing is written if `update` returns an error.
    ///
    /// # Errors
    ///
    /// Returns the error from `update`, or an IO error.
    pub fn try_update_contents<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(String) -> Result<String>,
    {
        let updated = update(self.contents()?)?;
        self.write_contents(updated)
    }

    /// Replaces every occurrence of `from` with `to`.
    ///
    /// Returns the number of replacements. The file is only rewritten when
    /// something matched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) on read or write failure.
    pub fn replace_all(&self, from: &str, to: &str) -> Result<usize> {
        let contents = self.contents()?;
        let count = if from.is_empty() {
            0
        } else {
            contents.matches(from).count()
        };

        if count > 0 {
            self.write_contents(contents.replace(from, to))?;
        }

        Ok(count)
    }

    /// Replaces every match of the regular expression `pattern`.
    ///
    /// `replacement` supports `$1`/`${name}` capture references. Returns the
    /// number of matches.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Regex`](crate::Error::Regex) for an invalid pattern,
    /// or an IO error.
    pub fn replace_regex(&self, pattern: &str, replacement: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;
        let contents = self.contents()?;
        let count = regex.find_iter(&contents).count();

        if count > 0 {
            let updated = regex.replace_all(&contents, replacement);
            self.write_contents(updated)?;
        }

        Ok(count)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;

    fn file_with(contents: &str) -> (tempfile::TempDir, ExtensionFile) {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("config.js");
        fs::write(&path, contents).unwrap();
        (temp, ExtensionFile::new(path))
    }

    #[test]
    fn test_update_contents_persists() {
        let (_temp, file) = file_with("const KEY = 'YOUR_API_KEY';");

        file.update_contents(|s| s.replace("YOUR_API_KEY", "secret"))
            .unwrap();

        let reread = fs::read_to_string(file.path()).unwrap();
        assert_eq!(reread, "const KEY = 'secret';");
    }

    #[test]
    fn test_try_update_contents_error_leaves_file() {
        let (_temp, file) = file_with("original");

        let result = file.try_update_contents(|_| Err(Error::patch("marker missing")));

        assert!(matches!(result, Err(Error::Patch { .. })));
        assert_eq!(file.contents().unwrap(), "original");
    }

    #[test]
    fn test_replace_all_counts() {
        let (_temp, file) = file_with("a KEY b KEY c");

        assert_eq!(file.replace_all("KEY", "x").unwrap(), 2);
        assert_eq!(file.contents().unwrap(), "a x b x c");
        assert_eq!(file.replace_all("KEY", "x").unwrap(), 0);
    }

    #[test]
    fn test_replace_all_empty_pattern_is_noop() {
        let (_temp, file) = file_with("abc");
        assert_eq!(file.replace_all("", "x").unwrap(), 0);
        assert_eq!(file.contents().unwrap(), "abc");
    }

    #[test]
    fn test_replace_regex_with_captures() {
        let (_temp, file) = file_with("timeout: 10, retries: 2");

        let count = file.replace_regex(r"(\w+): (\d+)", "$1=$2").unwrap();

        assert_eq!(count, 2);
        assert_eq!(file.contents().unwrap(), "timeout=10, retries=2");
    }

    #[test]
    fn test_replace_regex_invalid_pattern() {
        let (_temp, file) = file_with("abc");
        assert!(matches!(file.replace_regex("(", "x"), Err(Error::Regex(_))));
    }

    #[test]
    fn test_contents_missing_file() {
        let file = ExtensionFile::new("/nonexistent/chrome-extension/file.js");
        assert!(file.contents().unwrap_err().is_not_found());
    }

    #[test]
    fn test_file_name() {
        let file = ExtensionFile::new("/tmp/ext/js/app.js");
        assert_eq!(file.file_name(), Some("app.js"));
    }
}
