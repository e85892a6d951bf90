//! Caller-supplied configuration forwarded to patch hooks.
//!
//! # Example
//!
//! ```
//! use chrome_extension::ExtensionOptions;
//!
//! let options = ExtensionOptions::new()
//!     .with("api_key", "secret")
//!     .with("retries", 3);
//!
//! assert_eq!(options.get_str("api_key"), Some("secret"));
//! assert_eq!(options.get_i64("retries"), Some(3));
//! ```

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// ExtensionOptions
// ============================================================================

/// String-keyed bag of JSON values.
///
/// The whole bag is recorded after a successful patch; a later load with a
/// different bag re-downloads and re-patches the extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtensionOptions {
    values: FxHashMap<String, Value>,
}

// ============================================================================
// ExtensionOptions - Constructors
// ============================================================================

impl ExtensionOptions {
    /// Creates an empty option bag.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, replacing any previous value under `key`.
    #[inline]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }
}

// ============================================================================
// ExtensionOptions - Accessors
// ============================================================================

impl ExtensionOptions {
    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Returns the raw value under `key`.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the value under `key` if it is a string.
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns the value under `key` if it is a boolean.
    #[inline]
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Returns the value under `key` if it is an integer.
    #[inline]
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Returns `true` if `key` is present.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no options are set.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over all entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl<K, V> FromIterator<(K, V)> for ExtensionOptions
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K, V> Extend<(K, V)> for ExtensionOptions
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.values
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_new_is_empty() {
        let options = ExtensionOptions::new();
        assert!(options.is_empty());
        assert_eq!(options.len(), 0);
    }

    #[test]
    fn test_typed_getters() {
        let options = ExtensionOptions::new()
            .with("api_key", "secret")
            .with("enabled", true)
            .with("retries", 3);

        assert_eq!(options.get_str("api_key"), Some("secret"));
        assert_eq!(options.get_bool("enabled"), Some(true));
        assert_eq!(options.get_i64("retries"), Some(3));
        assert_eq!(options.get_str("retries"), None);
        assert!(options.get("missing").is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut options = ExtensionOptions::new().with("api_key", "old");
        let previous = options.insert("api_key", "new");

        assert_eq!(previous, Some(json!("old")));
        assert_eq!(options.get_str("api_key"), Some("new"));
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = ExtensionOptions::new().with("a", 1).with("b", 2);
        let b: ExtensionOptions = [("b", 2), ("a", 1)].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_serializes_as_object() {
        let options = ExtensionOptions::new().with("api_key", "secret");
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value, json!({"api_key": "secret"}));

        let back: ExtensionOptions = serde_json::from_value(value).unwrap();
        assert_eq!(back, options);
    }
}
