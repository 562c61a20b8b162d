//! Local key-value persistence.

use crate::error::Result;

/// Synchronous key-value store scoped to one installation.
///
/// Values are opaque strings; the roster snapshot codec in
/// [`crate::snapshot`] decides what goes in them.
pub trait LocalStore: Send + Sync {
    /// Read a value. Missing keys yield `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: LocalStore + ?Sized> LocalStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
