use anyhow::Result;

use crate::db::Database;

/// Whole-value key/value storage. Every write replaces the previous blob;
/// concurrent writers resolve as last writer wins.
pub trait BlobStore {
    fn read_blob(&self, key: &str) -> Result<Option<String>>;
    fn write_blob(&self, key: &str, value: &str) -> Result<()>;
    fn delete_blob(&self, key: &str) -> Result<bool>;
}

impl BlobStore for Database {
    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key)
    }

    fn write_blob(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)
    }

    fn delete_blob(&self, key: &str) -> Result<bool> {
        self.delete_value(key)
    }
}
