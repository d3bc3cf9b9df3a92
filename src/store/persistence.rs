//! Persistence layer for the token store

use crate::error::StorageError;
use crate::store::{TokenStore, TOKEN_KEY};
use std::path::Path;

/// Sled-based implementation of TokenStore
pub struct SledTokenStore {
    db: sled::Db,
}

impl SledTokenStore {
    /// Open (or create) the token database at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

impl TokenStore for SledTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        match self.db.get(TOKEN_KEY)? {
            Some(value) => {
                let token = String::from_utf8(value.to_vec()).map_err(|_| StorageError::InvalidToken)?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        self.db.insert(TOKEN_KEY, token.as_bytes())?;
        self.flush()
    }

    fn remove(&self) -> Result<(), StorageError> {
        self.db.remove(TOKEN_KEY)?;
        self.flush()
    }
}
