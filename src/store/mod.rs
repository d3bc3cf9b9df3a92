//! Token Store
//!
//! Persistent key/value access to the single opaque session token. The token
//! lives under one fixed key; logout removes it.

pub mod persistence;

pub use persistence::SledTokenStore;

use crate::error::StorageError;
use parking_lot::Mutex;

/// Storage key the session token is kept under
pub const TOKEN_KEY: &str = "token";

/// Token store interface
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, StorageError>;
    fn set(&self, token: &str) -> Result<(), StorageError>;
    fn remove(&self) -> Result<(), StorageError>;
}

/// Process-local token store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.token.lock().clone())
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        self.token.lock().take();
        Ok(())
    }
}
