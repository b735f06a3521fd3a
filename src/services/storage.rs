use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::SessionError;

/// String key-value store backing the session.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// `window.localStorage`, looked up on every access so a missing window
/// surfaces as an error instead of a panic.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    fn storage(&self) -> Result<web_sys::Storage, SessionError> {
        web_sys::window()
            .ok_or_else(|| SessionError::Storage("no window".to_string()))?
            .local_storage()?
            .ok_or_else(|| SessionError::Storage("localStorage disabled".to_string()))
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.storage()?.get_item(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        Ok(self.storage()?.set_item(key, value)?)
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        Ok(self.storage()?.remove_item(key)?)
    }
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
