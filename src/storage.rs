/// Key-value storage access for chrome.storage.local
///
/// Everything the extension persists goes through a [`StorageArea`]: the real
/// one lives in `bridge.rs`, and [`MemoryStorage`] stands in for it in tests.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::settings::Settings;

pub const SETTINGS_KEY: &str = "settings";
pub const ENABLED_KEY: &str = "enabled";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Host(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Previous and new value of one key, as delivered by `storage.onChanged`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageChange {
    #[serde(rename = "oldValue", default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(rename = "newValue", default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// Changed keys of a single notification
pub type ChangeSet = HashMap<String, StorageChange>;

pub type ChangeListener = Rc<dyn Fn(&ChangeSet)>;

/// A last-write-wins key-value area shared by every extension context.
#[allow(async_fn_in_trait)]
pub trait StorageArea {
    /// Returns `None` when the key has never been written (or was removed).
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Deletes the key entirely.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Registers a listener that lives as long as the area does.
    fn on_changed(&self, listener: ChangeListener);
}

/// Typed accessors for the `settings` and `enabled` records
#[derive(Debug, Clone)]
pub struct Storage<S> {
    area: S,
}

impl<S: StorageArea> Storage<S> {
    pub fn new(area: S) -> Self {
        Storage { area }
    }

    /// Stored settings, or the defaults when nothing usable is stored.
    pub async fn get_settings(&self) -> Result<Settings, StorageError> {
        let settings = match self.area.get(SETTINGS_KEY).await? {
            None | Some(Value::Null) => Settings::default(),
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings: {}", e);
                Settings::default()
            }),
        };
        Ok(settings)
    }

    /// Replaces the whole settings record.
    pub async fn set_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        let value = serde_json::to_value(settings)?;
        self.area.set(SETTINGS_KEY, value).await
    }

    /// Only a stored boolean `true` counts as enabled.
    pub async fn is_enabled(&self) -> Result<bool, StorageError> {
        let stored = self.area.get(ENABLED_KEY).await?;
        Ok(matches!(stored, Some(Value::Bool(true))))
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        self.area.set(ENABLED_KEY, Value::Bool(enabled)).await
    }
}

#[derive(Default)]
struct MemoryState {
    items: RefCell<HashMap<String, Value>>,
    listeners: RefCell<Vec<ChangeListener>>,
    failure: RefCell<Option<String>>,
}

/// In-memory storage area.
///
/// Clones share the same items and listeners, the way every context of an
/// extension sees the same `chrome.storage.local`.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Rc<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following operation fail with `message`.
    pub fn fail_with(&self, message: &str) {
        *self.state.failure.borrow_mut() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.state.failure.borrow_mut() = None;
    }

    /// Current raw value, bypassing failure injection.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.state.items.borrow().get(key).cloned()
    }

    fn check(&self) -> Result<(), StorageError> {
        match self.state.failure.borrow().as_ref() {
            Some(message) => Err(StorageError::Host(message.clone())),
            None => Ok(()),
        }
    }

    fn notify(&self, key: &str, change: StorageChange) {
        let mut changes = ChangeSet::new();
        changes.insert(key.to_string(), change);

        // Listeners may touch storage again, so don't hold the borrow
        let listeners: Vec<ChangeListener> = self.state.listeners.borrow().clone();
        for listener in listeners {
            listener(&changes);
        }
    }
}

impl StorageArea for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.check()?;
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.check()?;
        let old_value = self
            .state
            .items
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        self.notify(
            key,
            StorageChange {
                old_value,
                new_value: Some(value),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        let old_value = self.state.items.borrow_mut().remove(key);
        if old_value.is_some() {
            self.notify(
                key,
                StorageChange {
                    old_value,
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    fn on_changed(&self, listener: ChangeListener) {
        self.state.listeners.borrow_mut().push(listener);
    }
}
