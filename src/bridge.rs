/// Rust side of `extension.js`, the promise wrappers around `chrome.*`
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::storage::{ChangeListener, ChangeSet, StorageArea, StorageError};

// Import JS bridge functions
#[wasm_bindgen(module = "/extension.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeStorage(key: &str) -> Result<(), JsValue>;

    fn onStorageChanged(callback: &Closure<dyn Fn(JsValue)>);

    fn onInstalled(callback: &Closure<dyn Fn(JsValue)>);

    fn getManifest() -> JsValue;

    fn getExtensionId() -> String;

    #[wasm_bindgen(catch)]
    async fn getPermissions() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn isAllowedIncognitoAccess() -> Result<JsValue, JsValue>;

    fn openTab(url: &str);
}

/// Text for a thrown JS value: its `message` if it has one, nothing for
/// falsy values (null, undefined, `""`), else the value stringified.
pub fn error_detail(error: &JsValue) -> Option<String> {
    if error.is_falsy() {
        return None;
    }
    if error.is_object() {
        if let Ok(message) = js_sys::Reflect::get(error, &JsValue::from_str("message")) {
            if let Some(message) = message.as_string() {
                return Some(message);
            }
        }
    }
    if let Some(text) = error.as_string() {
        return Some(text);
    }
    match js_sys::JSON::stringify(error).ok().and_then(|text| text.as_string()) {
        Some(text) => Some(text),
        None => Some(format!("{:?}", error)),
    }
}

fn host_error(error: JsValue) -> StorageError {
    StorageError::Host(error_detail(&error).unwrap_or_else(|| "unknown storage error".to_string()))
}

/// `chrome.storage.local`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStorage;

impl StorageArea for ChromeStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let value_js = getStorage(key).await.map_err(host_error)?;
        if value_js.is_null() || value_js.is_undefined() {
            return Ok(None);
        }
        let value = serde_wasm_bindgen::from_value(value_js)
            .map_err(|e| StorageError::Serialization(format!("{:?}", e)))?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        // Plain objects rather than ES Maps, or chrome.storage drops them
        let value_js = value
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| StorageError::Serialization(format!("{:?}", e)))?;
        setStorage(key, value_js).await.map_err(host_error)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        removeStorage(key).await.map_err(host_error)
    }

    fn on_changed(&self, listener: ChangeListener) {
        let callback = Closure::wrap(Box::new(move |changes_js: JsValue| {
            match serde_wasm_bindgen::from_value::<ChangeSet>(changes_js) {
                Ok(changes) => listener(&changes),
                Err(e) => log::warn!("Unreadable storage change: {:?}", e),
            }
        }) as Box<dyn Fn(JsValue)>);
        onStorageChanged(&callback);
        // Lives for the rest of the page
        callback.forget();
    }
}

/// Fields of `chrome.runtime.getManifest()` the popup shows
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Manifest {
    pub fn display_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}

pub fn manifest() -> Manifest {
    serde_wasm_bindgen::from_value(getManifest()).unwrap_or_else(|e| {
        log::error!("Failed to read manifest: {:?}", e);
        Manifest::default()
    })
}

pub fn extension_id() -> String {
    getExtensionId()
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub origins: Option<Vec<String>>,
}

pub async fn permissions() -> Result<Permissions, String> {
    let permissions_js = getPermissions()
        .await
        .map_err(|e| format!("Failed to get permissions: {:?}", error_detail(&e)))?;
    serde_wasm_bindgen::from_value(permissions_js).map_err(|e| format!("Failed to parse permissions: {:?}", e))
}

pub async fn incognito_access() -> Result<bool, String> {
    let allowed = isAllowedIncognitoAccess()
        .await
        .map_err(|e| format!("Failed to query incognito access: {:?}", error_detail(&e)))?;
    Ok(allowed.as_bool().unwrap_or(false))
}

pub fn open_tab(url: &str) {
    openTab(url);
}

/// `runtime.onInstalled` details
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstallDetails {
    pub reason: String,
    #[serde(rename = "previousVersion", default)]
    pub previous_version: Option<String>,
}

pub fn on_installed(handler: impl Fn(InstallDetails) + 'static) {
    let callback = Closure::wrap(Box::new(move |details_js: JsValue| {
        match serde_wasm_bindgen::from_value::<InstallDetails>(details_js) {
            Ok(details) => handler(details),
            Err(e) => log::warn!("Unreadable install details: {:?}", e),
        }
    }) as Box<dyn Fn(JsValue)>);
    onInstalled(&callback);
    callback.forget();
}
