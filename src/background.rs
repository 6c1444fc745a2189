/// Background worker: records install and update events
use wasm_bindgen_futures::spawn_local;

use crate::bridge::{self, ChromeStorage, InstallDetails};
use crate::logger::{LogSource, LogStore};

/// Log line for an `onInstalled` event; other reasons aren't recorded.
pub fn install_message(details: &InstallDetails, current_version: &str) -> Option<String> {
    match details.reason.as_str() {
        "install" => Some("Extension installed".to_string()),
        "update" => Some(format!(
            "Extension updated (v{} → v{})",
            details.previous_version.as_deref().unwrap_or("?"),
            current_version
        )),
        _ => None,
    }
}

pub fn start() {
    log::info!("background script started");

    bridge::on_installed(|details| {
        let current_version = bridge::manifest().version;
        let Some(message) = install_message(&details, &current_version) else {
            return;
        };

        spawn_local(async move {
            let store = LogStore::new(ChromeStorage);
            if let Err(e) = store.log_info(message, LogSource::Background, false).await {
                log::error!("Failed to record install event: {}", e);
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(reason: &str, previous_version: Option<&str>) -> InstallDetails {
        InstallDetails {
            reason: reason.to_string(),
            previous_version: previous_version.map(str::to_string),
        }
    }

    #[test]
    fn test_install_message() {
        assert_eq!(
            install_message(&details("install", None), "0.2.0"),
            Some("Extension installed".to_string())
        );
    }

    #[test]
    fn test_update_message() {
        assert_eq!(
            install_message(&details("update", Some("0.1.0")), "0.2.0"),
            Some("Extension updated (v0.1.0 → v0.2.0)".to_string())
        );
        assert_eq!(
            install_message(&details("update", None), "0.2.0"),
            Some("Extension updated (v? → v0.2.0)".to_string())
        );
    }

    #[test]
    fn test_other_reasons_are_ignored() {
        assert_eq!(install_message(&details("chrome_update", None), "0.2.0"), None);
        assert_eq!(install_message(&details("shared_module_update", None), "0.2.0"), None);
    }

    #[test]
    fn test_install_details_from_host_payload() {
        let parsed: InstallDetails =
            serde_json::from_str(r#"{ "reason": "update", "previousVersion": "0.1.0" }"#).unwrap();
        assert_eq!(parsed, details("update", Some("0.1.0")));
    }
}
