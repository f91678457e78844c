use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{CallRecord, ContactRecord, LaunchableApp};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{source_name}: {message}")]
pub struct ProviderError {
    source_name: &'static str,
    message: String,
}

impl ProviderError {
    pub fn new(source_name: &'static str, message: impl Into<String>) -> Self {
        Self {
            source_name,
            message: message.into(),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source_name
    }
}

/// Platform registry of launchable activities. May be slow; only called
/// from a background context.
pub trait AppSource: Send + Sync {
    fn source_name(&self) -> &'static str;
    fn fetch_launchable_apps(&self) -> Result<Vec<LaunchableApp>, ProviderError>;
}

/// Call history, newest first. `limit` is the number of distinct numbers
/// the caller wants; a source may return more rows than that because rows
/// can repeat a number.
pub trait CallLogSource: Send + Sync {
    fn source_name(&self) -> &'static str;
    fn fetch_recent_calls(&self, limit: usize) -> Result<Vec<CallRecord>, ProviderError>;
}

/// Every phone-number record of the device directory.
pub trait ContactSource: Send + Sync {
    fn source_name(&self) -> &'static str;
    fn fetch_all_contacts(&self) -> Result<Vec<ContactRecord>, ProviderError>;
}

/// In-memory sources, used by tests and the development host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticSources {
    pub apps: Vec<LaunchableApp>,
    pub calls: Vec<CallRecord>,
    pub contacts: Vec<ContactRecord>,
}

impl StaticSources {
    pub fn from_json_file(path: &Path) -> Result<Self, ProviderError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::new(
                "fixture",
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ProviderError> {
        serde_json::from_str(raw)
            .map_err(|e| ProviderError::new("fixture", format!("invalid fixture json: {e}")))
    }

    pub fn deterministic_fixture() -> Self {
        let app = |label: &str, package_id: &str| LaunchableApp {
            label: label.to_string(),
            package_id: package_id.to_string(),
        };
        let call = |raw_number: &str, cached_name: Option<&str>| CallRecord {
            raw_number: raw_number.to_string(),
            cached_name: cached_name.map(str::to_string),
        };
        let contact = |display_name: &str, raw_number: &str| ContactRecord {
            display_name: display_name.to_string(),
            raw_number: raw_number.to_string(),
        };

        Self {
            apps: vec![
                app("Settings", "com.android.settings"),
                app("Camera", "com.android.camera"),
                app("Calculator", "com.android.calculator2"),
                app("Calendar", "com.android.calendar"),
                app("Maps", "com.google.android.apps.maps"),
                app("Messages", "com.google.android.apps.messaging"),
            ],
            calls: vec![
                call("+91 98765 43210", Some("Ada Lovelace")),
                call("555-0100", None),
                call("+91 98765 43210", Some("Ada Lovelace")),
                call("(987) 654-3211", Some("Grace Hopper")),
            ],
            contacts: vec![
                contact("Ada Lovelace", "+91 98765 43210"),
                contact("Alan Turing", "+44 20 7946 0958"),
                contact("Grace Hopper", "(987) 654-3211"),
            ],
        }
    }
}

impl AppSource for StaticSources {
    fn source_name(&self) -> &'static str {
        "static-apps"
    }

    fn fetch_launchable_apps(&self) -> Result<Vec<LaunchableApp>, ProviderError> {
        Ok(self.apps.clone())
    }
}

impl CallLogSource for StaticSources {
    fn source_name(&self) -> &'static str {
        "static-calls"
    }

    fn fetch_recent_calls(&self, _limit: usize) -> Result<Vec<CallRecord>, ProviderError> {
        Ok(self.calls.clone())
    }
}

impl ContactSource for StaticSources {
    fn source_name(&self) -> &'static str {
        "static-contacts"
    }

    fn fetch_all_contacts(&self) -> Result<Vec<ContactRecord>, ProviderError> {
        Ok(self.contacts.clone())
    }
}
