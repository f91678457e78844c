use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, normalize_phone_number};

/// A launchable app. Identity is the package identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppEntry {
    pub label: String,
    pub package_id: String,
    label_lower: String,
}

impl AppEntry {
    pub fn new(label: &str, package_id: &str) -> Self {
        Self::from_owned(label.to_string(), package_id.to_string())
    }

    pub fn from_owned(label: String, package_id: String) -> Self {
        let label_lower = label.to_lowercase();
        Self {
            label,
            package_id,
            label_lower,
        }
    }

    pub fn label_lower(&self) -> &str {
        &self.label_lower
    }
}

/// A dialable contact. `number` is always normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactEntry {
    pub name: String,
    pub number: String,
    name_lower: String,
}

impl ContactEntry {
    /// Builds an entry from a raw platform number.
    pub fn new(name: &str, raw_number: &str) -> Self {
        Self::from_owned(name.to_string(), normalize_phone_number(raw_number))
    }

    pub(crate) fn from_owned(name: String, number: String) -> Self {
        let name_lower = name.to_lowercase();
        Self {
            name,
            number,
            name_lower,
        }
    }

    /// Entry dialing the literal digits typed by the user.
    pub fn direct_dial(digits: &str) -> Self {
        Self::new(digits, digits)
    }

    pub fn name_lower(&self) -> &str {
        &self.name_lower
    }

    /// False when the raw number carried no digits at all.
    pub fn is_dialable(&self) -> bool {
        !self.number.is_empty()
    }
}

/// One row of the drawer's result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultItem {
    App(AppEntry),
    Contact(ContactEntry),
}

impl ResultItem {
    pub fn display_text(&self) -> String {
        match self {
            Self::App(app) => format!("> {}", app.label_lower()),
            Self::Contact(contact) => format!("> {}", contact.name_lower()),
        }
    }

    pub fn as_app(&self) -> Option<&AppEntry> {
        match self {
            Self::App(app) => Some(app),
            Self::Contact(_) => None,
        }
    }

    pub fn as_contact(&self) -> Option<&ContactEntry> {
        match self {
            Self::App(_) => None,
            Self::Contact(contact) => Some(contact),
        }
    }
}

/// Raw record shapes delivered by the platform sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchableApp {
    pub label: String,
    pub package_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub raw_number: String,
    #[serde(default)]
    pub cached_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub display_name: String,
    pub raw_number: String,
}

/// Sort key for the app directory.
pub(crate) fn label_sort_key(label: &str) -> String {
    normalize(label)
}
