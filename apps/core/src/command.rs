//! The drawer's command grammar.
//!
//! ```text
//! ""             apps launched within the recency window
//! ls             every app
//! cls            clear launch history
//! exit | quit    back to the home screen
//! g:<terms>      web search
//! install <q>    market search
//! rm[ ]<key>     uninstall
//! p:<key>        call a contact
//! wa:<key>       message a contact
//! <anything>     fuzzy app search
//! ```

use serde::Serialize;

use crate::normalize::{is_all_digits, normalize};

/// Minimum key length (in chars) for the full contact directory tier.
pub const DIRECTORY_MIN_KEY_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactChannel {
    Call,
    Message,
}

impl ContactChannel {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Call => "p:",
            Self::Message => "wa:",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactTier {
    /// Bare prefix: recent callers only.
    Recent,
    /// All-digit key, dialed literally.
    DirectDial,
    /// Long enough to search the full directory.
    Directory,
    /// Too short for the directory; shows nothing.
    Narrowing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    EmptyQuery,
    ListAll,
    ClearRecents,
    ExitToHome,
    WebSearch { query: String },
    MarketInstall { query: String },
    UninstallRequest { key: String },
    ContactLookup {
        channel: ContactChannel,
        tier: ContactTier,
        key: String,
    },
    FuzzyAppSearch { key: String },
}

impl Command {
    /// Classifies a raw query. Total and deterministic: every string maps to
    /// exactly one variant. Classification works on the lowercased query;
    /// web and market search terms keep their typed casing.
    pub fn parse(raw: &str) -> Self {
        Self::parse_with(raw, DIRECTORY_MIN_KEY_LEN)
    }

    pub fn parse_with(raw: &str, directory_min_key_len: usize) -> Self {
        let query = normalize(raw);

        match query.as_str() {
            "" => return Self::EmptyQuery,
            "ls" => return Self::ListAll,
            "cls" => return Self::ClearRecents,
            "exit" | "quit" => return Self::ExitToHome,
            _ => {}
        }

        if let Some(rest) = query.strip_prefix("g:") {
            return Self::WebSearch {
                query: search_term(raw, "g:", rest),
            };
        }
        if let Some(rest) = query.strip_prefix("install ") {
            return Self::MarketInstall {
                query: search_term(raw, "install ", rest),
            };
        }
        if let Some(rest) = query.strip_prefix("rm") {
            return Self::UninstallRequest {
                key: rest.trim().to_string(),
            };
        }
        for channel in [ContactChannel::Call, ContactChannel::Message] {
            if let Some(rest) = query.strip_prefix(channel.prefix()) {
                let key = rest.trim().to_string();
                let tier = contact_tier(&key, directory_min_key_len);
                return Self::ContactLookup { channel, tier, key };
            }
        }

        Self::FuzzyAppSearch { key: query }
    }

    /// Section header shown above the result list.
    pub fn header(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "--- SESSION_ACTIVE (1H) ---",
            Self::ListAll => "--- APPLICATIONS ---",
            Self::UninstallRequest { .. } => "--- UNINSTALL ---",
            Self::ContactLookup { .. } => "--- CONTACTS ---",
            Self::ClearRecents
            | Self::ExitToHome
            | Self::WebSearch { .. }
            | Self::MarketInstall { .. }
            | Self::FuzzyAppSearch { .. } => "--- SEARCH_RESULTS ---",
        }
    }
}

/// Search terms keep the casing they were typed with. Falls back to the
/// lowercased remainder when lowercasing changed the prefix's byte length.
fn search_term(raw: &str, prefix: &str, lowered_rest: &str) -> String {
    raw.trim()
        .get(prefix.len()..)
        .filter(|rest| rest.to_lowercase() == lowered_rest)
        .unwrap_or(lowered_rest)
        .trim()
        .to_string()
}

fn contact_tier(key: &str, directory_min_key_len: usize) -> ContactTier {
    if key.is_empty() {
        ContactTier::Recent
    } else if is_all_digits(key) {
        ContactTier::DirectDial
    } else if key.chars().count() >= directory_min_key_len {
        ContactTier::Directory
    } else {
        ContactTier::Narrowing
    }
}
