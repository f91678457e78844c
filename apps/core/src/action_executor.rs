use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::config::{Config, WebSearchProvider};

/// Platform action requested by the interpreter. The host performs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "target", rename_all = "snake_case")]
pub enum Action {
    LaunchPackage(String),
    RequestUninstall(String),
    OpenUrl(String),
    /// The host picks between placing the call and opening the dialer
    /// depending on its permission state.
    PlaceOrDialCall(String),
    OpenMessagingDeepLink(String),
    NavigateHome,
}

impl Action {
    /// Whether the drawer should return to the home screen afterwards.
    pub fn closes_drawer(&self) -> bool {
        match self {
            Self::LaunchPackage(_)
            | Self::PlaceOrDialCall(_)
            | Self::OpenMessagingDeepLink(_)
            | Self::NavigateHome => true,
            Self::RequestUninstall(_) | Self::OpenUrl(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    #[error("empty target")]
    EmptyTarget,
    #[error("launch failed: {0}")]
    LaunchFailed(String),
}

/// Host-side capability that turns an [`Action`] into a platform call.
pub trait ActionExecutor: Send + Sync {
    fn perform(&self, action: &Action) -> Result<(), LaunchError>;
}

/// Keeps every performed action in order.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    performed: Mutex<Vec<Action>>,
}

impl RecordingExecutor {
    pub fn performed(&self) -> Vec<Action> {
        self.performed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ActionExecutor for RecordingExecutor {
    fn perform(&self, action: &Action) -> Result<(), LaunchError> {
        validate_target(action)?;
        self.performed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(action.clone());
        Ok(())
    }
}

/// Rejects actions whose target is blank.
pub fn validate_target(action: &Action) -> Result<(), LaunchError> {
    let target = match action {
        Action::LaunchPackage(target)
        | Action::RequestUninstall(target)
        | Action::OpenUrl(target)
        | Action::PlaceOrDialCall(target)
        | Action::OpenMessagingDeepLink(target) => target,
        Action::NavigateHome => return Ok(()),
    };
    if target.trim().is_empty() {
        return Err(LaunchError::EmptyTarget);
    }
    Ok(())
}

pub fn web_search_url(cfg: &Config, query: &str) -> Option<String> {
    let encoded = url_encode_component(query.trim());
    let url = match cfg.web_search_provider {
        WebSearchProvider::Google => format!("https://www.google.com/search?q={encoded}"),
        WebSearchProvider::Duckduckgo => format!("https://duckduckgo.com/?q={encoded}"),
        WebSearchProvider::Bing => format!("https://www.bing.com/search?q={encoded}"),
        WebSearchProvider::Brave => format!("https://search.brave.com/search?q={encoded}"),
        WebSearchProvider::Startpage => {
            format!("https://www.startpage.com/sp/search?query={encoded}")
        }
        WebSearchProvider::Ecosia => format!("https://www.ecosia.org/search?q={encoded}"),
        WebSearchProvider::Yahoo => format!("https://search.yahoo.com/search?p={encoded}"),
        WebSearchProvider::Custom => {
            let template = cfg.web_search_custom_template.trim();
            if template.is_empty() || !template.contains("{query}") {
                return None;
            }
            template.replace("{query}", &encoded)
        }
    };
    Some(url)
}

pub fn market_search_url(cfg: &Config, query: &str) -> String {
    cfg.market_search_template
        .replace("{query}", &url_encode_component(query.trim()))
}

pub fn messaging_deep_link(cfg: &Config, number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    cfg.messaging_link_template.replace("{number}", &digits)
}

fn url_encode_component(input: &str) -> String {
    let mut out = String::new();
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(byte as char);
        } else if byte == b' ' {
            out.push('+');
        } else {
            out.push('%');
            out.push_str(&format!("{byte:02X}"));
        }
    }
    out
}
