use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::DIRECTORY_MIN_KEY_LEN;
use crate::recency_store::DEFAULT_RECENCY_WINDOW_MS;
use crate::source_cache::DEFAULT_RECENT_CALL_LIMIT;

const HOME_ENV: &str = "TERMLAUNCH_HOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WebSearchProvider {
    #[default]
    Google,
    Duckduckgo,
    Bing,
    Brave,
    Startpage,
    Ecosia,
    Yahoo,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recency_window_ms: i64,
    pub recent_call_limit: usize,
    pub directory_min_key_len: usize,
    pub web_search_provider: WebSearchProvider,
    pub web_search_custom_template: String,
    pub market_search_template: String,
    pub messaging_link_template: String,
    pub recency_db_path: PathBuf,
    pub log_dir: PathBuf,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            recency_window_ms: DEFAULT_RECENCY_WINDOW_MS,
            recent_call_limit: DEFAULT_RECENT_CALL_LIMIT,
            directory_min_key_len: DIRECTORY_MIN_KEY_LEN,
            web_search_provider: WebSearchProvider::default(),
            web_search_custom_template: String::new(),
            market_search_template: "market://search?q={query}".to_string(),
            messaging_link_template: "https://wa.me/{number}".to_string(),
            recency_db_path: base.join("recency.sqlite3"),
            log_dir: base.join("logs"),
            config_path: base.join("config.toml"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid toml config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to encode toml config: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("invalid json5 config: {0}")]
    Json5(#[from] json5::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// `$TERMLAUNCH_HOME`, or a `termlaunch` directory under the temp dir.
pub fn stable_app_data_dir() -> PathBuf {
    match std::env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir().join("termlaunch"),
    }
}

pub fn validate(cfg: &Config) -> Result<(), String> {
    if cfg.recency_window_ms <= 0 {
        return Err("recency_window_ms must be positive".into());
    }
    if cfg.recent_call_limit == 0 || cfg.recent_call_limit > 500 {
        return Err("recent_call_limit out of range".into());
    }
    if cfg.directory_min_key_len == 0 {
        return Err("directory_min_key_len must be at least 1".into());
    }
    if cfg.web_search_provider == WebSearchProvider::Custom
        && !cfg.web_search_custom_template.contains("{query}")
    {
        return Err("web_search_custom_template must contain {query}".into());
    }
    if !cfg.market_search_template.contains("{query}") {
        return Err("market_search_template must contain {query}".into());
    }
    if !cfg.messaging_link_template.contains("{number}") {
        return Err("messaging_link_template must contain {number}".into());
    }
    if cfg.recency_db_path.as_os_str().is_empty() {
        return Err("recency_db_path is required".into());
    }
    if cfg.log_dir.as_os_str().is_empty() {
        return Err("log_dir is required".into());
    }
    Ok(())
}

/// Loads `path` (default: `<data dir>/config.toml`). A missing file yields
/// the defaults.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| Config::default().config_path);

    let mut cfg = if config_path.exists() {
        let raw = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;
        parse(&config_path, &raw)?
    } else {
        Config::default()
    };
    cfg.config_path = config_path;

    validate(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    validate(cfg).map_err(ConfigError::Invalid)?;
    let path = &cfg.config_path;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let encoded = toml::to_string_pretty(cfg)?;
    std::fs::write(path, encoded).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })
}

fn parse(path: &Path, raw: &str) -> Result<Config, ConfigError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") | Some("json5") => Ok(json5::from_str(raw)?),
        _ => Ok(toml::from_str(raw)?),
    }
}
