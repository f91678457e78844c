//! Line-oriented development host. Stands in for the launcher UI: every
//! input line is a query, a trailing `!` confirms it ("Go"), and
//! `:invalidate` simulates a package-change broadcast.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::action_executor::{validate_target, Action, ActionExecutor, LaunchError};
use crate::config::{self, ConfigError};
use crate::discovery::{ProviderError, StaticSources};
use crate::interpreter::{now_epoch_millis, Interpreter, Resolution};
use crate::recency_store::{SqliteRecencyStore, StoreError};
use crate::source_cache::DataSourceCache;

const CONFIRM_SUFFIX: char = '!';
const INVALIDATE_COMMAND: &str = ":invalidate";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("fixture error: {0}")]
    Provider(#[from] ProviderError),
    #[error("launch error: {0}")]
    Launch(#[from] LaunchError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub config_path: Option<PathBuf>,
    pub fixture_path: Option<PathBuf>,
    pub query: Option<String>,
}

pub fn parse_cli_args(args: &[String]) -> Result<RuntimeOptions, String> {
    let mut options = RuntimeOptions::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--config" => options.config_path = Some(PathBuf::from(value("--config")?)),
            "--fixture" => options.fixture_path = Some(PathBuf::from(value("--fixture")?)),
            "--query" => options.query = Some(value("--query")?),
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(options)
}

/// Prints actions instead of performing them.
pub struct PrintingExecutor<W: Write + Send> {
    out: std::sync::Mutex<W>,
}

impl<W: Write + Send> PrintingExecutor<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: std::sync::Mutex::new(out),
        }
    }
}

impl<W: Write + Send> ActionExecutor for PrintingExecutor<W> {
    fn perform(&self, action: &Action) -> Result<(), LaunchError> {
        validate_target(action)?;
        let encoded = serde_json::to_string(action)
            .map_err(|e| LaunchError::LaunchFailed(e.to_string()))?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| LaunchError::LaunchFailed("output lock poisoned".to_string()))?;
        writeln!(out, "ACTION {encoded}").map_err(|e| LaunchError::LaunchFailed(e.to_string()))
    }
}

pub fn run_with_options(options: RuntimeOptions) -> Result<(), RuntimeError> {
    let cfg = config::load(options.config_path.as_deref())?;
    crate::logging::init(&cfg.log_dir)?;
    info!(
        config_path = %cfg.config_path.display(),
        recency_db_path = %cfg.recency_db_path.display(),
        "startup"
    );

    let sources = match &options.fixture_path {
        Some(path) => StaticSources::from_json_file(path)?,
        None => StaticSources::deterministic_fixture(),
    };
    let cache = DataSourceCache::from_static(sources).with_recent_call_limit(cfg.recent_call_limit);
    let store = SqliteRecencyStore::open_file(&cfg.recency_db_path)?;
    let interpreter = Interpreter::new(cfg, Arc::new(cache), Arc::new(store));
    let executor = PrintingExecutor::new(std::io::stdout());

    let stdout = std::io::stdout();
    match options.query {
        Some(query) => {
            let input = std::io::Cursor::new(query.into_bytes());
            run_session(&interpreter, &executor, input, stdout.lock())
        }
        None => {
            let stdin = std::io::stdin();
            run_session(&interpreter, &executor, stdin.lock(), stdout.lock())
        }
    }
}

/// Drives one drawer session until `input` is exhausted or an action asks
/// to close the drawer.
pub fn run_session<R, W>(
    interpreter: &Interpreter,
    executor: &dyn ActionExecutor,
    input: R,
    mut output: W,
) -> Result<(), RuntimeError>
where
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim_end();

        if trimmed == INVALIDATE_COMMAND {
            interpreter.sources().invalidate_apps();
            writeln!(output, "app cache invalidated")?;
            continue;
        }

        let (query, confirm) = match trimmed.strip_suffix(CONFIRM_SUFFIX) {
            Some(query) => (query, true),
            None => (trimmed, false),
        };

        let now = now_epoch_millis();
        let resolution = interpreter.refresh(query, now);
        render(&mut output, &resolution)?;

        if !confirm {
            continue;
        }
        match interpreter.execute(query, &resolution.items, now) {
            Some(action) => {
                executor.perform(&action)?;
                if action.closes_drawer() {
                    break;
                }
            }
            None => writeln!(output, "(no action)")?,
        }
    }
    Ok(())
}

fn render<W: Write>(output: &mut W, resolution: &Resolution) -> std::io::Result<()> {
    writeln!(output, "{}", resolution.header)?;
    for item in &resolution.items {
        writeln!(output, "{}", item.display_text())?;
    }
    Ok(())
}
