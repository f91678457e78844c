use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::action_executor::{market_search_url, messaging_deep_link, web_search_url, Action};
use crate::command::{Command, ContactChannel, ContactTier};
use crate::config::Config;
use crate::model::{AppEntry, ContactEntry, ResultItem};
use crate::recency_store::{RecencyStore, RecencyTracker};
use crate::search::rank_cloned;
use crate::source_cache::DataSourceCache;

/// What the drawer shows for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub command: Command,
    pub header: &'static str,
    pub items: Vec<ResultItem>,
}

/// One drawer session. Holds no query state: results are recomputed from
/// the caches and the recency store on every call.
pub struct Interpreter {
    config: Config,
    sources: Arc<DataSourceCache>,
    recency: RecencyTracker,
}

impl Interpreter {
    pub fn new(
        config: Config,
        sources: Arc<DataSourceCache>,
        store: Arc<dyn RecencyStore>,
    ) -> Self {
        let recency = RecencyTracker::new(store).with_window_ms(config.recency_window_ms);
        Self {
            config,
            sources,
            recency,
        }
    }

    pub fn sources(&self) -> &Arc<DataSourceCache> {
        &self.sources
    }

    pub fn parse(&self, query: &str) -> Command {
        Command::parse_with(query, self.config.directory_min_key_len)
    }

    /// Loads whatever the query needs. Blocks on platform queries, so hosts
    /// call it off their UI thread (see [`Interpreter::spawn_prepare`]) and
    /// re-resolve once it returns.
    pub fn prepare_sources(&self, query: &str) {
        prepare_for(&self.sources, &self.parse(query));
    }

    pub fn spawn_prepare(&self, query: &str) -> JoinHandle<()> {
        let sources = Arc::clone(&self.sources);
        let command = self.parse(query);
        std::thread::spawn(move || prepare_for(&sources, &command))
    }

    /// Result list for `query` from what is cached right now. Never blocks
    /// on a data source: a cache that is still loading reads as empty.
    pub fn resolve_results(&self, query: &str, now_ms: i64) -> Resolution {
        let command = self.parse(query);
        let items = self.items_for(&command, now_ms);
        Resolution {
            header: command.header(),
            command,
            items,
        }
    }

    /// [`Interpreter::prepare_sources`] followed by
    /// [`Interpreter::resolve_results`], for synchronous hosts.
    pub fn refresh(&self, query: &str, now_ms: i64) -> Resolution {
        self.prepare_sources(query);
        self.resolve_results(query, now_ms)
    }

    fn items_for(&self, command: &Command, now_ms: i64) -> Vec<ResultItem> {
        match command {
            Command::EmptyQuery => {
                let apps = self.cached_apps();
                wrap_apps(self.recency.recently_used(&apps, now_ms))
            }
            Command::ListAll => wrap_apps(self.cached_apps().to_vec()),
            Command::UninstallRequest { key } if key.is_empty() => {
                wrap_apps(self.cached_apps().to_vec())
            }
            Command::UninstallRequest { key } | Command::FuzzyAppSearch { key } => {
                wrap_apps(fuzzy_apps(key, &self.cached_apps()))
            }
            Command::ContactLookup { tier, key, .. } => self.contact_items(*tier, key),
            Command::ClearRecents
            | Command::ExitToHome
            | Command::WebSearch { .. }
            | Command::MarketInstall { .. } => Vec::new(),
        }
    }

    fn contact_items(&self, tier: ContactTier, key: &str) -> Vec<ResultItem> {
        let contacts = match tier {
            ContactTier::Recent => self
                .sources
                .cached_recent_contacts()
                .map(|recent| recent.to_vec())
                .unwrap_or_default(),
            ContactTier::DirectDial => vec![ContactEntry::direct_dial(key)],
            ContactTier::Directory => self
                .sources
                .cached_contact_directory()
                .map(|directory| fuzzy_contacts(key, &directory))
                .unwrap_or_default(),
            ContactTier::Narrowing => Vec::new(),
        };
        contacts.into_iter().map(ResultItem::Contact).collect()
    }

    fn cached_apps(&self) -> Arc<Vec<AppEntry>> {
        self.sources.cached_apps().unwrap_or_default()
    }

    /// The "Go" action: acts on `query` given the list currently shown.
    /// `None` means nothing to do.
    pub fn execute(&self, query: &str, results: &[ResultItem], now_ms: i64) -> Option<Action> {
        let command = self.parse(query);
        info!(?command, result_count = results.len(), "execute");

        match &command {
            Command::ExitToHome => Some(Action::NavigateHome),
            Command::ClearRecents => {
                self.recency.clear();
                None
            }
            Command::WebSearch { query } => {
                if query.is_empty() {
                    return None;
                }
                web_search_url(&self.config, query).map(Action::OpenUrl)
            }
            Command::MarketInstall { query } => {
                if query.is_empty() {
                    return None;
                }
                Some(Action::OpenUrl(market_search_url(&self.config, query)))
            }
            Command::UninstallRequest { key } => resolve_uninstall_target(key, results)
                .map(|app| Action::RequestUninstall(app.package_id.clone())),
            Command::ContactLookup { channel, .. } => results
                .iter()
                .find_map(ResultItem::as_contact)
                .and_then(|contact| self.contact_action(*channel, contact)),
            Command::EmptyQuery | Command::ListAll | Command::FuzzyAppSearch { .. } => {
                let first = results.first()?;
                self.execute_item(first, query, now_ms)
            }
        }
    }

    /// A tapped row. The active command decides the verb: uninstall mode
    /// uninstalls, messaging mode messages, everything else launches or
    /// calls.
    pub fn execute_item(&self, item: &ResultItem, query: &str, now_ms: i64) -> Option<Action> {
        let command = self.parse(query);
        match (item, &command) {
            (ResultItem::App(app), Command::UninstallRequest { .. }) => {
                Some(Action::RequestUninstall(app.package_id.clone()))
            }
            (ResultItem::App(app), _) => {
                self.recency.record_launch(&app.package_id, now_ms);
                Some(Action::LaunchPackage(app.package_id.clone()))
            }
            (ResultItem::Contact(contact), Command::ContactLookup { channel, .. }) => {
                self.contact_action(*channel, contact)
            }
            (ResultItem::Contact(contact), _) => {
                self.contact_action(ContactChannel::Call, contact)
            }
        }
    }

    /// `None` for an entry without a dialable number.
    fn contact_action(&self, channel: ContactChannel, contact: &ContactEntry) -> Option<Action> {
        if !contact.is_dialable() {
            debug!(name = %contact.name, "contact has no dialable number");
            return None;
        }
        let action = match channel {
            ContactChannel::Call => Action::PlaceOrDialCall(contact.number.clone()),
            ContactChannel::Message => {
                Action::OpenMessagingDeepLink(messaging_deep_link(&self.config, &contact.number))
            }
        };
        Some(action)
    }
}

fn prepare_for(sources: &DataSourceCache, command: &Command) {
    let apps = sources.apps();
    debug!(app_count = apps.len(), "apps ready");

    if let Command::ContactLookup { tier, .. } = command {
        match tier {
            ContactTier::Recent => {
                sources.recent_contacts();
            }
            ContactTier::Directory => {
                sources.contact_directory();
            }
            ContactTier::DirectDial | ContactTier::Narrowing => {}
        }
    }
}

fn fuzzy_apps(key: &str, apps: &[AppEntry]) -> Vec<AppEntry> {
    rank_cloned(key, apps, AppEntry::label_lower)
}

fn fuzzy_contacts(key: &str, contacts: &[ContactEntry]) -> Vec<ContactEntry> {
    rank_cloned(key, contacts, ContactEntry::name_lower)
}

fn wrap_apps(apps: Vec<AppEntry>) -> Vec<ResultItem> {
    apps.into_iter().map(ResultItem::App).collect()
}

/// Exact label or package id match within the shown list, else the first
/// (best ranked) app shown.
fn resolve_uninstall_target<'a>(key: &str, results: &'a [ResultItem]) -> Option<&'a AppEntry> {
    let mut apps = results.iter().filter_map(ResultItem::as_app);
    if key.is_empty() {
        return apps.next();
    }
    results
        .iter()
        .filter_map(ResultItem::as_app)
        .find(|app| app.label_lower() == key || app.package_id.eq_ignore_ascii_case(key))
        .or_else(|| apps.next())
}

pub fn now_epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
