use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::discovery::{AppSource, CallLogSource, ContactSource, ProviderError, StaticSources};
use crate::model::{
    label_sort_key, AppEntry, CallRecord, ContactEntry, ContactRecord, LaunchableApp,
};

pub const DEFAULT_RECENT_CALL_LIMIT: usize = 25;

enum Slot<T> {
    Empty,
    Loading,
    Ready(Arc<T>),
}

struct State<T, E> {
    slot: Slot<T>,
    generation: u64,
    /// Id of the most recently started load.
    flight: u64,
    /// Error of the last load, tagged with its flight id.
    failed: Option<(u64, E)>,
}

/// Lazily populated value whose loader runs at most once at a time.
///
/// Callers arriving while a load is in flight block until it finishes and
/// share its result, including its error. A failed load leaves the cell
/// empty so the next caller to arrive afterwards retries. `invalidate`
/// drops the value; a load that was already running when the invalidation
/// happened still returns its value to its own callers but never writes it
/// back into the cell.
pub struct SingleFlight<T, E> {
    state: Mutex<State<T, E>>,
    loaded: Condvar,
}

impl<T, E> Default for SingleFlight<T, E> {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                slot: Slot::Empty,
                generation: 0,
                flight: 0,
                failed: None,
            }),
            loaded: Condvar::new(),
        }
    }
}

impl<T, E: Clone> SingleFlight<T, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The loaded value, without triggering a load.
    pub fn get(&self) -> Option<Arc<T>> {
        match &self.lock().slot {
            Slot::Ready(value) => Some(Arc::clone(value)),
            Slot::Empty | Slot::Loading => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.lock().slot, Slot::Ready(_))
    }

    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut state = self.lock();
        let mut joined = None;
        loop {
            match &state.slot {
                Slot::Ready(value) => return Ok(Arc::clone(value)),
                Slot::Loading => {
                    joined = Some(state.flight);
                    state = self
                        .loaded
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Slot::Empty => {
                    if let (Some(flight), Some((failed_flight, error))) = (joined, &state.failed) {
                        if flight == *failed_flight {
                            return Err(error.clone());
                        }
                    }
                    break;
                }
            }
        }

        state.flight = state.flight.wrapping_add(1);
        state.slot = Slot::Loading;
        state.failed = None;
        let mut flight = InFlight {
            cell: self,
            generation: state.generation,
            flight: state.flight,
            finished: false,
        };
        drop(state);

        let outcome = load();
        flight.finish(outcome.map(Arc::new))
    }

    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        state.slot = Slot::Empty;
        state.failed = None;
        drop(state);
        self.loaded.notify_all();
    }
}

impl<T, E> SingleFlight<T, E> {
    fn lock(&self) -> MutexGuard<'_, State<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct InFlight<'a, T, E> {
    cell: &'a SingleFlight<T, E>,
    generation: u64,
    flight: u64,
    finished: bool,
}

impl<T, E: Clone> InFlight<'_, T, E> {
    fn finish(&mut self, outcome: Result<Arc<T>, E>) -> Result<Arc<T>, E> {
        let mut state = self.cell.lock();
        if state.generation == self.generation {
            match &outcome {
                Ok(value) => state.slot = Slot::Ready(Arc::clone(value)),
                Err(error) => {
                    state.slot = Slot::Empty;
                    state.failed = Some((self.flight, error.clone()));
                }
            }
        }
        self.finished = true;
        drop(state);
        self.cell.loaded.notify_all();
        outcome
    }
}

impl<T, E> Drop for InFlight<'_, T, E> {
    // Unwinding loader: release waiters instead of leaving the slot Loading.
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.cell.lock();
        if state.generation == self.generation {
            state.slot = Slot::Empty;
        }
        drop(state);
        self.cell.loaded.notify_all();
    }
}

/// The three process-lifetime data sets the interpreter reads from.
pub struct DataSourceCache {
    app_source: Arc<dyn AppSource>,
    call_source: Arc<dyn CallLogSource>,
    contact_source: Arc<dyn ContactSource>,
    recent_call_limit: usize,
    apps: SingleFlight<Vec<AppEntry>, ProviderError>,
    recent_contacts: SingleFlight<Vec<ContactEntry>, ProviderError>,
    directory: SingleFlight<Vec<ContactEntry>, ProviderError>,
}

impl DataSourceCache {
    pub fn new(
        app_source: Arc<dyn AppSource>,
        call_source: Arc<dyn CallLogSource>,
        contact_source: Arc<dyn ContactSource>,
    ) -> Self {
        Self {
            app_source,
            call_source,
            contact_source,
            recent_call_limit: DEFAULT_RECENT_CALL_LIMIT,
            apps: SingleFlight::new(),
            recent_contacts: SingleFlight::new(),
            directory: SingleFlight::new(),
        }
    }

    pub fn from_static(sources: StaticSources) -> Self {
        let shared = Arc::new(sources);
        Self::new(shared.clone(), shared.clone(), shared)
    }

    pub fn with_recent_call_limit(mut self, limit: usize) -> Self {
        self.recent_call_limit = limit;
        self
    }

    /// App directory, loading it on first use. A failed load yields an
    /// empty list and is retried on the next call.
    pub fn apps(&self) -> Arc<Vec<AppEntry>> {
        let source = &self.app_source;
        self.apps
            .get_or_load(|| -> Result<_, ProviderError> {
                let records = source.fetch_launchable_apps()?;
                let apps = build_app_directory(records);
                info!(
                    source = source.source_name(),
                    count = apps.len(),
                    "loaded app directory"
                );
                Ok(apps)
            })
            .unwrap_or_else(|error| degrade("apps", &error))
    }

    pub fn recent_contacts(&self) -> Arc<Vec<ContactEntry>> {
        let source = &self.call_source;
        let limit = self.recent_call_limit;
        self.recent_contacts
            .get_or_load(|| -> Result<_, ProviderError> {
                let records = source.fetch_recent_calls(limit)?;
                let contacts = build_recent_contacts(records, limit);
                info!(
                    source = source.source_name(),
                    count = contacts.len(),
                    "loaded recent calls"
                );
                Ok(contacts)
            })
            .unwrap_or_else(|error| degrade("recent_contacts", &error))
    }

    pub fn contact_directory(&self) -> Arc<Vec<ContactEntry>> {
        let source = &self.contact_source;
        self.directory
            .get_or_load(|| -> Result<_, ProviderError> {
                let records = source.fetch_all_contacts()?;
                let contacts = build_contact_directory(records);
                info!(
                    source = source.source_name(),
                    count = contacts.len(),
                    "loaded contact directory"
                );
                Ok(contacts)
            })
            .unwrap_or_else(|error| degrade("contact_directory", &error))
    }

    pub fn cached_apps(&self) -> Option<Arc<Vec<AppEntry>>> {
        self.apps.get()
    }

    pub fn cached_recent_contacts(&self) -> Option<Arc<Vec<ContactEntry>>> {
        self.recent_contacts.get()
    }

    pub fn cached_contact_directory(&self) -> Option<Arc<Vec<ContactEntry>>> {
        self.directory.get()
    }

    /// Package added or removed: the next read re-fetches the whole list.
    pub fn invalidate_apps(&self) {
        debug!("app directory invalidated");
        self.apps.invalidate();
    }
}

fn degrade<T>(cache: &'static str, error: &ProviderError) -> Arc<Vec<T>> {
    warn!(cache, %error, "data source load failed; serving empty list");
    Arc::new(Vec::new())
}

/// Launchable apps sorted by lowercased label.
pub fn build_app_directory(records: Vec<LaunchableApp>) -> Vec<AppEntry> {
    let mut apps: Vec<AppEntry> = records
        .into_iter()
        .map(|record| AppEntry::from_owned(record.label, record.package_id))
        .collect();
    apps.sort_by_cached_key(|app| label_sort_key(&app.label));
    apps
}

/// Newest-first call records reduced to at most `limit` distinct numbers.
/// Duplicates are detected on the raw number, before normalization; records
/// with no dialable digits ("PRIVATE", "Unknown") are dropped.
pub fn build_recent_contacts(records: Vec<CallRecord>, limit: usize) -> Vec<ContactEntry> {
    let mut seen = HashSet::new();
    let mut contacts = Vec::new();

    for record in records {
        if contacts.len() >= limit {
            break;
        }
        if record.raw_number.is_empty() || !seen.insert(record.raw_number.clone()) {
            continue;
        }
        let name = record
            .cached_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| record.raw_number.clone());
        let contact = ContactEntry::new(&name, &record.raw_number);
        if contact.is_dialable() {
            contacts.push(contact);
        }
    }

    contacts
}

/// Every named phone record, alphabetical by display name.
pub fn build_contact_directory(records: Vec<ContactRecord>) -> Vec<ContactEntry> {
    let mut contacts: Vec<ContactEntry> = records
        .into_iter()
        .filter(|record| !record.display_name.trim().is_empty())
        .map(|record| ContactEntry::new(&record.display_name, &record.raw_number))
        .filter(ContactEntry::is_dialable)
        .collect();
    contacts.sort_by(|a, b| a.name_lower().cmp(b.name_lower()));
    contacts
}
