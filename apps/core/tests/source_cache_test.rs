use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

use termlaunch_core::discovery::{AppSource, ProviderError, StaticSources};
use termlaunch_core::model::{CallRecord, ContactRecord, LaunchableApp};
use termlaunch_core::source_cache::{
    build_app_directory, build_contact_directory, build_recent_contacts, DataSourceCache,
};

fn app(label: &str, package_id: &str) -> LaunchableApp {
    LaunchableApp {
        label: label.to_string(),
        package_id: package_id.to_string(),
    }
}

fn call(raw_number: &str, cached_name: Option<&str>) -> CallRecord {
    CallRecord {
        raw_number: raw_number.to_string(),
        cached_name: cached_name.map(str::to_string),
    }
}

struct CountingApps {
    fetches: AtomicUsize,
    delay: Duration,
    fail_first: bool,
}

impl CountingApps {
    fn new(delay: Duration) -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            delay,
            fail_first: false,
        }
    }
}

impl AppSource for CountingApps {
    fn source_name(&self) -> &'static str {
        "counting"
    }

    fn fetch_launchable_apps(&self) -> Result<Vec<LaunchableApp>, ProviderError> {
        let call = self.fetches.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if self.fail_first && call == 0 {
            return Err(ProviderError::new("counting", "package manager unavailable"));
        }
        Ok(vec![app("Settings", "b"), app("camera", "a")])
    }
}

fn cache_with_apps(apps: Arc<dyn AppSource>) -> DataSourceCache {
    let statics = Arc::new(StaticSources::deterministic_fixture());
    DataSourceCache::new(apps, statics.clone(), statics)
}

#[test]
fn concurrent_cold_reads_fetch_once() {
    let source = Arc::new(CountingApps::new(Duration::from_millis(50)));
    let cache = Arc::new(cache_with_apps(source.clone()));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                cache.apps().len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn warm_reads_do_not_refetch() {
    let source = Arc::new(CountingApps::new(Duration::ZERO));
    let cache = cache_with_apps(source.clone());

    assert!(cache.cached_apps().is_none());
    let first = cache.apps();
    let second = cache.apps();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
}

#[test]
fn app_directory_is_sorted_by_lowercase_label() {
    let source = Arc::new(CountingApps::new(Duration::ZERO));
    let cache = cache_with_apps(source);
    let labels: Vec<String> = cache.apps().iter().map(|app| app.label.clone()).collect();
    assert_eq!(labels, vec!["camera", "Settings"]);
}

#[test]
fn invalidation_replaces_the_whole_list() {
    let source = Arc::new(CountingApps::new(Duration::ZERO));
    let cache = cache_with_apps(source.clone());

    let before = cache.apps();
    cache.invalidate_apps();
    assert!(cache.cached_apps().is_none());
    let after = cache.apps();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_load_serves_empty_and_retries() {
    let source = Arc::new(CountingApps {
        fail_first: true,
        ..CountingApps::new(Duration::ZERO)
    });
    let cache = cache_with_apps(source.clone());

    assert!(cache.apps().is_empty());
    assert!(cache.cached_apps().is_none());
    assert_eq!(cache.apps().len(), 2);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

struct FailingApps {
    fetches: AtomicUsize,
}

impl AppSource for FailingApps {
    fn source_name(&self) -> &'static str {
        "failing"
    }

    fn fetch_launchable_apps(&self) -> Result<Vec<LaunchableApp>, ProviderError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(100));
        Err(ProviderError::new("failing", "package manager unavailable"))
    }
}

#[test]
fn concurrent_callers_share_one_failed_load() {
    let source = Arc::new(FailingApps {
        fetches: AtomicUsize::new(0),
    });
    let cache = Arc::new(cache_with_apps(source.clone()));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait();
                cache.apps().len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 0);
    }
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    // A later access retries.
    assert!(cache.apps().is_empty());
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}

struct GatedApps {
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl AppSource for GatedApps {
    fn source_name(&self) -> &'static str {
        "gated"
    }

    fn fetch_launchable_apps(&self) -> Result<Vec<LaunchableApp>, ProviderError> {
        let _ = self.started.lock().unwrap().send(());
        let _ = self.release.lock().unwrap().recv();
        Ok(vec![app("Stale", "stale")])
    }
}

#[test]
fn load_in_flight_during_invalidation_does_not_repopulate() {
    let (started_tx, started_rx) = channel();
    let (release_tx, release_rx) = channel();
    let source = Arc::new(GatedApps {
        started: Mutex::new(started_tx),
        release: Mutex::new(release_rx),
    });
    let cache = Arc::new(cache_with_apps(source));

    let loader = {
        let cache = Arc::clone(&cache);
        std::thread::spawn(move || cache.apps().len())
    };

    started_rx.recv().unwrap();
    cache.invalidate_apps();
    release_tx.send(()).unwrap();

    assert_eq!(loader.join().unwrap(), 1);
    assert!(cache.cached_apps().is_none());
}

#[test]
fn recent_contacts_dedupe_on_raw_number_and_cap() {
    let mut records = vec![
        call("555-0100", Some("Bob")),
        call("555-0100", Some("Bob")),
        call("5550100", Some("Bob (home)")),
        call("98765 43210", None),
        call("", Some("Blocked")),
    ];
    for i in 0..40 {
        records.push(call(&format!("555-{i:04}"), None));
    }

    let contacts = build_recent_contacts(records, 25);

    assert_eq!(contacts.len(), 25);
    assert_eq!(contacts[0].name, "Bob");
    assert_eq!(contacts[0].number, "5550100");
    // Same digits, different raw text: kept as a separate entry.
    assert_eq!(contacts[1].name, "Bob (home)");
    assert_eq!(contacts[2].name, "98765 43210");
    assert_eq!(contacts[2].number, "9876543210");
}

#[test]
fn withheld_numbers_are_dropped_from_both_contact_lists() {
    let recent = build_recent_contacts(
        vec![
            call("PRIVATE", None),
            call("Unknown", Some("Unknown caller")),
            call("555-0100", Some("Bob")),
        ],
        25,
    );
    let names: Vec<&str> = recent.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Bob"]);

    let directory = build_contact_directory(vec![
        ContactRecord {
            display_name: "Voicemail".to_string(),
            raw_number: "*#".to_string(),
        },
        ContactRecord {
            display_name: "Bob".to_string(),
            raw_number: "555-0100".to_string(),
        },
    ]);
    let names: Vec<&str> = directory.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Bob"]);
}

#[test]
fn recent_contacts_respect_configured_limit() {
    let cache = DataSourceCache::from_static(StaticSources::deterministic_fixture())
        .with_recent_call_limit(1);
    let recent = cache.recent_contacts();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].name, "Ada Lovelace");
}

#[test]
fn contact_directory_is_alphabetical_and_skips_unnamed() {
    let contacts = build_contact_directory(vec![
        ContactRecord {
            display_name: "zoe".to_string(),
            raw_number: "1".to_string(),
        },
        ContactRecord {
            display_name: " ".to_string(),
            raw_number: "2".to_string(),
        },
        ContactRecord {
            display_name: "Adam".to_string(),
            raw_number: "+1 (555) 010-0200".to_string(),
        },
    ]);

    let names: Vec<&str> = contacts.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Adam", "zoe"]);
    assert_eq!(contacts[0].number, "+15550100200");
}

#[test]
fn contact_tiers_load_independently() {
    let cache = DataSourceCache::from_static(StaticSources::deterministic_fixture());

    cache.recent_contacts();
    assert!(cache.cached_recent_contacts().is_some());
    assert!(cache.cached_contact_directory().is_none());
    assert!(cache.cached_apps().is_none());

    cache.contact_directory();
    assert!(cache.cached_contact_directory().is_some());
}

#[test]
fn build_app_directory_keeps_input_order_for_equal_labels() {
    let apps = build_app_directory(vec![app("Mail", "work"), app("mail", "personal")]);
    let ids: Vec<&str> = apps.iter().map(|a| a.package_id.as_str()).collect();
    assert_eq!(ids, vec!["work", "personal"]);
}
