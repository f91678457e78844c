use termlaunch_core::model::AppEntry;
use termlaunch_core::search::{rank, score};

fn is_subsequence(query: &str, target: &str) -> bool {
    let mut wanted = query.chars().peekable();
    for c in target.chars() {
        if wanted.peek() == Some(&c) {
            wanted.next();
        }
    }
    wanted.peek().is_none()
}

#[test]
fn camera_outranks_other_ca_apps_for_cam() {
    let apps = vec![
        AppEntry::new("Calendar", "cal"),
        AppEntry::new("Calculator", "calc"),
        AppEntry::new("Camera", "cam"),
    ];
    let ranked = rank("cam", &apps, AppEntry::label_lower);
    assert_eq!(ranked[0].label, "Camera");
}

#[test]
fn non_matching_candidates_are_excluded() {
    let apps = vec![
        AppEntry::new("Camera", "a"),
        AppEntry::new("Settings", "b"),
        AppEntry::new("Clock", "c"),
    ];
    let ranked = rank("ck", &apps, AppEntry::label_lower);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].package_id, "c");
}

#[test]
fn literal_prefix_beats_scattered_match_of_equal_length() {
    let queries = ["ma", "cal", "set", "m"];
    let scattered = ["xmxaxx", "xcxaxl", "sxextx", "xxxxxm"];
    let prefixed = ["maxxxx", "calxxx", "setxxx", "mxxxxx"];

    for ((query, prefix_target), scattered_target) in
        queries.iter().zip(prefixed.iter()).zip(scattered.iter())
    {
        let prefix_score = score(query, prefix_target).unwrap();
        let scattered_score = score(query, scattered_target).unwrap();
        assert!(
            prefix_score >= scattered_score,
            "{query}: {prefix_score} < {scattered_score}"
        );
    }
}

#[test]
fn score_matches_iff_query_is_subsequence() {
    let targets = ["camera", "calendar", "settings", "google maps", "", "a"];
    let queries = ["cam", "cr", "sg", "gmaps", "zz", "", "aa", "stt", "ca", "ml"];
    for target in targets {
        for query in queries {
            assert_eq!(
                score(query, target).is_some(),
                is_subsequence(query, target),
                "query {query:?} target {target:?}"
            );
        }
    }
}

#[test]
fn tight_clusters_beat_scattered_letters() {
    let tight = score("mp", "xmpxx").unwrap();
    let loose = score("mp", "xmxxp").unwrap();
    assert!(tight > loose, "{tight} <= {loose}");
}

#[test]
fn equal_scores_keep_input_order() {
    let apps = vec![
        AppEntry::new("Notes", "first"),
        AppEntry::new("Notes", "second"),
        AppEntry::new("Notes", "third"),
    ];
    let ranked = rank("no", &apps, AppEntry::label_lower);
    let ids: Vec<&str> = ranked.iter().map(|app| app.package_id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third"]);
}

#[test]
fn ranking_is_repeatable() {
    let apps = vec![
        AppEntry::new("Messages", "m1"),
        AppEntry::new("Maps", "m2"),
        AppEntry::new("Music", "m3"),
    ];
    let first = rank("ms", &apps, AppEntry::label_lower);
    let second = rank("ms", &apps, AppEntry::label_lower);
    assert_eq!(first, second);
}
