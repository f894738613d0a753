use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use super::*;

const KEEP_ALIVE: Duration = Duration::from_secs(60);

#[test]
fn registered_keys_expire_after_keep_alive() {
    let start = Instant::now();
    let mut refs = RefCounts::new(KEEP_ALIVE);

    assert!(refs.register(&"a", start));
    assert!(!refs.register(&"a", start + Duration::from_secs(30)));

    assert!(refs.gc(start + Duration::from_secs(59)).is_empty());
    assert_eq!(refs.gc(start + KEEP_ALIVE), vec!["a"]);
    assert!(!refs.is_tracked(&"a"));
    assert!(refs.is_empty());
}

#[test]
fn retained_keys_never_expire() {
    let start = Instant::now();
    let mut refs = RefCounts::new(KEEP_ALIVE);

    refs.register(&"a", start);
    refs.retain(&"a");

    assert!(refs.gc(start + KEEP_ALIVE * 10).is_empty());
    assert_eq!(refs.count(&"a"), 1);
}

#[test]
fn release_schedules_expiry_from_release_time() {
    let start = Instant::now();
    let released_at = start + Duration::from_secs(100);
    let mut refs = RefCounts::new(KEEP_ALIVE);

    refs.register(&"a", start);
    refs.retain(&"a");
    refs.retain(&"a");
    refs.release(&"a", start);
    assert_eq!(refs.count(&"a"), 1);
    assert!(refs.gc(released_at).is_empty());

    refs.release(&"a", released_at);
    assert_eq!(refs.count(&"a"), 0);
    assert!(refs.gc(released_at + Duration::from_secs(59)).is_empty());
    assert_eq!(refs.gc(released_at + KEEP_ALIVE), vec!["a"]);
}

#[test]
fn retain_cancels_pending_expiry() {
    let start = Instant::now();
    let mut refs = RefCounts::new(KEEP_ALIVE);

    refs.register(&"a", start);
    refs.retain(&"a");
    refs.release(&"a", start);
    refs.retain(&"a");

    assert!(refs.gc(start + KEEP_ALIVE * 2).is_empty());
    assert!(refs.is_tracked(&"a"));
}

#[test]
fn releasing_unretained_keys_is_ignored() {
    let start = Instant::now();
    let mut refs = RefCounts::<&str>::new(KEEP_ALIVE);

    refs.release(&"unknown", start);
    refs.register(&"a", start);
    refs.release(&"a", start);

    assert_eq!(refs.count(&"a"), 0);
    assert_eq!(refs.len(), 1);
    assert!(!refs.is_tracked(&"unknown"));
}

#[test]
fn gc_only_returns_expired_keys() {
    let start = Instant::now();
    let mut refs = RefCounts::new(KEEP_ALIVE);

    refs.register(&"early", start);
    refs.register(&"late", start + Duration::from_secs(30));
    refs.register(&"held", start);
    refs.retain(&"held");

    assert_eq!(refs.gc(start + KEEP_ALIVE), vec!["early"]);
    assert_eq!(refs.len(), 2);
    assert_eq!(refs.gc(start + KEEP_ALIVE * 2), vec!["late"]);
}

#[test]
fn unbounded_keep_alive_never_expires() {
    let start = Instant::now();
    let mut refs = RefCounts::new(Duration::MAX);

    assert!(refs.register(&"a", start));
    refs.register(&"b", start);
    refs.retain(&"b");
    refs.release(&"b", start);

    let much_later = start + Duration::from_secs(60 * 60 * 24 * 365);
    assert!(refs.gc(much_later).is_empty());
    assert!(refs.is_tracked(&"a"));
    assert!(refs.is_tracked(&"b"));
    assert_eq!(refs.len(), 2);
}
