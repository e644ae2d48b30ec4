use std::sync::Arc;
use std::time::Duration;
use trinket_capability::{CapabilityCache, WarnLimiter};
use trinket_types::OwnerId;

#[test]
fn get_or_create_returns_one_instance_per_owner() {
    let cache = CapabilityCache::default();
    let owner = OwnerId::new();

    let first = cache.get_or_create(owner);
    let second = cache.get_or_create(owner);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.lock().owner_id(), Some(owner));
    assert_eq!(cache.len(), 1);
}

#[test]
fn concurrent_first_access_yields_single_instance() {
    let cache = CapabilityCache::default();
    let owner = OwnerId::new();

    let handles: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| cache.get_or_create(owner)))
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
    assert_eq!(cache.len(), 1);
}

#[test]
fn evict_removes_entry() {
    let cache = CapabilityCache::default();
    let kept = OwnerId::new();
    let gone = OwnerId::new();
    cache.get_or_create(kept);
    cache.get_or_create(gone);

    assert!(cache.evict(gone).is_some());
    assert!(cache.evict(gone).is_none());
    assert!(cache.get(gone).is_none());
    assert!(cache.contains(kept));
    assert_eq!(cache.owners(), vec![kept]);
}

#[test]
fn eviction_then_access_creates_fresh_instance() {
    let cache = CapabilityCache::default();
    let owner = OwnerId::new();
    let before = cache.get_or_create(owner);
    cache.evict(owner);

    let after = cache.get_or_create(owner);

    assert!(!Arc::ptr_eq(&before, &after));
}

#[test]
fn warn_once_fires_once_per_key() {
    let limiter = WarnLimiter::default();
    assert!(limiter.warn_once("a"));
    assert!(!limiter.warn_once("a"));
    assert!(limiter.warn_once("b"));
}

#[test]
fn warn_limited_respects_interval() {
    let slow = WarnLimiter::new(Duration::from_secs(3600));
    assert!(slow.warn_limited("k"));
    assert!(!slow.warn_limited("k"));

    let fast = WarnLimiter::new(Duration::ZERO);
    assert!(fast.warn_limited("k"));
    assert!(fast.warn_limited("k"));
}

#[test]
fn clear_owner_forgets_only_that_owner() {
    let limiter = WarnLimiter::default();
    let a = OwnerId::new();
    let b = OwnerId::new();
    limiter.warn_once(&format!("{a}:unknown-group:wings"));
    limiter.warn_limited(&format!("{a}:missing-stat:luck"));
    limiter.warn_once(&format!("{b}:unknown-group:wings"));

    limiter.clear_owner(a);

    assert_eq!(limiter.len(), 1);
    assert!(limiter.warn_once(&format!("{a}:unknown-group:wings")));
    assert!(!limiter.warn_once(&format!("{b}:unknown-group:wings")));
}
