use mongodb::bson::doc;

use super::points;
use crate::CacheConf;
use crate::ConfError;
use crate::QueryCache;

fn conf(capacity: usize) -> CacheConf {
    CacheConf {
        capacity,
        enabled: true,
        expiration: 60,
    }
}

#[test]
fn get_missing_key() {
    let cache = QueryCache::new(&conf(4)).unwrap();
    assert_eq!(cache.get("missing"), None);
}

#[test]
fn set_then_get() {
    let cache = QueryCache::new(&conf(4)).unwrap();
    cache.set("points".into(), points());
    assert_eq!(cache.get("points"), Some(points()));
}

#[test]
fn clones_share_entries() {
    let cache = QueryCache::new(&conf(4)).unwrap();
    let other = cache.clone();
    other.set("points".into(), points());
    assert_eq!(cache.len(), 1);
}

#[test]
fn evicts_least_recently_used() {
    let cache = QueryCache::new(&conf(2)).unwrap();
    cache.set("a".into(), vec![doc! {"x": 1}]);
    cache.set("b".into(), vec![doc! {"x": 2}]);
    assert!(cache.get("a").is_some());
    cache.set("c".into(), vec![doc! {"x": 3}]);
    assert!(cache.get("a").is_some());
    assert_eq!(cache.get("b"), None);
    assert!(cache.get("c").is_some());
}

#[test]
fn clear_entries() {
    let cache = QueryCache::new(&conf(4)).unwrap();
    cache.set("points".into(), points());
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.get("points"), None);
}

#[test]
fn zero_capacity_is_rejected() {
    let error = QueryCache::new(&conf(0)).unwrap_err();
    match error.downcast_ref::<ConfError>() {
        Some(ConfError::CacheCapacity) => (),
        other => panic!("unexpected error: {:?}", other),
    }
}
