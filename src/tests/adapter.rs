use anyhow::Result;
use mongodb::bson::doc;

use super::logger;
use super::points;
use super::Point;
use crate::mock::MockQuery;
use crate::BoxedSource;
use crate::CursorAdapter;
use crate::CursorQuery;
use crate::QueryCache;
use crate::RawDocument;
use crate::StateError;
use crate::ValidationError;

#[test]
fn materialize_raw_documents() {
    let mut adapter = CursorAdapter::new(MockQuery::new(points()), logger());
    let results = adapter.materialize(None).unwrap();
    assert_eq!(results, points());
}

#[test]
fn materialize_with_model() {
    let query = MockQuery::new(points()).project::<Point>();
    let mut adapter = CursorAdapter::new(query, logger());
    let results = adapter.materialize(None).unwrap();
    assert_eq!(
        results,
        vec![Point { x: 1 }, Point { x: 2 }, Point { x: 3 }],
    );
}

#[test]
fn materialize_limits() {
    let expected = vec![
        (Some(0), Vec::new()),
        (Some(2), points()[..2].to_vec()),
        (Some(3), points()),
        (Some(10), points()),
    ];
    for (limit, documents) in expected {
        let mut adapter = CursorAdapter::new(MockQuery::new(points()), logger());
        assert_eq!(adapter.materialize(limit).unwrap(), documents);
    }
}

#[test]
fn materialize_example_documents() {
    let documents = vec![doc! {"x": 1}, doc! {"x": 2}];
    let mut adapter = CursorAdapter::new(MockQuery::new(documents.clone()), logger());
    assert_eq!(adapter.materialize(None).unwrap(), documents);
    let mut adapter = CursorAdapter::new(MockQuery::new(documents), logger());
    assert_eq!(adapter.materialize(Some(1)).unwrap(), vec![doc! {"x": 1}]);
}

#[test]
fn materialize_caches_truncated_results() {
    let query = MockQuery::new(points());
    let stats = query.stats();
    let mut adapter = CursorAdapter::new(query, logger());
    assert_eq!(adapter.materialize(Some(1)).unwrap(), vec![doc! {"x": 1}]);
    assert_eq!(adapter.materialize(None).unwrap(), vec![doc! {"x": 1}]);
    assert_eq!(adapter.materialize(Some(3)).unwrap(), vec![doc! {"x": 1}]);
    assert_eq!(stats.opened(), 1);
    assert_eq!(stats.fetch_all_calls(), 1);
}

#[test]
fn materialize_warm_cache_ignores_smaller_limit() {
    let mut adapter = CursorAdapter::new(MockQuery::new(points()), logger());
    assert_eq!(adapter.materialize(None).unwrap(), points());
    assert_eq!(adapter.materialize(Some(1)).unwrap(), points());
}

#[test]
fn materialize_reuses_cache() {
    let query = MockQuery::new(points()).project::<Point>();
    let stats = query.stats();
    let mut adapter = CursorAdapter::new(query, logger());
    let first = adapter.materialize(None).unwrap();
    let second = adapter.run().unwrap();
    assert_eq!(first, second);
    assert_eq!(stats.opened(), 1);
    assert_eq!(stats.fetch_all_calls(), 1);
}

#[test]
fn materialize_cursor_unavailable() {
    let query = MockQuery::new(points()).unavailable();
    let mut adapter = CursorAdapter::new(query, logger());
    let error = adapter.materialize(None).unwrap_err();
    match error.downcast_ref::<StateError>() {
        Some(StateError::CursorUnavailable) => (),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn materialize_invalid_document() {
    let documents = vec![doc! {"x": 1}, doc! {"y": 2}];
    let query = MockQuery::new(documents).project::<Point>();
    let stats = query.stats();
    let mut adapter = CursorAdapter::new(query, logger());
    let error = adapter.materialize(None).unwrap_err();
    let invalid = error
        .downcast_ref::<ValidationError>()
        .expect("expected a ValidationError");
    assert_eq!(invalid.fields, vec!["x".to_string()]);
    assert_eq!(invalid.document_id, "<NO ID>");

    // Raw documents stay cached and fail conversion again.
    assert!(adapter.materialize(None).unwrap_err().is::<ValidationError>());
    assert_eq!(stats.opened(), 1);
}

#[test]
fn materialize_invalid_document_beyond_limit() {
    let documents = vec![doc! {"x": 1}, doc! {"y": 2}];
    let query = MockQuery::new(documents).project::<Point>();
    let mut adapter = CursorAdapter::new(query, logger());
    let results = adapter.materialize(Some(1)).unwrap();
    assert_eq!(results, vec![Point { x: 1 }]);
}

#[test]
fn advance_before_begin() {
    let mut adapter = CursorAdapter::new(MockQuery::new(points()), logger());
    let error = adapter.advance().unwrap_err();
    match error.downcast_ref::<StateError>() {
        Some(StateError::NotStarted) => (),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn advance_until_exhausted() {
    let documents = vec![doc! {"x": 1}, doc! {"x": 2}];
    let mut adapter = CursorAdapter::new(MockQuery::new(documents), logger());
    adapter.begin().unwrap();
    assert_eq!(adapter.advance().unwrap(), Some(doc! {"x": 1}));
    assert_eq!(adapter.advance().unwrap(), Some(doc! {"x": 2}));
    assert_eq!(adapter.advance().unwrap(), None);
}

#[test]
fn advance_with_model() {
    let query = MockQuery::new(points()).project::<Point>();
    let mut adapter = CursorAdapter::new(query, logger());
    adapter.begin().unwrap();
    assert_eq!(adapter.advance().unwrap(), Some(Point { x: 1 }));
}

#[test]
fn advance_invalid_document() {
    let query = MockQuery::new(vec![doc! {"_id": "p1", "x": "one"}]).project::<Point>();
    let mut adapter = CursorAdapter::new(query, logger());
    adapter.begin().unwrap();
    let error = adapter.advance().unwrap_err();
    let invalid = error
        .downcast_ref::<ValidationError>()
        .expect("expected a ValidationError");
    assert_eq!(invalid.document_id, "p1");
    assert_eq!(invalid.fields, vec!["x".to_string()]);
    assert!(invalid.model.ends_with("Point"));
}

#[test]
fn advance_missing_field() {
    let query = MockQuery::new(vec![doc! {"y": 2}]).project::<Point>();
    let mut adapter = CursorAdapter::new(query, logger());
    adapter.begin().unwrap();
    let error = adapter.advance().unwrap_err();
    let invalid = error
        .downcast_ref::<ValidationError>()
        .expect("expected a ValidationError");
    assert_eq!(invalid.fields, vec!["x".to_string()]);
    assert!(invalid.reason.contains("missing field"));
}

#[test]
fn begin_is_idempotent() {
    let query = MockQuery::new(points());
    let stats = query.stats();
    let mut adapter = CursorAdapter::new(query, logger());
    assert!(!adapter.is_started());
    adapter.begin().unwrap();
    adapter.begin().unwrap();
    assert!(adapter.is_started());
    assert_eq!(stats.opened(), 1);
}

#[test]
fn begin_cursor_unavailable() {
    let query = MockQuery::new(points()).unavailable();
    let mut adapter = CursorAdapter::new(query, logger());
    let error = adapter.begin().unwrap_err();
    assert!(error.is::<StateError>());
    assert!(!adapter.is_started());
}

#[test]
fn begin_open_failure() {
    struct FailingQuery;
    impl CursorQuery for FailingQuery {
        type Projection = RawDocument;
        fn projection_model(&self) -> &RawDocument {
            &RawDocument
        }
        fn open_cursor(&self) -> Result<Option<BoxedSource>> {
            anyhow::bail!("connection refused")
        }
    }

    let mut adapter = CursorAdapter::new(FailingQuery, logger());
    let error = adapter.begin().unwrap_err();
    match error.downcast_ref::<StateError>() {
        Some(StateError::CursorUnavailable) => (),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(error.root_cause().to_string(), "connection refused");
}

#[test]
fn iter_results() {
    let query = MockQuery::new(points()).project::<Point>();
    let mut adapter = CursorAdapter::new(query, logger());
    let results: Vec<Point> = adapter
        .iter()
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(
        results,
        vec![Point { x: 1 }, Point { x: 2 }, Point { x: 3 }],
    );
}

#[test]
fn iteration_and_materialize_are_independent() {
    let query = MockQuery::new(points());
    let stats = query.stats();
    let mut adapter = CursorAdapter::new(query, logger());
    adapter.begin().unwrap();
    adapter.advance().unwrap();
    assert_eq!(adapter.materialize(None).unwrap(), points());
    assert_eq!(adapter.advance().unwrap(), Some(doc! {"x": 2}));
    assert_eq!(stats.opened(), 2);
}

#[test]
fn shared_cache_across_adapters() {
    let cache = QueryCache::new(&Default::default()).unwrap();
    let first = MockQuery::new(points()).with_cache_key("points");
    let first_stats = first.stats();
    let second = MockQuery::new(points()).with_cache_key("points");
    let second_stats = second.stats();

    let mut adapter = CursorAdapter::new(first, logger()).with_cache(cache.clone());
    assert_eq!(adapter.run().unwrap(), points());
    let mut adapter = CursorAdapter::new(second, logger()).with_cache(cache.clone());
    assert_eq!(adapter.run().unwrap(), points());

    assert_eq!(first_stats.opened(), 1);
    assert_eq!(second_stats.opened(), 0);
    assert_eq!(cache.len(), 1);
}

#[test]
fn shared_cache_needs_key() {
    let cache = QueryCache::new(&Default::default()).unwrap();
    let query = MockQuery::new(points());
    let stats = query.stats();
    let mut adapter = CursorAdapter::new(query, logger()).with_cache(cache.clone());
    adapter.run().unwrap();
    assert_eq!(stats.opened(), 1);
    assert!(cache.is_empty());
}
