//! In-memory queries and cursors to test code built on cursor adapters.
use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;
use mongodb::bson::Document;
use serde::de::DeserializeOwned;

use crate::projection::Model;
use crate::projection::Projection;
use crate::projection::RawDocument;
use crate::query::CursorQuery;
use crate::source::BoxedSource;
use crate::source::DocumentSource;

/// Counters shared by a [`MockQuery`] and the cursors it opens.
#[derive(Clone, Debug, Default)]
pub struct MockStats {
    fetch_all: Arc<AtomicUsize>,
    next_document: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
}

impl MockStats {
    /// Number of bulk fetches performed on opened cursors.
    pub fn fetch_all_calls(&self) -> usize {
        self.fetch_all.load(Ordering::SeqCst)
    }

    /// Number of incremental fetches performed on opened cursors.
    pub fn next_document_calls(&self) -> usize {
        self.next_document.load(Ordering::SeqCst)
    }

    /// Number of cursors opened by the query.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

/// Query serving a fixed list of documents.
pub struct MockQuery<P = RawDocument> {
    available: bool,
    cache_key: Option<String>,
    documents: Vec<Document>,
    projection: P,
    stats: MockStats,
}

impl MockQuery<RawDocument> {
    pub fn new(documents: Vec<Document>) -> MockQuery<RawDocument> {
        MockQuery {
            available: true,
            cache_key: None,
            documents,
            projection: RawDocument,
            stats: MockStats::default(),
        }
    }
}

impl<P: Projection> MockQuery<P> {
    /// Make the query unable to provide a cursor.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Convert documents into the `M` model.
    pub fn project<M: DeserializeOwned>(self) -> MockQuery<Model<M>> {
        MockQuery {
            available: self.available,
            cache_key: self.cache_key,
            documents: self.documents,
            projection: Model::new(),
            stats: self.stats,
        }
    }

    /// Counters tracking the use of the query and its cursors.
    pub fn stats(&self) -> MockStats {
        self.stats.clone()
    }

    /// Identify the query results in shared caches.
    pub fn with_cache_key<S: Into<String>>(mut self, key: S) -> Self {
        self.cache_key = Some(key.into());
        self
    }
}

impl<P: Projection> CursorQuery for MockQuery<P> {
    type Projection = P;

    fn projection_model(&self) -> &P {
        &self.projection
    }

    fn open_cursor(&self) -> Result<Option<BoxedSource>> {
        if !self.available {
            return Ok(None);
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let source = MockSource {
            documents: self.documents.clone().into(),
            stats: self.stats.clone(),
        };
        Ok(Some(Box::new(source)))
    }

    fn cache_key(&self) -> Option<String> {
        self.cache_key.clone()
    }
}

/// Cursor over an in-memory list of documents.
pub struct MockSource {
    documents: VecDeque<Document>,
    stats: MockStats,
}

impl DocumentSource for MockSource {
    fn next_document(&mut self) -> Result<Option<Document>> {
        self.stats.next_document.fetch_add(1, Ordering::SeqCst);
        Ok(self.documents.pop_front())
    }

    fn fetch_all(&mut self) -> Result<Vec<Document>> {
        self.stats.fetch_all.fetch_add(1, Ordering::SeqCst);
        Ok(self.documents.drain(..).collect())
    }
}
