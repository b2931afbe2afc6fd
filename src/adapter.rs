use anyhow::Context;
use anyhow::Result;
use mongodb::bson::Document;
use slog::debug;
use slog::warn;
use slog::Logger;

use crate::cache::QueryCache;
use crate::errors::StateError;
use crate::errors::ValidationError;
use crate::projection::Projection;
use crate::query::CursorQuery;
use crate::query::Output;
use crate::source::BoxedSource;
use crate::telemetry::CACHE_HITS;

/// Iteration state of a [`CursorAdapter`].
enum CursorState {
    NotStarted,
    Iterating(BoxedSource),
}

/// Iterate the cursor of a query and convert raw documents with its projection model.
///
/// Adapters offer two ways to consume results:
///
///   * Incrementally, with [`CursorAdapter::begin`] and [`CursorAdapter::advance`]
///     (or the [`CursorAdapter::iter`] wrapper).
///   * In bulk, with [`CursorAdapter::materialize`] and [`CursorAdapter::run`].
///
/// Bulk results are cached by the adapter after the first fetch so repeated calls
/// do not query the database again.
/// Adapters given a shared [`QueryCache`] also reuse results across instances.
pub struct CursorAdapter<Q: CursorQuery> {
    cache: Option<Vec<Document>>,
    logger: Logger,
    query: Q,
    shared_cache: Option<QueryCache>,
    state: CursorState,
}

impl<Q: CursorQuery> CursorAdapter<Q> {
    pub fn new(query: Q, logger: Logger) -> CursorAdapter<Q> {
        CursorAdapter {
            cache: None,
            logger,
            query,
            shared_cache: None,
            state: CursorState::NotStarted,
        }
    }

    /// Look up and store bulk results in the given shared cache.
    pub fn with_cache(mut self, cache: QueryCache) -> CursorAdapter<Q> {
        self.shared_cache = Some(cache);
        self
    }

    /// Request the next result from the cursor.
    ///
    /// # Return
    ///
    ///  * `Err(error)` if iteration was not started, the fetch failed or conversion failed.
    ///  * `Ok(None)` once the cursor is exhausted.
    ///  * `Ok(Some(result))` with the next converted result.
    pub fn advance(&mut self) -> Result<Option<Output<Q>>> {
        let cursor = match &mut self.state {
            CursorState::NotStarted => anyhow::bail!(StateError::NotStarted),
            CursorState::Iterating(cursor) => cursor,
        };
        let document = match cursor.next_document()? {
            None => return Ok(None),
            Some(document) => document,
        };
        let result = convert(&self.logger, self.query.projection_model(), document)?;
        Ok(Some(result))
    }

    /// Obtain the cursor to iterate over, if not already held.
    pub fn begin(&mut self) -> Result<()> {
        if let CursorState::Iterating(_) = self.state {
            return Ok(());
        }
        let cursor = self.open_cursor()?;
        debug!(self.logger, "Cursor iteration started");
        self.state = CursorState::Iterating(cursor);
        Ok(())
    }

    /// True once the adapter holds a cursor to iterate over.
    pub fn is_started(&self) -> bool {
        matches!(self.state, CursorState::Iterating(_))
    }

    /// Begin iteration and return an iterator over the remaining results.
    pub fn iter(&mut self) -> Result<Iter<'_, Q>> {
        self.begin()?;
        Ok(Iter { adapter: self })
    }

    /// Return up to `limit` results, or all of them if `limit` is `None`.
    ///
    /// The first call drains a freshly opened cursor, truncates the raw documents
    /// to `limit` and caches them.
    /// Later calls convert the cached documents instead of querying again,
    /// so the `limit` they are called with is ignored.
    pub fn materialize(&mut self, limit: Option<usize>) -> Result<Vec<Output<Q>>> {
        if self.cache.is_none() {
            let mut documents = self.fetch_all()?;
            if let Some(limit) = limit {
                documents.truncate(limit);
            }
            self.cache = Some(documents);
        } else {
            CACHE_HITS.with_label_values(&["adapter"]).inc();
            debug!(self.logger, "Reusing cached cursor results");
        }

        let cached = self.cache.as_deref().unwrap_or_default();
        let projection = self.query.projection_model();
        cached
            .iter()
            .cloned()
            .map(|document| convert(&self.logger, projection, document))
            .collect()
    }

    /// Access the query wrapped by this adapter.
    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Return all results.
    pub fn run(&mut self) -> Result<Vec<Output<Q>>> {
        self.materialize(None)
    }

    /// Fetch all raw documents, from the shared cache if possible.
    fn fetch_all(&mut self) -> Result<Vec<Document>> {
        let key = match &self.shared_cache {
            None => None,
            Some(_) => self.query.cache_key(),
        };
        if let (Some(cache), Some(key)) = (&self.shared_cache, &key) {
            if let Some(documents) = cache.get(key) {
                CACHE_HITS.with_label_values(&["shared"]).inc();
                debug!(self.logger, "Reusing shared cache results"; "key" => %key);
                return Ok(documents);
            }
        }

        let mut cursor = self.open_cursor()?;
        let documents = cursor.fetch_all()?;
        debug!(self.logger, "Cursor drained"; "documents" => documents.len());
        if let (Some(cache), Some(key)) = (&self.shared_cache, key) {
            cache.set(key, documents.clone());
        }
        Ok(documents)
    }

    fn open_cursor(&self) -> Result<BoxedSource> {
        self.query
            .open_cursor()
            .context(StateError::CursorUnavailable)?
            .ok_or_else(|| anyhow::anyhow!(StateError::CursorUnavailable))
    }
}

/// Iterator over the results of a [`CursorAdapter`].
pub struct Iter<'a, Q: CursorQuery> {
    adapter: &'a mut CursorAdapter<Q>,
}

impl<'a, Q: CursorQuery> Iterator for Iter<'a, Q> {
    type Item = Result<Output<Q>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.adapter.advance().transpose()
    }
}

/// Apply the projection model to a raw document, logging validation failures.
fn convert<P: Projection>(
    logger: &Logger,
    projection: &P,
    document: Document,
) -> Result<P::Output> {
    projection.convert(document).map_err(|error| {
        if let Some(invalid) = error.downcast_ref::<ValidationError>() {
            warn!(
                logger, "Document does not match the projection model";
                "document_id" => %invalid.document_id,
                "fields" => ?invalid.fields,
                "model" => invalid.model
            );
        }
        error
    })
}
