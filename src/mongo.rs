//! Cursor queries backed by a MongoDB collection.
use anyhow::Result;
use mongodb::bson::Document;
use mongodb::options::FindOptions;
use mongodb::sync::Collection;
use serde::de::DeserializeOwned;
use slog::debug;
use slog::Logger;

use crate::conf::Conf;
use crate::projection::Model;
use crate::projection::Projection;
use crate::projection::RawDocument;
use crate::query::CursorQuery;
use crate::source::BoxedSource;
use crate::source::DriverCursor;
use crate::telemetry::CURSOR_OPEN_COUNT;
use crate::telemetry::CURSOR_OPEN_ERR;

/// Perform a [`find`] operation when a cursor is requested.
///
/// [`find`]: https://docs.mongodb.com/manual/reference/method/db.collection.find/
pub struct FindQuery<P = RawDocument> {
    batch_size: Option<u32>,
    collection: Collection<Document>,
    filter: Document,
    limit: Option<i64>,
    logger: Logger,
    projection: P,
    skip: Option<u64>,
    sort: Option<Document>,
}

impl FindQuery<RawDocument> {
    /// Find raw documents in `collection` that match `filter`.
    pub fn new(collection: Collection<Document>, filter: Document, logger: Logger) -> Self {
        FindQuery {
            batch_size: None,
            collection,
            filter,
            limit: None,
            logger,
            projection: RawDocument,
            skip: None,
            sort: None,
        }
    }

    /// Find raw documents with options taken from the configuration.
    pub fn with_conf(
        collection: Collection<Document>,
        filter: Document,
        conf: &Conf,
        logger: Logger,
    ) -> Self {
        let mut query = FindQuery::new(collection, filter, logger);
        query.batch_size = conf.batch_size;
        query
    }
}

impl<P: Projection> FindQuery<P> {
    /// Number of documents the server returns per batch.
    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Maximum number of documents the server returns.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Convert found documents into the `M` model.
    pub fn project<M: DeserializeOwned>(self) -> FindQuery<Model<M>> {
        FindQuery {
            batch_size: self.batch_size,
            collection: self.collection,
            filter: self.filter,
            limit: self.limit,
            logger: self.logger,
            projection: Model::new(),
            skip: self.skip,
            sort: self.sort,
        }
    }

    /// Number of matching documents the server skips.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Order of returned documents.
    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    fn namespace(&self) -> String {
        let namespace = self.collection.namespace();
        format!("{}.{}", namespace.db, namespace.coll)
    }

    pub(crate) fn options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        options.batch_size = self.batch_size;
        options.limit = self.limit;
        options.skip = self.skip;
        options.sort = self.sort.clone();
        options
    }
}

impl<P: Projection> CursorQuery for FindQuery<P> {
    type Projection = P;

    fn projection_model(&self) -> &P {
        &self.projection
    }

    fn open_cursor(&self) -> Result<Option<BoxedSource>> {
        let namespace = self.namespace();
        debug!(
            self.logger, "Opening MongoDB find cursor";
            "namespace" => %namespace,
            "filter" => %self.filter
        );
        CURSOR_OPEN_COUNT.with_label_values(&[namespace.as_str()]).inc();
        let cursor = self
            .collection
            .find(self.filter.clone(), self.options())
            .map_err(|error| {
                CURSOR_OPEN_ERR.with_label_values(&[namespace.as_str()]).inc();
                error
            })?;
        let cursor = DriverCursor::new(cursor, namespace);
        Ok(Some(Box::new(cursor)))
    }

    fn cache_key(&self) -> Option<String> {
        let sort = self
            .sort
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let key = format!(
            "{}|filter={}|sort={}|skip={:?}|limit={:?}",
            self.namespace(),
            self.filter,
            sort,
            self.skip,
            self.limit,
        );
        Some(key)
    }
}
