//! Synchronous adapter over MongoDB cursors with optional typed projections.
//!
//! A [`CursorAdapter`] wraps a [`CursorQuery`], which knows how to open a cursor
//! and which [`Projection`] converts its raw documents.
//! Results can then be pulled one at a time or materialized in bulk:
//!
//! ```ignore
//! let query = FindQuery::new(collection, doc! {"kind": "book"}, logger.clone())
//!     .sort(doc! {"title": 1})
//!     .project::<Book>();
//! let mut adapter = CursorAdapter::new(query, logger);
//! let books: Vec<Book> = adapter.materialize(Some(10))?;
//! ```
//!
//! ## Caching
//!
//! Bulk results are cached by each adapter: repeated calls to [`CursorAdapter::materialize`]
//! do not open new cursors.
//! Queries that provide a [`CursorQuery::cache_key`] can also share results across adapters
//! through a [`QueryCache`].
mod adapter;
mod cache;
mod conf;
mod errors;
mod mongo;
mod projection;
mod query;
mod source;

pub mod logging;
#[cfg(any(test, feature = "test-fixture"))]
pub mod mock;
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use self::adapter::CursorAdapter;
pub use self::adapter::Iter;
pub use self::cache::QueryCache;
pub use self::conf::CacheConf;
pub use self::conf::Conf;
pub use self::conf::ConfError;
pub use self::conf::MongoDBConf;
pub use self::errors::CursorFetchError;
pub use self::errors::StateError;
pub use self::errors::ValidationError;
pub use self::mongo::FindQuery;
pub use self::projection::document_id;
pub use self::projection::Model;
pub use self::projection::Projection;
pub use self::projection::RawDocument;
pub use self::query::CursorQuery;
pub use self::query::Output;
pub use self::source::BoxedSource;
pub use self::source::DocumentSource;
pub use self::source::DriverCursor;
