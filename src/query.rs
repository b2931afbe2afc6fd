use anyhow::Result;

use crate::projection::Projection;
use crate::source::BoxedSource;

/// Capabilities every query wrapped by a [`CursorAdapter`] must provide.
///
/// [`CursorAdapter`]: crate::CursorAdapter
pub trait CursorQuery {
    /// Projection applied to every raw document returned by the query.
    type Projection: Projection;

    /// Projection model results are converted with.
    fn projection_model(&self) -> &Self::Projection;

    /// Open a cursor over the query results.
    ///
    /// # Return
    ///
    ///  * `Err(error)` if the cursor could not be opened.
    ///  * `Ok(None)` if the query has no cursor to offer.
    ///  * `Ok(Some(cursor))` if a cursor was opened.
    fn open_cursor(&self) -> Result<Option<BoxedSource>>;

    /// Key identifying the query results in a shared [`QueryCache`].
    ///
    /// Queries that return `None` are never cached across adapters.
    ///
    /// [`QueryCache`]: crate::QueryCache
    fn cache_key(&self) -> Option<String> {
        None
    }
}

/// Type of the results produced by adapters over the `Q` query.
pub type Output<Q> = <<Q as CursorQuery>::Projection as Projection>::Output;
