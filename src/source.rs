//! Raw document sources backing cursor adapters.
use anyhow::Context;
use anyhow::Result;
use mongodb::bson::Document;

use crate::errors::CursorFetchError;
use crate::telemetry::DOCUMENTS_FETCHED;

/// Boxed [`DocumentSource`] handed out by queries.
pub type BoxedSource = Box<dyn DocumentSource>;

/// Incremental and bulk access to the documents of an open cursor.
pub trait DocumentSource {
    /// Fetch the next raw document, or `None` once the cursor is exhausted.
    fn next_document(&mut self) -> Result<Option<Document>>;

    /// Fetch all remaining documents in cursor order.
    fn fetch_all(&mut self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        while let Some(document) = self.next_document()? {
            documents.push(document);
        }
        Ok(documents)
    }
}

/// [`DocumentSource`] over a MongoDB sync cursor.
pub struct DriverCursor {
    cursor: mongodb::sync::Cursor<Document>,
    namespace: String,
}

impl DriverCursor {
    pub fn new<S: Into<String>>(cursor: mongodb::sync::Cursor<Document>, namespace: S) -> Self {
        DriverCursor {
            cursor,
            namespace: namespace.into(),
        }
    }
}

impl DocumentSource for DriverCursor {
    fn next_document(&mut self) -> Result<Option<Document>> {
        let document = match self.cursor.next() {
            None => return Ok(None),
            Some(document) => document.context(CursorFetchError)?,
        };
        DOCUMENTS_FETCHED
            .with_label_values(&[self.namespace.as_str()])
            .inc();
        Ok(Some(document))
    }
}
