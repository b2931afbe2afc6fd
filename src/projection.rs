//! Conversion of raw documents into the results returned by cursor adapters.
use std::marker::PhantomData;

use anyhow::Result;
use mongodb::bson::Bson;
use mongodb::bson::Document;
use serde::de::DeserializeOwned;

use crate::errors::ValidationError;
use crate::telemetry::VALIDATION_ERRORS;

/// Converts raw documents into adapter results.
pub trait Projection {
    /// Type of the converted results.
    type Output;

    /// Name of the model documents are converted into, `None` for raw documents.
    fn model_name(&self) -> Option<&'static str>;

    /// Convert a raw document, failing with a [`ValidationError`] if it does not fit the model.
    fn convert(&self, document: Document) -> Result<Self::Output>;
}

/// No projection model: raw documents are returned unchanged.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RawDocument;

impl Projection for RawDocument {
    type Output = Document;

    fn model_name(&self) -> Option<&'static str> {
        None
    }

    fn convert(&self, document: Document) -> Result<Document> {
        Ok(document)
    }
}

/// Project raw documents onto the `T` model by deserializing them.
pub struct Model<T> {
    model: PhantomData<fn() -> T>,
}

impl<T> Model<T> {
    pub fn new() -> Model<T> {
        Model { model: PhantomData }
    }
}

impl<T> Clone for Model<T> {
    fn clone(&self) -> Self {
        Model::new()
    }
}

impl<T> Default for Model<T> {
    fn default() -> Self {
        Model::new()
    }
}

impl<T> std::fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Model")
            .field(&std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Projection for Model<T>
where
    T: DeserializeOwned,
{
    type Output = T;

    fn model_name(&self) -> Option<&'static str> {
        Some(std::any::type_name::<T>())
    }

    fn convert(&self, document: Document) -> Result<T> {
        let id = document_id(&document);
        let deserializer = mongodb::bson::Deserializer::new(Bson::Document(document));
        serde_path_to_error::deserialize::<_, T>(deserializer).map_err(|error| {
            VALIDATION_ERRORS.inc();
            let model = std::any::type_name::<T>();
            let path = error.path().to_string();
            let reason = error.into_inner().to_string();
            anyhow::Error::from(ValidationError::new(model, id, &path, reason))
        })
    }
}

/// Identify a document for error reporting.
pub fn document_id(document: &Document) -> String {
    match document.get("_id") {
        Some(Bson::ObjectId(id)) => id.to_hex(),
        Some(Bson::String(id)) => id.clone(),
        Some(id) => id.to_string(),
        None => "<NO ID>".into(),
    }
}
