use mongodb::bson::doc;
use mongodb::bson::Document;
use serde::Deserialize;
use slog::o;
use slog::Logger;

mod adapter;
mod cache;

/// Model the sample documents project onto.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Point {
    pub x: i32,
}

pub fn logger() -> Logger {
    Logger::root(slog::Discard, o!())
}

pub fn points() -> Vec<Document> {
    vec![doc! {"x": 1}, doc! {"x": 2}, doc! {"x": 3}]
}
