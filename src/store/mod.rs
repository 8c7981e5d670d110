//! Content store seam.
//!
//! A store hands back untyped entries for one collection. Decoding the front
//! matter into a schema happens here, one `Result` per record, so a single bad
//! file is skipped (and reported) instead of failing a whole listing.

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

use crate::model::{ContentKind, Entry, Schema};

pub mod fs;

pub use fs::FsStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("content loader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("content store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Entry as produced by a store, before schema validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub id: String,
    pub slug: String,
    pub course_id: Option<String>,
    pub section_id: Option<String>,
    pub body: String,
    /// Parsed front matter, or why it could not be parsed.
    pub front_matter: std::result::Result<serde_yaml::Value, String>,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Load every entry of one collection, in store order.
    async fn load(&self, kind: ContentKind) -> Result<Vec<RawEntry>>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unreadable front matter: {0}")]
    FrontMatter(String),
    #[error("front matter does not match the {kind} schema: {message}")]
    Schema { kind: &'static str, message: String },
    #[error("order must be a positive integer")]
    NonPositiveOrder,
    #[error("{0} has no owning course")]
    MissingCourse(&'static str),
    #[error("lesson has no owning section")]
    MissingSection,
}

/// A record that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub kind: ContentKind,
    pub slug: String,
    pub reason: String,
}

/// Result of a typed query: the valid records and what was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<D> {
    pub records: Vec<Entry<D>>,
    pub skipped: Vec<Skipped>,
}

/// Decode one raw entry into its typed form.
pub fn decode<D: Schema>(raw: RawEntry) -> std::result::Result<Entry<D>, ValidationError> {
    let value = raw.front_matter.map_err(ValidationError::FrontMatter)?;
    let data: D = serde_yaml::from_value(value).map_err(|e| ValidationError::Schema {
        kind: D::KIND.as_str(),
        message: e.to_string(),
    })?;

    if data.order() == Some(0) {
        return Err(ValidationError::NonPositiveOrder);
    }
    match D::KIND {
        ContentKind::Section if raw.course_id.is_none() => {
            return Err(ValidationError::MissingCourse("section"));
        }
        ContentKind::Lesson if raw.course_id.is_none() => {
            return Err(ValidationError::MissingCourse("lesson"));
        }
        ContentKind::Lesson if raw.section_id.is_none() => {
            return Err(ValidationError::MissingSection);
        }
        _ => {}
    }

    Ok(Entry {
        id: raw.id,
        slug: raw.slug,
        course_id: raw.course_id,
        section_id: raw.section_id,
        body: raw.body,
        data,
    })
}

/// Load a collection, validate every entry, and keep the ones matching `predicate`.
///
/// Invalid records never reach the predicate; each one is logged and listed in
/// [`Loaded::skipped`]. Store failures propagate.
pub async fn query<D, F>(store: &dyn ContentStore, predicate: F) -> Result<Loaded<D>>
where
    D: Schema,
    F: Fn(&Entry<D>) -> bool,
{
    let raw = store.load(D::KIND).await?;
    let mut records = Vec::with_capacity(raw.len());
    let mut skipped = Vec::new();
    for entry in raw {
        let slug = entry.slug.clone();
        match decode::<D>(entry) {
            Ok(record) => {
                if predicate(&record) {
                    records.push(record);
                }
            }
            Err(err) => {
                warn!(kind = D::KIND.as_str(), %slug, error = %err, "skipping invalid content");
                skipped.push(Skipped {
                    kind: D::KIND,
                    slug,
                    reason: err.to_string(),
                });
            }
        }
    }
    Ok(Loaded { records, skipped })
}
