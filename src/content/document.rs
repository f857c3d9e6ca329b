//! Lesson document model

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use super::TocEntry;

/// Metadata shown in page headers and SEO tags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    /// Last modification time
    pub modified: DateTime<Local>,
    /// First publication time, if the lesson declares one
    pub published: Option<DateTime<Local>>,
}

/// Renderable body of a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Body {
    /// Markdown source without front-matter
    pub raw: String,
    /// Rendered HTML
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// A single published lesson
#[derive(Debug, Clone)]
pub struct Document {
    /// Lookup key, the file stem of `source`
    pub slug: String,
    pub metadata: Metadata,
    pub body: Arc<Body>,
    /// File the document was loaded from
    pub source: PathBuf,
}

impl Document {
    pub fn new(slug: String, metadata: Metadata, body: Body, source: PathBuf) -> Self {
        Self {
            slug,
            metadata,
            body: Arc::new(body),
            source,
        }
    }
}
