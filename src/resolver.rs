//! Content resolver - maps a URL slug to a lesson or a not-found failure

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::content::{Body, ContentRegistry, Metadata};

/// The only way a resolution can fail
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("No document for slug `{slug}`")]
    NotFound { slug: String },
}

/// A successfully resolved document
#[derive(Debug, Clone, Serialize)]
pub struct Resolved {
    pub slug: String,
    /// The request path exactly as it was passed in
    pub request_path: String,
    pub metadata: Metadata,
    #[serde(skip)]
    pub body: Arc<Body>,
    /// File the document was loaded from
    pub source: PathBuf,
}

/// Resolves slugs against a fixed registry
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<ContentRegistry>,
}

impl Resolver {
    pub fn new(registry: Arc<ContentRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    /// Resolve `slug` verbatim; `request_path` is carried through untouched
    pub fn resolve(&self, slug: &str, request_path: &str) -> Result<Resolved, ResolveError> {
        match self.registry.get(slug) {
            Some(document) => Ok(Resolved {
                slug: document.slug.clone(),
                request_path: request_path.to_string(),
                metadata: document.metadata.clone(),
                body: Arc::clone(&document.body),
                source: document.source.clone(),
            }),
            None => {
                tracing::debug!(slug, request_path, "No document found");
                Err(ResolveError::NotFound {
                    slug: slug.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Document, MarkdownRenderer};
    use chrono::{Local, TimeZone};
    use std::path::PathBuf;

    fn document(slug: &str, title: &str, description: &str) -> Document {
        let renderer = MarkdownRenderer::new();
        Document::new(
            slug.to_string(),
            Metadata {
                title: title.to_string(),
                description: description.to_string(),
                modified: Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
                published: None,
            },
            renderer.render("Lesson body."),
            PathBuf::from(format!("content/{}.md", slug)),
        )
    }

    fn resolver() -> Resolver {
        let registry = ContentRegistry::from_documents(vec![
            document("the-basics", "The Basics", "Start here"),
            document("mocks", "Mocks", "Test doubles in Vitest"),
        ])
        .unwrap();
        Resolver::new(Arc::new(registry))
    }

    #[test]
    fn test_resolve_existing_slug() {
        let resolved = resolver().resolve("the-basics", "/the-basics").unwrap();
        assert_eq!(resolved.slug, "the-basics");
        assert_eq!(resolved.metadata.title, "The Basics");
        assert!(resolved.body.html.contains("Lesson body."));
    }

    #[test]
    fn test_resolve_missing_slug() {
        let err = resolver()
            .resolve("does-not-exist", "/does-not-exist")
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotFound {
                slug: "does-not-exist".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_is_exact_match() {
        let resolver = resolver();
        assert!(resolver.resolve("Mocks", "/Mocks").is_err());
        assert!(resolver.resolve("mocks/", "/mocks/").is_err());
        assert!(resolver.resolve("", "/").is_err());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let resolver = resolver();
        let first = resolver.resolve("mocks", "/mocks").unwrap();
        let second = resolver.resolve("mocks", "/mocks").unwrap();
        assert_eq!(first.metadata, second.metadata);
        assert_eq!(first.body, second.body);
        assert!(!first.metadata.description.is_empty());
    }

    #[test]
    fn test_request_path_is_unmodified() {
        let resolved = resolver()
            .resolve("mocks", "/course//mocks/?ref=Nav")
            .unwrap();
        assert_eq!(resolved.request_path, "/course//mocks/?ref=Nav");
    }
}
