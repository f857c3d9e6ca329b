//! Content registry - the slug to document map built from the content directory

use chrono::Local;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::{Document, FrontMatter, MarkdownRenderer, Metadata};

/// Errors raised while building the registry
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid front-matter in {path:?}: {message}")]
    FrontMatter { path: PathBuf, message: String },

    #[error("{path:?} has no `{field}` in its front-matter")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("Duplicate slug `{slug}`: {first:?} and {second:?}")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Immutable slug to document map
#[derive(Debug, Default)]
pub struct ContentRegistry {
    documents: HashMap<String, Arc<Document>>,
    /// Slugs ordered by modification date, newest first
    order: Vec<String>,
}

impl ContentRegistry {
    /// Load every lesson directly inside `dir`
    pub fn load(
        dir: &Path,
        renderer: &MarkdownRenderer,
        include_drafts: bool,
    ) -> Result<Self, LoadError> {
        if !dir.exists() {
            tracing::warn!("Content directory {:?} does not exist", dir);
            return Ok(Self::default());
        }

        let mut documents = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| LoadError::Io {
                path: dir.to_path_buf(),
                source: e.into(),
            })?;
            let path = entry.path();

            if !entry.file_type().is_file() || !is_content_file(path) {
                continue;
            }

            let (document, draft) = load_document(path, renderer)?;
            if draft && !include_drafts {
                tracing::debug!("Skipping draft {:?}", path);
                continue;
            }
            documents.push(document);
        }

        let registry = Self::from_documents(documents)?;
        tracing::info!("Loaded {} documents from {:?}", registry.len(), dir);
        Ok(registry)
    }

    /// Build a registry from already loaded documents
    pub fn from_documents(documents: Vec<Document>) -> Result<Self, LoadError> {
        let mut map: HashMap<String, Arc<Document>> = HashMap::with_capacity(documents.len());

        for document in documents {
            if let Some(existing) = map.get(&document.slug) {
                return Err(LoadError::DuplicateSlug {
                    slug: document.slug.clone(),
                    first: existing.source.clone(),
                    second: document.source,
                });
            }
            map.insert(document.slug.clone(), Arc::new(document));
        }

        let mut order: Vec<String> = map.keys().cloned().collect();
        order.sort_by(|a, b| {
            map[b]
                .metadata
                .modified
                .cmp(&map[a].metadata.modified)
                .then_with(|| a.cmp(b))
        });

        Ok(Self {
            documents: map,
            order,
        })
    }

    /// Look up a document by its exact slug
    pub fn get(&self, slug: &str) -> Option<&Arc<Document>> {
        self.documents.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.documents.contains_key(slug)
    }

    /// Documents ordered by modification date, newest first
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Document>> {
        self.order.iter().map(move |slug| &self.documents[slug])
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Load a single document; returns it with its draft flag
fn load_document(path: &Path, renderer: &MarkdownRenderer) -> Result<(Document, bool), LoadError> {
    let io_err = |source: std::io::Error| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let content = fs::read_to_string(path).map_err(io_err)?;
    let (fm, body) = FrontMatter::parse(&content).map_err(|e| LoadError::FrontMatter {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let title = required(fm.title.as_deref(), path, "title")?;
    let description = required(fm.description.as_deref(), path, "description")?;

    let invalid_date = |e: anyhow::Error| LoadError::FrontMatter {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let published = fm.parse_published().map_err(invalid_date)?;
    let modified = match fm.parse_modified().map_err(invalid_date)? {
        Some(modified) => modified,
        None => fs::metadata(path)
            .map_err(io_err)?
            .modified()
            .map(chrono::DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now()),
    };

    let markdown = if is_mdx(path) {
        MarkdownRenderer::strip_mdx_module_lines(body)
    } else {
        body.to_string()
    };

    let slug = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let metadata = Metadata {
        title,
        description,
        modified,
        published,
    };

    let document = Document::new(slug, metadata, renderer.render(&markdown), path.to_path_buf());
    Ok((document, fm.draft))
}

fn required(value: Option<&str>, path: &Path, field: &'static str) -> Result<String, LoadError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(LoadError::MissingField {
            path: path.to_path_buf(),
            field,
        }),
    }
}

/// Markdown or MDX, excluding partials (`_name.md`) and hidden files
fn is_content_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('_') || n.starts_with('.'))
        .unwrap_or(true);

    let markdown = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "mdx")
        .unwrap_or(false);

    !hidden && markdown
}

fn is_mdx(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("mdx")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn load(dir: &Path) -> Result<ContentRegistry, LoadError> {
        ContentRegistry::load(dir, &MarkdownRenderer::new(), false)
    }

    #[test]
    fn test_load_flat_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "the-basics.md",
            "---\ntitle: The Basics\ndescription: Start here\nmodified: 2024-01-10\n---\n\n# Hello\n",
        );
        write(
            dir.path(),
            "mocks.mdx",
            "---\ntitle: Mocks\ndescription: Test doubles\nmodified: 2024-02-10\n---\nimport X from './x.svelte';\n\nBody\n",
        );
        write(dir.path(), "_partial.md", "---\ntitle: Partial\n---\n");
        write(dir.path(), "notes.txt", "not content");
        write(
            dir.path(),
            "legacy.markdown",
            "---\ntitle: Legacy\ndescription: Old extension\n---\n",
        );
        fs::create_dir(dir.path().join("nested")).unwrap();
        write(
            &dir.path().join("nested"),
            "deep.md",
            "---\ntitle: Deep\ndescription: nested\n---\n",
        );

        let registry = load(dir.path()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("the-basics"));
        assert!(!registry.contains("deep"));
        assert!(!registry.contains("_partial"));
        assert!(!registry.contains("legacy"));

        let mocks = registry.get("mocks").unwrap();
        assert_eq!(mocks.metadata.title, "Mocks");
        assert!(!mocks.body.raw.contains("import X"));
        assert!(mocks.body.html.contains("<p>Body</p>"));

        let order: Vec<_> = registry.iter().map(|d| d.slug.as_str()).collect();
        assert_eq!(order, vec!["mocks", "the-basics"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load(&dir.path().join("missing")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_title_is_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "untitled.md", "---\ndescription: no title\n---\nbody");

        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingField { field: "title", .. }));
    }

    #[test]
    fn test_blank_description_is_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "blank.md", "---\ntitle: Blank\ndescription: \"  \"\n---\nbody");

        let err = load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingField {
                field: "description",
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_slug_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let doc = "---\ntitle: Spies\ndescription: Watching calls\n---\nbody";
        write(dir.path(), "spies.md", doc);
        write(dir.path(), "spies.mdx", doc);

        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateSlug { ref slug, .. } if slug == "spies"));
    }

    #[test]
    fn test_drafts_are_skipped_unless_requested() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "wip.md",
            "---\ntitle: WIP\ndescription: Not yet\ndraft: true\n---\nbody",
        );

        assert!(load(dir.path()).unwrap().is_empty());
        let with_drafts =
            ContentRegistry::load(dir.path(), &MarkdownRenderer::new(), true).unwrap();
        assert!(with_drafts.contains("wip"));
    }

    #[test]
    fn test_unrecognized_date_is_error() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "stale.md",
            "---\ntitle: Stale\ndescription: d\npublished: someday\n---\nbody",
        );

        let err = load(dir.path()).unwrap_err();
        assert!(
            matches!(err, LoadError::FrontMatter { ref message, .. } if message.contains("published"))
        );
    }

    #[test]
    fn test_modified_falls_back_to_mtime() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "fresh.md", "---\ntitle: Fresh\ndescription: d\n---\nbody");

        let registry = load(dir.path()).unwrap();
        let doc = registry.get("fresh").unwrap();
        let age = Local::now().signed_duration_since(doc.metadata.modified);
        assert!(age.num_minutes() < 5);
        assert!(doc.metadata.published.is_none());
    }
}
