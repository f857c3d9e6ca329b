//! Create a new lesson

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Coursebook;

/// Options for a new lesson file
#[derive(Debug, Clone, Default)]
pub struct NewDocument<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    /// Defaults to the slugified title
    pub slug: Option<&'a str>,
    pub mdx: bool,
}

/// Write a new lesson into the content directory and return its path
pub fn create_document(site: &Coursebook, options: &NewDocument<'_>) -> Result<PathBuf> {
    let slug = match options.slug {
        Some(s) => s.to_string(),
        None => slug::slugify(options.title),
    };
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a slug from title {:?}", options.title);
    }

    let extension = if options.mdx { "mdx" } else { "md" };
    fs::create_dir_all(&site.content_dir)?;

    // One file per slug, regardless of extension
    for ext in ["md", "mdx"] {
        let existing = site.content_dir.join(format!("{}.{}", slug, ext));
        if existing.exists() {
            anyhow::bail!("Document already exists: {:?}", existing);
        }
    }

    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let description = options.description.unwrap_or("Describe this lesson in one sentence");
    let content = format!(
        "---\ntitle: {}\ndescription: {}\npublished: {}\nmodified: {}\n---\n\n# {}\n",
        yaml_string(options.title),
        yaml_string(description),
        now,
        now,
        options.title
    );

    let file_path = site.content_dir.join(format!("{}.{}", slug, extension));
    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Quote a scalar so titles like `Mocks: a primer` stay valid YAML
fn yaml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
