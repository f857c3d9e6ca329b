//! Built-in page templates using the Tera template engine
//!
//! All templates are embedded in the binary, so a site only needs its
//! content directory and an optional `_config.yml`.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{ContentRegistry, TocEntry};
use crate::helpers;
use crate::resolver::Resolved;

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Rendered bodies and URLs go in verbatim; text fields use `| escape`
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("html/layout.html")),
            ("document.html", include_str!("html/document.html")),
            ("index.html", include_str!("html/index.html")),
            ("not_found.html", include_str!("html/not_found.html")),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Render a resolved document page
    pub fn render_document(&self, config: &SiteConfig, resolved: &Resolved) -> Result<String> {
        let mut context = Context::new();
        context.insert("config", &ConfigData::from(config));
        context.insert("document", &DocumentData::new(config, resolved));
        self.render("document.html", &context)
    }

    /// Render the lesson index
    pub fn render_index(&self, config: &SiteConfig, registry: &ContentRegistry) -> Result<String> {
        let documents: Vec<DocumentSummary> = registry
            .iter()
            .map(|doc| DocumentSummary {
                title: doc.metadata.title.clone(),
                description: doc.metadata.description.clone(),
                path: helpers::document_path(config, &doc.slug),
                modified: helpers::date_xml(&doc.metadata.modified),
            })
            .collect();

        let mut context = Context::new();
        context.insert("config", &ConfigData::from(config));
        context.insert("documents", &documents);
        self.render("index.html", &context)
    }

    /// Render the 404 page
    pub fn render_not_found(&self, config: &SiteConfig, request_path: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("config", &ConfigData::from(config));
        context.insert("request_path", request_path);
        self.render("not_found.html", &context)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 160,
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!("{}…", truncated.trim_end())))
    }
}

/// Tera filter: reformat an ISO 8601 date string
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%Y-%m-%d".to_string(),
    };

    match chrono::DateTime::parse_from_rfc3339(&s) {
        Ok(date) => Ok(tera::Value::String(helpers::format_date(&date, &format))),
        // Not a date we produced, leave it alone
        Err(_) => Ok(tera::Value::String(s)),
    }
}

// Template context data

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub root: String,
    pub date_format: String,
    pub stylesheet: String,
}

impl From<&SiteConfig> for ConfigData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
            root: helpers::url_for(config, ""),
            date_format: config.date_format.clone(),
            stylesheet: helpers::url_for(config, "static/style.css"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentData {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub modified: String,
    pub published: Option<String>,
    pub content: String,
    pub toc: Vec<TocEntry>,
    pub canonical_url: String,
    pub edit_link: String,
}

impl DocumentData {
    pub fn new(config: &SiteConfig, resolved: &Resolved) -> Self {
        let metadata = &resolved.metadata;
        Self {
            slug: resolved.slug.clone(),
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            modified: helpers::date_xml(&metadata.modified),
            published: metadata.published.as_ref().map(helpers::date_xml),
            content: resolved.body.html.clone(),
            toc: resolved.body.toc.clone(),
            canonical_url: helpers::full_url_for(config, &format!("{}/", resolved.slug)),
            edit_link: helpers::edit_link(config, &resolved.request_path, &resolved.source),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub title: String,
    pub description: String,
    pub path: String,
    pub modified: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Body, Metadata};
    use chrono::{Local, TimeZone};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn resolved() -> Resolved {
        Resolved {
            slug: "mocks".to_string(),
            request_path: "/mocks".to_string(),
            metadata: Metadata {
                title: "Mocks & Spies".to_string(),
                description: "Replacing collaborators".to_string(),
                modified: Local.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap(),
                published: Some(Local.with_ymd_and_hms(2023, 11, 20, 9, 0, 0).unwrap()),
            },
            body: Arc::new(Body {
                raw: "## Setup\n".to_string(),
                html: r#"<h2 id="setup">Setup</h2>"#.to_string(),
                toc: vec![TocEntry {
                    level: 2,
                    title: "Setup".to_string(),
                    id: "setup".to_string(),
                }],
            }),
            source: PathBuf::from("content/mocks.mdx"),
        }
    }

    #[test]
    fn test_render_document() {
        let renderer = TemplateRenderer::new().unwrap();
        let config = SiteConfig::default();
        let html = renderer.render_document(&config, &resolved()).unwrap();

        assert!(html.contains("<title>Mocks &amp; Spies"));
        assert!(html.contains(r#"<meta name="description" content="Replacing collaborators">"#));
        assert!(html.contains(r#"<h2 id="setup">Setup</h2>"#));
        assert!(html.contains(r##"<a href="#setup">Setup</a>"##));
        assert!(html.contains("https://github.com/coursebook/coursebook/edit/main/content/mocks.mdx"));
        assert!(html.contains("March 2, 2024"));
        assert!(html.contains("November 20, 2023"));
    }

    #[test]
    fn test_render_not_found() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer
            .render_not_found(&SiteConfig::default(), "/does-not-exist")
            .unwrap();
        assert!(html.contains("does-not-exist"));
        assert!(html.contains("Page not found"));
    }

    #[test]
    fn test_truncate_chars_filter() {
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(5));
        let value = truncate_chars_filter(&tera::Value::from("Vitest basics"), &args).unwrap();
        assert_eq!(value, tera::Value::from("Vites…"));
    }

    #[test]
    fn test_date_format_filter_passes_through_non_dates() {
        let value = date_format_filter(&tera::Value::from("someday"), &HashMap::new()).unwrap();
        assert_eq!(value, tera::Value::from("someday"));
    }
}
