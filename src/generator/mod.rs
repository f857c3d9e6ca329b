//! Generator module - writes the site as static HTML files

use anyhow::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::helpers;
use crate::resolver::Resolver;
use crate::templates::TemplateRenderer;
use crate::Coursebook;

/// Counts reported after a generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub documents: usize,
    pub assets: usize,
}

/// Static site generator using the embedded templates
pub struct Generator {
    site: Coursebook,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Coursebook) -> Result<Self> {
        Ok(Self {
            site: site.clone(),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Generate the entire site
    pub fn generate(&self, resolver: &Resolver) -> Result<GenerateStats> {
        let public_dir = &self.site.public_dir;
        let config = &self.site.config;
        fs::create_dir_all(public_dir)?;

        let index = self.renderer.render_index(config, resolver.registry())?;
        write_file(&public_dir.join("index.html"), &index)?;

        let mut stats = GenerateStats::default();

        // Render through the resolver so the export matches what the server returns
        for document in resolver.registry().iter() {
            let request_path = helpers::document_path(config, &document.slug);
            let resolved = resolver.resolve(&document.slug, &request_path)?;
            let html = self.renderer.render_document(config, &resolved)?;

            write_file(&public_dir.join(&document.slug).join("index.html"), &html)?;
            tracing::debug!("Generated: {}", request_path);
            stats.documents += 1;
        }

        let not_found = self
            .renderer
            .render_not_found(config, &helpers::url_for(config, "404.html"))?;
        write_file(&public_dir.join("404.html"), &not_found)?;

        stats.assets = self.copy_static_assets()?;

        Ok(stats)
    }

    /// Copy `static/` into `public/static/`
    fn copy_static_assets(&self) -> Result<usize> {
        let static_dir = &self.site.static_dir;
        if !static_dir.exists() {
            return Ok(0);
        }

        let target = self.site.public_dir.join("static");
        let mut copied = 0;

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = target.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }

        Ok(copied)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}
