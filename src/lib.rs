//! coursebook: a small content site for long-form Markdown and MDX lessons
//!
//! Lessons live in a flat content directory, one file per slug. They are
//! loaded once into an immutable registry, resolved by slug at request time
//! and rendered with embedded Tera templates, either by the built-in server
//! or as a static export.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod resolver;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use content::{ContentRegistry, MarkdownRenderer};
use resolver::Resolver;

/// Config file looked up in the base directory
pub const CONFIG_FILE: &str = "_config.yml";

/// The coursebook site
#[derive(Debug, Clone)]
pub struct Coursebook {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Lesson directory
    pub content_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Static assets directory
    pub static_dir: PathBuf,
}

impl Coursebook {
    /// Create a new instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No {} in {:?}, using defaults", CONFIG_FILE, base_dir);
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance with an explicit configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Self {
            config,
            base_dir,
            content_dir,
            public_dir,
            static_dir,
        }
    }

    /// Build the content registry from the content directory
    pub fn load_registry(&self) -> Result<ContentRegistry> {
        let renderer = MarkdownRenderer::with_options(&self.config.highlight);
        let registry =
            ContentRegistry::load(&self.content_dir, &renderer, self.config.render_drafts)?;
        Ok(registry)
    }

    /// Load the registry and wrap it in a resolver
    pub fn resolver(&self) -> Result<Resolver> {
        Ok(Resolver::new(Arc::new(self.load_registry()?)))
    }

    /// Generate the static site
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
