//! CLI entry point for coursebook

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coursebook::commands::new::NewDocument;

#[derive(Parser)]
#[command(name = "coursebook")]
#[command(version)]
#[command(about = "Serve and export long-form Markdown lessons", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new lesson
    New {
        /// Title of the new lesson
        title: String,

        /// One-line description
        #[arg(long)]
        description: Option<String>,

        /// Slug (defaults to the slugified title)
        #[arg(short, long)]
        slug: Option<String>,

        /// Create an .mdx file instead of .md
        #[arg(long)]
        mdx: bool,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Reload content and browsers on change
        #[arg(short, long)]
        watch: bool,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Clean the public folder
    Clean,

    /// List all lessons
    List,

    /// Resolve a slug and print its metadata
    Resolve {
        slug: String,

        /// Include the rendered HTML body
        #[arg(long)]
        body: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "coursebook=debug,tower_http=debug,info"
    } else {
        "coursebook=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            coursebook::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::New {
            title,
            description,
            slug,
            mdx,
        } => {
            let site = coursebook::Coursebook::new(&base_dir)?;
            let path = coursebook::commands::new::create_document(
                &site,
                &NewDocument {
                    title: &title,
                    description: description.as_deref(),
                    slug: slug.as_deref(),
                    mdx,
                },
            )?;
            println!("Created: {:?}", path);
        }

        Commands::Generate { watch } => {
            let site = coursebook::Coursebook::new(&base_dir)?;
            tracing::info!("Generating static files...");
            site.generate()?;
            println!("Generated successfully!");

            if watch {
                coursebook::commands::generate::watch(&site).await?;
            }
        }

        Commands::Server {
            port,
            ip,
            watch,
            open,
        } => {
            let site = coursebook::Coursebook::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            coursebook::server::start(&site, &ip, port, watch, open).await?;
        }

        Commands::Clean => {
            let site = coursebook::Coursebook::new(&base_dir)?;
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List => {
            let site = coursebook::Coursebook::new(&base_dir)?;
            coursebook::commands::list::run(&site)?;
        }

        Commands::Resolve { slug, body } => {
            let site = coursebook::Coursebook::new(&base_dir)?;
            coursebook::commands::resolve::run(&site, &slug, body)?;
        }

        Commands::Version => {
            println!("coursebook version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
