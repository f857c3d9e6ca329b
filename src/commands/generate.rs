//! Generate static files

use anyhow::Result;
use notify::Watcher;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::generator::Generator;
use crate::Coursebook;

/// Generate the static site
pub fn run(site: &Coursebook) -> Result<()> {
    let start = Instant::now();

    let resolver = site.resolver()?;
    let generator = Generator::new(site)?;
    let stats = generator.generate(&resolver)?;

    tracing::info!(
        "Generated {} documents and copied {} assets in {:.2}s",
        stats.documents,
        stats.assets,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Watch for file changes and regenerate
pub async fn watch(site: &Coursebook) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    watcher.watch(&site.content_dir, notify::RecursiveMode::NonRecursive)?;
    if site.static_dir.exists() {
        watcher.watch(&site.static_dir, notify::RecursiveMode::Recursive)?;
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    let site = site.clone();
    tokio::task::spawn_blocking(move || {
        let mut last_rebuild = Instant::now();

        loop {
            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(_event) => {
                    // Only rebuild if more than 500ms since last rebuild
                    if last_rebuild.elapsed() > Duration::from_millis(500) {
                        tracing::info!("File changed, regenerating...");
                        if let Err(e) = run(&site) {
                            tracing::error!("Generation failed: {:#}", e);
                        }
                        last_rebuild = Instant::now();
                    }
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
    })
    .await?;

    Ok(())
}
