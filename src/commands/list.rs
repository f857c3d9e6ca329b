//! List site content

use anyhow::Result;

use crate::helpers;
use crate::Coursebook;

/// Print every document, newest first
pub fn run(site: &Coursebook) -> Result<()> {
    let registry = site.load_registry()?;

    println!("Documents ({}):", registry.len());
    for doc in registry.iter() {
        println!(
            "  {}  {:<32} {} [{}]",
            doc.metadata.modified.format("%Y-%m-%d"),
            doc.slug,
            doc.metadata.title,
            helpers::document_path(&site.config, &doc.slug)
        );
    }

    Ok(())
}
