//! Resolve a single slug from the command line

use anyhow::Result;

use crate::helpers;
use crate::Coursebook;

/// Resolve `slug` and print its metadata as JSON
pub fn run(site: &Coursebook, slug: &str, with_body: bool) -> Result<()> {
    let resolver = site.resolver()?;
    let request_path = helpers::document_path(&site.config, slug);
    let resolved = resolver.resolve(slug, &request_path)?;

    let mut value = serde_json::to_value(&resolved)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "edit_link".to_string(),
            helpers::edit_link(&site.config, &resolved.request_path, &resolved.source).into(),
        );
        if with_body {
            obj.insert("html".to_string(), resolved.body.html.clone().into());
        }
    }

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
