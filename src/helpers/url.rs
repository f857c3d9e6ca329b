//! URL helper functions

use std::path::Path;

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "mocks/") // -> "/course/mocks/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "mocks/") // -> "https://example.com/course/mocks/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Path of a document page relative to the site root
pub fn document_path(config: &SiteConfig, slug: &str) -> String {
    url_for(config, &format!("{}/", slug))
}

/// Build the "edit this page" link for a request path
///
/// The site root and surrounding slashes are removed from the path, the
/// extension of `source` is appended, and the result replaces `:path` in
/// `config.edit_url`.
pub fn edit_link(config: &SiteConfig, request_path: &str, source: &Path) -> String {
    let root = config.root.trim_matches('/');
    let path = request_path.trim_matches('/');
    let path = match path.strip_prefix(root) {
        Some(rest) if !root.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
            rest.trim_start_matches('/')
        }
        _ => path,
    };

    let file = match source.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", path, ext),
        None => path.to_string(),
    };

    config.edit_url.replace(":path", &file)
}
