//! Content module - lessons, front-matter and markdown processing

mod document;
mod frontmatter;
mod markdown;
pub mod registry;

pub use document::{Body, Document, Metadata};
pub use frontmatter::{parse_date_string, FrontMatter};
pub use markdown::{MarkdownRenderer, TocEntry};
pub use registry::{ContentRegistry, LoadError};
