//! Helper functions shared by templates and the generator

mod date;
mod url;

pub use date::*;
pub use url::*;
