//! Catalog loading: turns a manifest, a repository tree, a directory listing
//! or a local directory into a uniform folder -> tracks mapping.

mod cache;
mod fetch;
mod listing;
mod loader;
mod local;
mod manifest;
mod model;
mod source;
mod tree;

pub use fetch::{Fetcher, HttpFetcher, last_segment};
pub use loader::{FolderLoaded, FolderLoader, FolderRequest};
pub use model::*;
pub use source::{CatalogSource, source_from_settings};

#[cfg(test)]
mod tests;
