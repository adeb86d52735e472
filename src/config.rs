//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive runtime
//! behavior and helpers to resolve config, cache and log locations.

mod load;
mod schema;

pub use load::{default_cache_path, default_log_path};
pub use schema::*;
