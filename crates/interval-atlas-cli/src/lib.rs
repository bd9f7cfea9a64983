//! Interval Atlas CLI — command-line consumer of the pattern catalog.

pub mod config;

pub use config::{resolve_collection_path, resolve_lookup_path};
