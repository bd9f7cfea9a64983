//! Configuration loading and resolution.

use std::path::PathBuf;

/// Resolve the compact collection path.
pub fn resolve_collection_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var("ATLAS_COLLECTION") {
        return env_path;
    }

    let cwd_collection = PathBuf::from("patterns/pattern.json");
    if cwd_collection.exists() {
        return cwd_collection.display().to_string();
    }

    "pattern.json".to_string()
}

/// Resolve the lookup table path.
pub fn resolve_lookup_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var("ATLAS_LOOKUP") {
        return env_path;
    }

    let cwd_lookup = PathBuf::from("assets/states.csv");
    if cwd_lookup.exists() {
        return cwd_lookup.display().to_string();
    }

    "states.csv".to_string()
}
