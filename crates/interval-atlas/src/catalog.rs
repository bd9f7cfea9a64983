//! Catalog assembly: load the compact collection and lookup table once,
//! decode every pattern.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::decode::decode;
use crate::lookup::LookupIndex;
use crate::types::{AtlasError, AtlasResult, CompactRecord, DecodedPattern, RelationMap};

/// The compact collection file: pattern id → positional tuple, kept as raw
/// JSON so one malformed entry cannot poison the rest of the batch.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: BTreeMap<u64, serde_json::Value>,
    skipped_keys: usize,
}

impl Collection {
    /// Parse the collection JSON. Keys that do not parse as integers are
    /// dropped and counted.
    pub fn parse(text: &str) -> AtlasResult<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(text)?;

        let mut entries = BTreeMap::new();
        let mut skipped_keys = 0;
        for (key, value) in raw {
            match key.trim().parse::<u64>() {
                Ok(id) => {
                    entries.insert(id, value);
                }
                Err(_) => {
                    tracing::debug!("dropping collection entry with non-integer key {key:?}");
                    skipped_keys += 1;
                }
            }
        }

        Ok(Self {
            entries,
            skipped_keys,
        })
    }

    /// Read and parse a collection file. Both unreadable and unparseable
    /// files are fatal and name the source.
    pub fn read_from_file(path: &Path) -> AtlasResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AtlasError::source_unavailable(path, e))?;
        let collection =
            Self::parse(&text).map_err(|e| AtlasError::source_unavailable(path, e))?;
        tracing::info!(
            "Loaded collection {}: {} patterns",
            path.display(),
            collection.entries.len()
        );
        Ok(collection)
    }

    /// The raw tuple for one pattern id.
    pub fn get(&self, pattern_id: u64) -> Option<&serde_json::Value> {
        self.entries.get(&pattern_id)
    }

    /// Number of entries with usable keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries dropped at parse time for unusable keys.
    pub fn skipped_keys(&self) -> usize {
        self.skipped_keys
    }
}

/// Result of a full catalog build.
#[derive(Debug, Clone, Serialize)]
pub struct PatternCatalog {
    pub patterns: Vec<DecodedPattern>,
    /// Entries dropped for unusable keys or malformed tuples.
    pub skipped: usize,
}

/// Build the whole catalog from source files. The collection and lookup
/// table are each loaded exactly once.
pub fn build_all(
    collection_path: &Path,
    lookup_path: &Path,
    event_name: &str,
    relation_map: &RelationMap,
    max_count: Option<usize>,
) -> AtlasResult<PatternCatalog> {
    let collection = Collection::read_from_file(collection_path)?;
    let lookup = LookupIndex::read_from_file(lookup_path)?;
    Ok(build_all_from(
        &collection,
        &lookup,
        event_name,
        relation_map,
        max_count,
    ))
}

/// Decode every entry of an already-loaded collection in ascending id
/// order, optionally truncated to `max_count` entries. Malformed entries
/// are skipped and counted, never fatal.
pub fn build_all_from(
    collection: &Collection,
    lookup: &LookupIndex,
    event_name: &str,
    relation_map: &RelationMap,
    max_count: Option<usize>,
) -> PatternCatalog {
    let mut patterns = Vec::new();
    let mut skipped = collection.skipped_keys;

    let take = max_count.unwrap_or(usize::MAX);
    for (&id, value) in collection.entries.iter().take(take) {
        match CompactRecord::from_value(value) {
            Ok(record) => patterns.push(decode(id, &record, lookup, event_name, relation_map)),
            Err(e) => {
                tracing::debug!("skipping pattern {id}: {e}");
                skipped += 1;
            }
        }
    }

    tracing::info!("Catalog built: {} patterns, {} skipped", patterns.len(), skipped);
    PatternCatalog { patterns, skipped }
}

/// Build one pattern from source files, for on-demand views.
pub fn build(
    collection_path: &Path,
    lookup_path: &Path,
    pattern_id: u64,
    event_name: &str,
    relation_map: &RelationMap,
) -> AtlasResult<DecodedPattern> {
    let collection = Collection::read_from_file(collection_path)?;
    let lookup = LookupIndex::read_from_file(lookup_path)?;
    build_from(&collection, &lookup, pattern_id, event_name, relation_map)
}

/// Single-pattern variant over already-loaded sources.
pub fn build_from(
    collection: &Collection,
    lookup: &LookupIndex,
    pattern_id: u64,
    event_name: &str,
    relation_map: &RelationMap,
) -> AtlasResult<DecodedPattern> {
    let value = collection
        .get(pattern_id)
        .ok_or(AtlasError::PatternNotFound(pattern_id))?;
    let record = CompactRecord::from_value(value)?;
    Ok(decode(pattern_id, &record, lookup, event_name, relation_map))
}
