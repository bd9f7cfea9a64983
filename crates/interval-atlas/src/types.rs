//! Core data types for temporal interval patterns.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Display code reserved for the terminal clinical event.
pub const EVENT_CODE: &str = "event";

/// The seven Allen relations used by the compact encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "b")]
    Before,
    #[serde(rename = "m")]
    Meets,
    #[serde(rename = "o")]
    Overlaps,
    #[serde(rename = "f")]
    Finishes,
    #[serde(rename = "c")]
    Contains,
    #[serde(rename = "s")]
    Starts,
    #[serde(rename = "e")]
    Equals,
}

impl Relation {
    /// Single-letter display code.
    pub fn code(self) -> &'static str {
        match self {
            Relation::Before => "b",
            Relation::Meets => "m",
            Relation::Overlaps => "o",
            Relation::Finishes => "f",
            Relation::Contains => "c",
            Relation::Starts => "s",
            Relation::Equals => "e",
        }
    }

    /// Parse a single-letter display code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "b" => Some(Relation::Before),
            "m" => Some(Relation::Meets),
            "o" => Some(Relation::Overlaps),
            "f" => Some(Relation::Finishes),
            "c" => Some(Relation::Contains),
            "s" => Some(Relation::Starts),
            "e" => Some(Relation::Equals),
            _ => None,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Maps integer tail tokens to Allen relations.
///
/// Threaded explicitly through every decode call; [`RelationMap::standard`]
/// is the conventional encoding used by the upstream mining pipeline.
#[derive(Debug, Clone)]
pub struct RelationMap {
    entries: BTreeMap<i64, Relation>,
}

impl RelationMap {
    /// The standard encoding: `0..=6` → before, meets, overlaps, finishes,
    /// contains, starts, equals.
    pub fn standard() -> Self {
        let entries = BTreeMap::from([
            (0, Relation::Before),
            (1, Relation::Meets),
            (2, Relation::Overlaps),
            (3, Relation::Finishes),
            (4, Relation::Contains),
            (5, Relation::Starts),
            (6, Relation::Equals),
        ]);
        Self { entries }
    }

    /// Build a custom encoding from `(token, relation)` pairs.
    pub fn from_entries(pairs: impl IntoIterator<Item = (i64, Relation)>) -> Self {
        Self {
            entries: pairs.into_iter().collect(),
        }
    }

    /// Resolve one tail token. Unparseable or unmapped tokens resolve to
    /// `None`, which downstream renders as an empty relation.
    pub fn resolve(&self, token: &str) -> Option<Relation> {
        let key: i64 = token.trim().parse().ok()?;
        self.entries.get(&key).copied()
    }
}

impl Default for RelationMap {
    fn default() -> Self {
        Self::standard()
    }
}

/// Pairwise relations of one pattern, kept in tail order:
/// `(0,1), (0,2), (1,2), (0,3), ...` with the later index as the outer loop.
///
/// Only `i < j` pairs are stored. A `None` relation means the tail encoding
/// did not cover (or could not resolve) that pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationSet {
    entries: Vec<((usize, usize), Option<Relation>)>,
}

impl RelationSet {
    /// Append the relation for pair `(i, j)`.
    pub fn push(&mut self, i: usize, j: usize, relation: Option<Relation>) {
        self.entries.push(((i, j), relation));
    }

    /// The relation stored for pair `(i, j)`, if any was resolved.
    pub fn get(&self, i: usize, j: usize) -> Option<Relation> {
        self.entries
            .iter()
            .find(|((a, b), _)| *a == i && *b == j)
            .and_then(|(_, rel)| *rel)
    }

    /// Iterate pairs in stored order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Option<Relation>)> + '_ {
        self.entries.iter().map(|((i, j), rel)| (*i, *j, *rel))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for RelationSet {
    /// Serializes as `{"0-1": "m", "0-2": "", ...}`. Unresolved pairs keep
    /// an empty code so consumers can still enumerate every pair.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for ((i, j), rel) in &self.entries {
            let key = format!("{i}-{j}");
            let code = rel.map(Relation::code).unwrap_or("");
            map.serialize_entry(&key, code)?;
        }
        map.end()
    }
}

/// One record of the bin/cutoff lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupRow {
    pub state_id: i64,
    pub label: String,
    pub bin_id: String,
    pub bin_low: Option<f64>,
    pub bin_high: Option<f64>,
    pub method_name: String,
}

/// One decoded interval of a pattern.
#[derive(Debug, Clone, Serialize)]
pub struct Interval {
    pub label: String,
    pub state_id: i64,
    /// Short display code derived from the label.
    pub code: String,
    /// Every lookup row matching the state identifier, in table order.
    pub cutoffs: Vec<LookupRow>,
}

/// The terminal clinical event of a pattern.
#[derive(Debug, Clone, Serialize)]
pub struct EventMarker {
    pub name: String,
    pub code: String,
}

impl EventMarker {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            code: EVENT_CODE.to_string(),
        }
    }
}

/// One display row of the cutoffs table. Bounds come from the first lookup
/// row of the interval's state identifier; `None` means unbounded.
#[derive(Debug, Clone, Serialize)]
pub struct CutoffRow {
    pub code: String,
    pub low: Option<f64>,
    pub high: Option<f64>,
    #[serde(rename = "methodName")]
    pub method_name: String,
}

/// The assembled consumer-facing pattern.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedPattern {
    pub pattern_id: u64,
    pub intervals: Vec<Interval>,
    pub relations: RelationSet,
    pub event: EventMarker,
    pub cutoffs: Vec<CutoffRow>,
    #[serde(rename = "patternName")]
    pub pattern_name: String,
    #[serde(rename = "verticalSupport")]
    pub vertical_support: Option<f64>,
    #[serde(rename = "horizontalSupport")]
    pub horizontal_support: Option<f64>,
    #[serde(rename = "meanDuration")]
    pub mean_duration: Option<f64>,
}

/// Validated form of one compact collection tuple:
/// `[stateIds, labels, tailVals, patternName?, vs?, hs?, mmd?]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompactRecord {
    pub state_ids: Vec<i64>,
    pub labels: Vec<String>,
    pub tail_vals: Vec<String>,
    pub pattern_name: String,
    pub vertical_support: Option<f64>,
    pub horizontal_support: Option<f64>,
    pub mean_duration: Option<f64>,
}

impl CompactRecord {
    /// Validate one positional tuple. Shape errors are reported here, once,
    /// so the rest of the pipeline can trust the record.
    pub fn from_value(value: &serde_json::Value) -> AtlasResult<Self> {
        let tuple = value
            .as_array()
            .ok_or_else(|| AtlasError::MalformedRecord("entry is not a positional tuple".into()))?;

        let state_ids = tuple
            .first()
            .and_then(|v| v.as_array())
            .ok_or_else(|| AtlasError::MalformedRecord("missing state identifier list".into()))?
            .iter()
            .map(|v| {
                v.as_i64().ok_or_else(|| {
                    AtlasError::MalformedRecord(format!("state identifier {v} is not an integer"))
                })
            })
            .collect::<AtlasResult<Vec<i64>>>()?;

        let labels = tuple
            .get(1)
            .and_then(|v| v.as_array())
            .ok_or_else(|| AtlasError::MalformedRecord("missing label list".into()))?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| AtlasError::MalformedRecord(format!("label {v} is not a string")))
            })
            .collect::<AtlasResult<Vec<String>>>()?;

        if state_ids.len() != labels.len() {
            return Err(AtlasError::MalformedRecord(format!(
                "{} state identifiers but {} labels",
                state_ids.len(),
                labels.len()
            )));
        }

        // Tail tokens and trailing fields are optional by contract.
        let tail_vals = tuple
            .get(2)
            .and_then(|v| v.as_array())
            .map(|vals| vals.iter().map(json_token).collect())
            .unwrap_or_default();

        let pattern_name = tuple
            .get(3)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            state_ids,
            labels,
            tail_vals,
            pattern_name,
            vertical_support: tuple.get(4).and_then(|v| v.as_f64()),
            horizontal_support: tuple.get(5).and_then(|v| v.as_f64()),
            mean_duration: tuple.get(6).and_then(|v| v.as_f64()),
        })
    }

    /// Render back to the positional tuple form of the collection file.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!([
            self.state_ids,
            self.labels,
            self.tail_vals,
            self.pattern_name,
            self.vertical_support,
            self.horizontal_support,
            self.mean_duration,
        ])
    }
}

/// Tail tokens arrive as strings but some producers emit bare numbers.
fn json_token(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Errors that can occur while assembling or serving patterns.
#[derive(thiserror::Error, Debug)]
pub enum AtlasError {
    #[error("Pattern {0} not found in collection")]
    PatternNotFound(u64),

    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AtlasError {
    /// Wrap a lower-level load failure with the path of the failing source.
    pub fn source_unavailable(path: &std::path::Path, reason: impl fmt::Display) -> Self {
        AtlasError::SourceUnavailable {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience result type.
pub type AtlasResult<T> = Result<T, AtlasError>;
