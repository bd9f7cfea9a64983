//! Compact collection generation: flatten mined model filenames into the
//! collection format the decoder consumes.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::lookup::LookupIndex;
use crate::table::{parse_optional_number, Table};
use crate::types::{AtlasError, AtlasResult, CompactRecord};

/// Token separating interval identifiers from relation tokens in model
/// filenames.
const SENTINEL: &str = "999";

/// Model file extension emitted by the mining pipeline.
const MODEL_EXT: &str = ".pkl";

/// Identifier and relation tokens recovered from one model filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFilename {
    pub state_ids: Vec<i64>,
    pub tail_vals: Vec<String>,
}

/// Decode a model filename of the shape
/// `<run>_<id1>_<id2>_..._999_<rel1>_<rel2>...`.
///
/// Tokens split on `_`, `-`, or `,`; the leading run token is discarded.
/// Without the sentinel the whole remainder is the identifier list and the
/// tail is empty. Non-numeric identifier tokens are dropped.
pub fn parse_model_filename(name: &str) -> ParsedFilename {
    let base = strip_model_extension(name);
    let tokens: Vec<&str> = base
        .split(['_', '-', ','])
        .filter(|t| !t.is_empty())
        .skip(1)
        .collect();

    let (id_tokens, tail_tokens) = match tokens.iter().position(|t| *t == SENTINEL) {
        Some(idx) => (&tokens[..idx], &tokens[idx + 1..]),
        None => (&tokens[..], &[][..]),
    };

    ParsedFilename {
        state_ids: id_tokens.iter().filter_map(|t| t.parse().ok()).collect(),
        tail_vals: tail_tokens.iter().map(|t| t.to_string()).collect(),
    }
}

fn strip_model_extension(name: &str) -> &str {
    // The extension is ASCII, so the byte slice below stays on a char
    // boundary whenever the case-folded name ends with it.
    if name.to_ascii_lowercase().ends_with(MODEL_EXT) {
        &name[..name.len() - MODEL_EXT.len()]
    } else {
        name
    }
}

/// Pre-computed support/duration statistics for one pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PatternStats {
    pub vertical_support: Option<f64>,
    pub horizontal_support: Option<f64>,
    pub mean_duration: Option<f64>,
}

/// Statistics table keyed by the extension-stripped model filename.
#[derive(Debug, Clone, Default)]
pub struct StatsTable {
    by_name: HashMap<String, PatternStats>,
}

impl StatsTable {
    /// Index a parsed statistics table. Rows with an empty key cell are
    /// skipped; blank statistic cells read as null.
    pub fn from_table(table: &Table) -> Self {
        let key = table.column(&["pattern", "patternname", "filename"], "Pattern");
        let vs = table.column(&["verticalsupport", "vs"], "VerticalSupport");
        let hs = table.column(
            &["horizontalsupport", "meanhorizontalsupport", "hs"],
            "HorizontalSupport",
        );
        let mmd = table.column(&["meanduration", "meanmeanduration", "mmd"], "MeanDuration");

        let mut by_name = HashMap::new();
        for row in &table.rows {
            let name = table.cell(row, key).trim();
            if name.is_empty() {
                tracing::debug!("skipping statistics row without a pattern key: {row:?}");
                continue;
            }
            by_name.insert(
                strip_model_extension(name).to_string(),
                PatternStats {
                    vertical_support: parse_optional_number(table.cell(row, vs)),
                    horizontal_support: parse_optional_number(table.cell(row, hs)),
                    mean_duration: parse_optional_number(table.cell(row, mmd)),
                },
            );
        }
        Self { by_name }
    }

    /// Parse delimited text.
    pub fn parse(text: &str) -> Self {
        Self::from_table(&Table::parse(text))
    }

    /// Read, parse, and index a statistics file.
    pub fn read_from_file(path: &Path) -> AtlasResult<Self> {
        Ok(Self::from_table(&Table::read_from_file(path)?))
    }

    /// Statistics for an extension-stripped pattern name.
    pub fn get(&self, name: &str) -> Option<PatternStats> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Scan a directory of model files and build the compact collection.
///
/// Filenames sort naturally (numeric-aware, case-insensitive) and pattern
/// ids are assigned sequentially from 0. Files that yield no identifiers
/// are skipped. Labels are synthesized as `Label.BinID` from the lookup
/// table, falling back to the bare identifier.
pub fn generate_collection(
    models_dir: &Path,
    lookup: &LookupIndex,
    stats: Option<&StatsTable>,
) -> AtlasResult<BTreeMap<u64, CompactRecord>> {
    let mut names = Vec::new();
    let dir = std::fs::read_dir(models_dir)
        .map_err(|e| AtlasError::source_unavailable(models_dir, e))?;
    for entry in dir {
        let entry = entry.map_err(|e| AtlasError::source_unavailable(models_dir, e))?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.to_ascii_lowercase().ends_with(MODEL_EXT) {
            names.push(name);
        }
    }
    names.sort_by(|a, b| natural_cmp(a, b));

    let mut entries = BTreeMap::new();
    let mut next_id = 0u64;
    for name in names {
        let parsed = parse_model_filename(&name);
        if parsed.state_ids.is_empty() {
            tracing::debug!("skipping model file without identifiers: {name}");
            continue;
        }

        let pattern_name = strip_model_extension(&name).to_string();
        let pattern_stats = stats.and_then(|s| s.get(&pattern_name)).unwrap_or_default();
        let labels = parsed
            .state_ids
            .iter()
            .map(|&sid| synthesize_label(lookup, sid))
            .collect();

        entries.insert(
            next_id,
            CompactRecord {
                state_ids: parsed.state_ids,
                labels,
                tail_vals: parsed.tail_vals,
                pattern_name,
                vertical_support: pattern_stats.vertical_support,
                horizontal_support: pattern_stats.horizontal_support,
                mean_duration: pattern_stats.mean_duration,
            },
        );
        next_id += 1;
    }

    tracing::info!(
        "Generated collection from {}: {} patterns",
        models_dir.display(),
        entries.len()
    );
    Ok(entries)
}

/// `Label.BinID` from the first lookup row, or the bare identifier.
fn synthesize_label(lookup: &LookupIndex, state_id: i64) -> String {
    match lookup.rows_for(state_id).first() {
        Some(row) => format!("{}.{}", row.label, row.bin_id),
        None => state_id.to_string(),
    }
}

/// Write a generated collection as pretty JSON, creating parent
/// directories as needed.
pub fn write_collection(entries: &BTreeMap<u64, CompactRecord>, path: &Path) -> AtlasResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut object = serde_json::Map::new();
    for (id, record) in entries {
        object.insert(id.to_string(), record.to_value());
    }
    let mut text = serde_json::to_string_pretty(&serde_json::Value::Object(object))?;
    text.push('\n');
    std::fs::write(path, text)?;
    Ok(())
}

/// Numeric-aware, case-insensitive filename ordering, so `m_2.pkl` sorts
/// before `m_10.pkl`.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            // Case-insensitively equal throughout: byte order as the final
            // tiebreak keeps this a total order.
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ac), Some(bc)) if ac.is_ascii_digit() && bc.is_ascii_digit() => {
                let an = take_digits(&mut ai);
                let bn = take_digits(&mut bi);
                let ord = compare_digit_runs(&an, &bn);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(ac), Some(bc)) => {
                let ord = ac.to_ascii_lowercase().cmp(&bc.to_ascii_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

/// Compare digit runs by magnitude without overflowing: longer trimmed run
/// wins, equal lengths compare lexicographically.
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
