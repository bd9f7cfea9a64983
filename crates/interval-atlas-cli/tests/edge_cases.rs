//! Edge case integration tests for interval-atlas-cli.
//!
//! Exercises source health, degraded data, boundary values, and the
//! generate → decode → layout pipeline end to end against temp files.

use std::path::PathBuf;

use interval_atlas::catalog::{build, build_all, build_all_from, Collection};
use interval_atlas::flatten::{generate_collection, write_collection, StatsTable};
use interval_atlas::layout::{layout, relation_matrix};
use interval_atlas::lookup::LookupIndex;
use interval_atlas::types::{AtlasError, Relation, RelationMap};
use interval_atlas_cli::config::{resolve_collection_path, resolve_lookup_path};

// ─────────────────────── helpers ───────────────────────

const LOOKUP: &str = "\
StateID,Label,BinID,BinLow,BinHigh,MethodName
12,Heart Rate,3,90,120,EW
12,Heart Rate,4,120,,EW
7,Temperature,1,,36.2,Gradient
3,Creatinine,2,1.2,2.0,KB
";

const COLLECTION: &str = r#"{
    "0": [[12, 7], ["Heart Rate", "Temperature"], ["1"], "a_12_7_999_1", 0.8, 3.14, 12.5],
    "1": [[12, 7, 3], ["Heart Rate.3", "Temperature.1", "Creatinine.2"], ["0", "2", "4"], "a_12_7_3", null, null, null],
    "2": [[42], ["Mystery Signal"], []]
}"#;

/// Write the standard fixtures into a temp dir.
fn write_sources(dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
    let collection = dir.path().join("pattern.json");
    let lookup = dir.path().join("states.csv");
    std::fs::write(&collection, COLLECTION).unwrap();
    std::fs::write(&lookup, LOOKUP).unwrap();
    (collection, lookup)
}

fn standard_map() -> RelationMap {
    RelationMap::standard()
}

// ═══════════════════════════════════════════════════════
// SOURCE HEALTH
// ═══════════════════════════════════════════════════════

/// Test 1: Missing collection file — error names the source.
#[test]
fn test_01_missing_collection() {
    let dir = tempfile::tempdir().unwrap();
    let (_, lookup) = write_sources(&dir);
    let missing = dir.path().join("nope/pattern.json");

    let err = build_all(&missing, &lookup, "AKI", &standard_map(), None).unwrap_err();
    let message = err.to_string();
    assert!(
        message.contains("pattern.json"),
        "error should identify the unavailable source: {message}"
    );
    println!("TEST 01 — Missing Collection: PASS");
}

/// Test 2: Corrupted collection JSON — fatal, names the source.
#[test]
fn test_02_corrupted_collection() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);
    std::fs::write(&collection, "{\"0\": [[1], [\"A\"]").unwrap();

    let err = build_all(&collection, &lookup, "AKI", &standard_map(), None).unwrap_err();
    assert!(matches!(err, AtlasError::SourceUnavailable { .. }));
    println!("TEST 02 — Corrupted Collection: PASS");
}

/// Test 3: Empty collection — zero patterns, no error.
#[test]
fn test_03_empty_collection() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);
    std::fs::write(&collection, "{}").unwrap();

    let catalog = build_all(&collection, &lookup, "AKI", &standard_map(), None).unwrap();
    assert!(catalog.patterns.is_empty());
    assert_eq!(catalog.skipped, 0);
    println!("TEST 03 — Empty Collection: PASS");
}

/// Test 4: Empty lookup table — patterns still decode, cutoffs degrade.
#[test]
fn test_04_empty_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);
    std::fs::write(&lookup, "").unwrap();

    let catalog = build_all(&collection, &lookup, "AKI", &standard_map(), None).unwrap();
    assert_eq!(catalog.patterns.len(), 3);
    for pattern in &catalog.patterns {
        for interval in &pattern.intervals {
            assert!(interval.cutoffs.is_empty());
        }
        for row in &pattern.cutoffs {
            assert_eq!(row.low, None);
            assert_eq!(row.high, None);
        }
    }
    println!("TEST 04 — Empty Lookup: PASS");
}

// ═══════════════════════════════════════════════════════
// DEGRADED DATA
// ═══════════════════════════════════════════════════════

/// Test 5: Malformed entries are skipped and counted, never fatal.
#[test]
fn test_05_malformed_entries_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);
    std::fs::write(
        &collection,
        r#"{
            "0": [[12], ["Heart Rate"], []],
            "1": [[12, 7], ["mismatched"], []],
            "2": 42,
            "not-a-number": [[3], ["Creatinine"], []]
        }"#,
    )
    .unwrap();

    let catalog = build_all(&collection, &lookup, "AKI", &standard_map(), None).unwrap();
    assert_eq!(catalog.patterns.len(), 1);
    assert_eq!(catalog.skipped, 3);
    println!("TEST 05 — Malformed Entries Skipped: PASS");
}

/// Test 6: Underspecified tail — trailing pairs stay empty, pattern renders.
#[test]
fn test_06_underspecified_tail() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);
    std::fs::write(
        &collection,
        r#"{"9": [[12, 7, 3], ["Heart Rate", "Temperature", "Creatinine"], ["1"]]}"#,
    )
    .unwrap();

    let pattern = build(&collection, &lookup, 9, "AKI", &standard_map()).unwrap();
    assert_eq!(pattern.relations.len(), 3);
    assert_eq!(pattern.relations.get(0, 1), Some(Relation::Meets));
    assert_eq!(pattern.relations.get(0, 2), None);
    assert_eq!(pattern.relations.get(1, 2), None);

    // The pattern still lays out and renders a matrix.
    let geometry = layout(&pattern);
    assert_eq!(geometry.bars.len(), 3);
    let matrix = relation_matrix(&pattern);
    assert_eq!(matrix.cells.len(), 4);
    println!("TEST 06 — Underspecified Tail: PASS");
}

/// Test 7: Surplus tail tokens are ignored.
#[test]
fn test_07_surplus_tail_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);
    std::fs::write(
        &collection,
        r#"{"4": [[12, 7], ["Heart Rate", "Temperature"], ["1", "0", "6", "2"]]}"#,
    )
    .unwrap();

    let pattern = build(&collection, &lookup, 4, "AKI", &standard_map()).unwrap();
    assert_eq!(pattern.relations.len(), 1);
    assert_eq!(pattern.relations.get(0, 1), Some(Relation::Meets));
    println!("TEST 07 — Surplus Tail Tokens: PASS");
}

/// Test 8: Unknown state id — interval keeps empty metadata.
#[test]
fn test_08_unknown_state_id() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);

    let pattern = build(&collection, &lookup, 2, "AKI", &standard_map()).unwrap();
    assert_eq!(pattern.intervals[0].label, "Mystery Signal");
    assert_eq!(pattern.intervals[0].code, "Mystery Signal");
    assert!(pattern.intervals[0].cutoffs.is_empty());
    assert_eq!(pattern.cutoffs[0].method_name, "");
    println!("TEST 08 — Unknown State ID: PASS");
}

/// Test 9: Duplicate lookup rows — all retained, first drives display.
#[test]
fn test_09_duplicate_lookup_rows() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);

    let pattern = build(&collection, &lookup, 0, "AKI", &standard_map()).unwrap();
    let hr = &pattern.intervals[0];
    assert_eq!(hr.cutoffs.len(), 2);
    assert_eq!(pattern.cutoffs[0].low, Some(90.0));
    assert_eq!(pattern.cutoffs[0].high, Some(120.0));
    println!("TEST 09 — Duplicate Lookup Rows: PASS");
}

// ═══════════════════════════════════════════════════════
// BOUNDARY VALUES
// ═══════════════════════════════════════════════════════

/// Test 10: Requesting an absent pattern id is NotFound.
#[test]
fn test_10_pattern_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);

    let err = build(&collection, &lookup, 999, "AKI", &standard_map()).unwrap_err();
    assert!(matches!(err, AtlasError::PatternNotFound(999)));
    println!("TEST 10 — Pattern Not Found: PASS");
}

/// Test 11: u64 max pattern id as a collection key.
#[test]
fn test_11_huge_pattern_id() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);
    std::fs::write(
        &collection,
        r#"{"18446744073709551615": [[7], ["Temperature"], []]}"#,
    )
    .unwrap();

    let pattern = build(&collection, &lookup, u64::MAX, "AKI", &standard_map()).unwrap();
    assert_eq!(pattern.pattern_id, u64::MAX);
    println!("TEST 11 — Huge Pattern ID: PASS");
}

/// Test 12: Single-interval pattern — no relations, event still placed.
#[test]
fn test_12_single_interval() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);

    let pattern = build(&collection, &lookup, 2, "AKI", &standard_map()).unwrap();
    assert!(pattern.relations.is_empty());

    let geometry = layout(&pattern);
    assert_eq!(geometry.bars.len(), 1);
    assert!(geometry.event.start > geometry.bars[0].end);

    let matrix = relation_matrix(&pattern);
    assert_eq!(matrix.cells.len(), 2);
    assert_eq!(matrix.cells[1][0].as_deref(), Some("b"));
    println!("TEST 12 — Single Interval: PASS");
}

/// Test 13: Unicode labels survive decode and pass through shortening.
#[test]
fn test_13_unicode_labels() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);
    std::fs::write(
        &collection,
        r#"{"5": [[7], ["체온 — Körpertemperatur.2"], []]}"#,
    )
    .unwrap();

    let pattern = build(&collection, &lookup, 5, "AKI", &standard_map()).unwrap();
    assert_eq!(pattern.intervals[0].code, "체온 — Körpertemperatur.2");
    println!("TEST 13 — Unicode Labels: PASS");
}

// ═══════════════════════════════════════════════════════
// END TO END
// ═══════════════════════════════════════════════════════

/// Test 14: generate → write → decode → layout pipeline.
#[test]
fn test_14_generate_decode_layout_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let (_, lookup_path) = write_sources(&dir);
    let models = dir.path().join("models");
    std::fs::create_dir(&models).unwrap();
    for name in ["a_12_7_999_1.pkl", "a_12_999.pkl", "a_3_7_999_0.pkl"] {
        std::fs::write(models.join(name), b"").unwrap();
    }
    let stats_path = dir.path().join("scores.csv");
    std::fs::write(
        &stats_path,
        "Pattern,Vertical Support,Horizontal Support,Mean Duration\na_12_7_999_1,0.8,3.14,12.5\n",
    )
    .unwrap();

    let lookup = LookupIndex::read_from_file(&lookup_path).unwrap();
    let stats = StatsTable::read_from_file(&stats_path).unwrap();
    let entries = generate_collection(&models, &lookup, Some(&stats)).unwrap();
    assert_eq!(entries.len(), 3);

    let out = dir.path().join("generated/pattern.json");
    write_collection(&entries, &out).unwrap();

    let collection = Collection::read_from_file(&out).unwrap();
    let catalog = build_all_from(&collection, &lookup, "AKI", &standard_map(), None);
    assert_eq!(catalog.patterns.len(), 3);
    assert_eq!(catalog.skipped, 0);

    // The joined statistics land on the right pattern.
    let scored: Vec<_> = catalog
        .patterns
        .iter()
        .filter(|p| p.vertical_support.is_some())
        .collect();
    assert_eq!(scored.len(), 1);
    assert_eq!(scored[0].pattern_name, "a_12_7_999_1");
    assert_eq!(scored[0].mean_duration, Some(12.5));

    // Every pattern lays out within the pass cap and stays on-canvas.
    for pattern in &catalog.patterns {
        let geometry = layout(pattern);
        for bar in &geometry.bars {
            assert!(bar.start.is_finite() && bar.end.is_finite());
            assert!(bar.start >= 10.0);
        }
    }
    println!("TEST 14 — Generate/Decode/Layout Pipeline: PASS");
}

/// Test 15: catalog JSON shape matches the consumer contract.
#[test]
fn test_15_consumer_json_shape() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);

    let catalog = build_all(&collection, &lookup, "AKI", &standard_map(), None).unwrap();
    let json = serde_json::to_value(&catalog.patterns).unwrap();
    let first = &json[0];

    assert_eq!(first["pattern_id"], 0);
    assert_eq!(first["event"]["name"], "AKI");
    assert_eq!(first["event"]["code"], "event");
    assert_eq!(first["relations"]["0-1"], "m");
    assert_eq!(first["patternName"], "a_12_7_999_1");
    assert_eq!(first["verticalSupport"], 0.8);
    assert_eq!(first["horizontalSupport"], 3.14);
    assert_eq!(first["meanDuration"], 12.5);
    assert_eq!(first["intervals"][0]["code"], "HR");
    assert_eq!(first["intervals"][0]["state_id"], 12);
    assert_eq!(first["cutoffs"][0]["methodName"], "EW");

    // Null statistics serialize as null, not zero.
    assert!(json[1]["verticalSupport"].is_null());
    println!("TEST 15 — Consumer JSON Shape: PASS");
}

/// Test 16: max_count truncates the batch.
#[test]
fn test_16_max_count() {
    let dir = tempfile::tempdir().unwrap();
    let (collection, lookup) = write_sources(&dir);

    let catalog = build_all(&collection, &lookup, "AKI", &standard_map(), Some(1)).unwrap();
    assert_eq!(catalog.patterns.len(), 1);
    assert_eq!(catalog.patterns[0].pattern_id, 0);
    println!("TEST 16 — Max Count: PASS");
}

// ═══════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════

/// Bonus: explicit paths always win over resolution.
#[test]
fn test_bonus_explicit_paths_win() {
    assert_eq!(
        resolve_collection_path(Some("/data/run7/pattern.json")),
        "/data/run7/pattern.json"
    );
    assert_eq!(
        resolve_lookup_path(Some("/data/run7/states.csv")),
        "/data/run7/states.csv"
    );
    println!("TEST BONUS — Explicit Paths Win: PASS");
}
