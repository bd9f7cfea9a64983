//! Pattern decoding: one compact record → a structured, display-ready
//! pattern.

use crate::lookup::LookupIndex;
use crate::shorten::shorten_name;
use crate::types::{
    CompactRecord, CutoffRow, DecodedPattern, EventMarker, Interval, RelationMap, RelationSet,
};

/// Decode one compact record.
///
/// Resolution failures never abort the decode: an interval with no lookup
/// rows keeps empty metadata and unbounded cutoffs, and tail tokens that are
/// missing or unmapped leave their pair's relation empty. Partial display
/// beats no display for this data.
pub fn decode(
    pattern_id: u64,
    record: &CompactRecord,
    lookup: &LookupIndex,
    event_name: &str,
    relation_map: &RelationMap,
) -> DecodedPattern {
    let n = record.state_ids.len();
    let mut intervals = Vec::with_capacity(n);
    let mut cutoffs = Vec::with_capacity(n);

    for (&state_id, label) in record.state_ids.iter().zip(&record.labels) {
        let code = shorten_name(label);
        let rows = lookup.rows_for(state_id).to_vec();

        // Display cutoffs come from the first matching row only.
        let first = rows.first();
        cutoffs.push(CutoffRow {
            code: code.clone(),
            low: first.and_then(|r| r.bin_low),
            high: first.and_then(|r| r.bin_high),
            method_name: first.map(|r| r.method_name.clone()).unwrap_or_default(),
        });

        intervals.push(Interval {
            label: label.clone(),
            state_id,
            code,
            cutoffs: rows,
        });
    }

    DecodedPattern {
        pattern_id,
        intervals,
        relations: resolve_relations(&record.tail_vals, n, relation_map),
        event: EventMarker::new(event_name),
        cutoffs,
        pattern_name: record.pattern_name.clone(),
        vertical_support: record.vertical_support,
        horizontal_support: record.horizontal_support,
        mean_duration: record.mean_duration,
    }
}

/// Consume one tail token per unordered pair, enumerated with the later
/// index as the outer loop: `(0,1), (0,2), (1,2), (0,3), ...`. Short tails
/// leave the trailing pairs unresolved.
fn resolve_relations(tail_vals: &[String], n: usize, map: &RelationMap) -> RelationSet {
    let mut relations = RelationSet::default();
    let mut k = 0;
    for j in 1..n {
        for i in 0..j {
            let relation = tail_vals.get(k).and_then(|token| map.resolve(token));
            relations.push(i, j, relation);
            k += 1;
        }
    }
    relations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Relation;

    fn record(n: usize, tail: &[&str]) -> CompactRecord {
        CompactRecord {
            state_ids: (1..=n as i64).collect(),
            labels: (1..=n).map(|i| format!("Sensor {i}")).collect(),
            tail_vals: tail.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_scenario() {
        let record = CompactRecord {
            state_ids: vec![12, 7],
            labels: vec!["Heart Rate".into(), "Temperature".into()],
            tail_vals: vec!["1".into()],
            pattern_name: "a_12_7_999_1".into(),
            vertical_support: Some(0.8),
            horizontal_support: Some(3.14),
            mean_duration: Some(12.5),
        };
        let lookup = LookupIndex::parse(
            "StateID,Label,BinID,BinLow,BinHigh,MethodName\n12,Heart Rate,3,90,120,EW\n",
        );

        let pattern = decode(0, &record, &lookup, "AKI", &RelationMap::standard());

        assert_eq!(pattern.pattern_id, 0);
        assert_eq!(pattern.intervals.len(), 2);
        assert_eq!(pattern.intervals[0].code, "HR");
        assert_eq!(pattern.intervals[1].code, "Temp");
        assert_eq!(pattern.relations.get(0, 1), Some(Relation::Meets));
        assert_eq!(pattern.event.name, "AKI");
        assert_eq!(pattern.event.code, "event");
        assert_eq!(pattern.vertical_support, Some(0.8));
        assert_eq!(pattern.horizontal_support, Some(3.14));
        assert_eq!(pattern.mean_duration, Some(12.5));
    }

    #[test]
    fn test_full_tail_resolves_every_pair() {
        // 4 intervals need 6 tokens; every pair must come back non-empty.
        let record = record(4, &["0", "1", "2", "3", "4", "5"]);
        let pattern = decode(1, &record, &LookupIndex::default(), "AKI", &RelationMap::standard());

        let mut seen = 0;
        for (i, j, rel) in pattern.relations.iter() {
            assert!(i < j);
            assert!(rel.is_some(), "pair ({i},{j}) should be resolved");
            seen += 1;
        }
        assert_eq!(seen, 6);
        // Pair order is (0,1),(0,2),(1,2),(0,3),(1,3),(2,3).
        assert_eq!(pattern.relations.get(0, 1), Some(Relation::Before));
        assert_eq!(pattern.relations.get(1, 2), Some(Relation::Overlaps));
        assert_eq!(pattern.relations.get(2, 3), Some(Relation::Starts));
    }

    #[test]
    fn test_short_tail_leaves_trailing_pairs_empty() {
        let record = record(3, &["1"]);
        let pattern = decode(2, &record, &LookupIndex::default(), "AKI", &RelationMap::standard());

        assert_eq!(pattern.relations.len(), 3);
        assert_eq!(pattern.relations.get(0, 1), Some(Relation::Meets));
        assert_eq!(pattern.relations.get(0, 2), None);
        assert_eq!(pattern.relations.get(1, 2), None);
    }

    #[test]
    fn test_unmapped_tokens_degrade_to_empty() {
        let record = record(2, &["99"]);
        let pattern = decode(3, &record, &LookupIndex::default(), "AKI", &RelationMap::standard());
        assert_eq!(pattern.relations.get(0, 1), None);
    }

    #[test]
    fn test_interval_without_lookup_rows() {
        let record = record(1, &[]);
        let pattern = decode(4, &record, &LookupIndex::default(), "AKI", &RelationMap::standard());

        assert!(pattern.intervals[0].cutoffs.is_empty());
        assert_eq!(pattern.cutoffs[0].low, None);
        assert_eq!(pattern.cutoffs[0].high, None);
        assert_eq!(pattern.cutoffs[0].method_name, "");
    }

    #[test]
    fn test_duplicate_state_rows_keep_all_use_first() {
        let record = CompactRecord {
            state_ids: vec![12],
            labels: vec!["Heart Rate.3".into()],
            ..Default::default()
        };
        let lookup = LookupIndex::parse(
            "StateID,Label,BinID,BinLow,BinHigh,MethodName\n\
             12,Heart Rate,3,90,120,EW\n\
             12,Heart Rate,4,120,,EW\n",
        );
        let pattern = decode(5, &record, &lookup, "AKI", &RelationMap::standard());

        assert_eq!(pattern.intervals[0].cutoffs.len(), 2);
        assert_eq!(pattern.cutoffs[0].low, Some(90.0));
        assert_eq!(pattern.cutoffs[0].high, Some(120.0));
        assert_eq!(pattern.cutoffs[0].method_name, "EW");
    }

    #[test]
    fn test_relations_serialize_in_tail_order() {
        let record = record(3, &["0", "1", "2"]);
        let pattern = decode(6, &record, &LookupIndex::default(), "AKI", &RelationMap::standard());
        let json = serde_json::to_string(&pattern.relations).unwrap();
        assert_eq!(json, r#"{"0-1":"b","0-2":"m","1-2":"o"}"#);
    }
}
