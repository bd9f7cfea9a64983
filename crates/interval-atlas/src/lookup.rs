//! Lookup table index: state identifier → ordered bin/cutoff rows.

use std::collections::HashMap;
use std::path::Path;

use crate::table::{parse_optional_number, parse_required_int, Table};
use crate::types::{AtlasResult, LookupRow};

/// In-memory index over the bin/cutoff reference table.
///
/// Multiple rows may share a state identifier; they are kept in table order
/// and the first one supplies the display cutoffs.
#[derive(Debug, Clone, Default)]
pub struct LookupIndex {
    by_state: HashMap<i64, Vec<LookupRow>>,
    row_count: usize,
    skipped: usize,
}

impl LookupIndex {
    /// Index a parsed table. Rows whose state identifier does not parse as
    /// an integer are skipped, not errors.
    pub fn from_table(table: &Table) -> Self {
        let state_id = table.column(&["stateid"], "StateID");
        let label = table.column(&["label"], "Label");
        let bin_id = table.column(&["binid"], "BinID");
        let bin_low = table.column(&["binlow"], "BinLow");
        let bin_high = table.column(&["binhigh"], "BinHigh");
        let method_name = table.column(&["methodname"], "MethodName");

        let mut index = Self::default();
        for row in &table.rows {
            let Some(sid) = parse_required_int(table.cell(row, state_id)) else {
                tracing::debug!("skipping lookup row with unusable state id: {row:?}");
                index.skipped += 1;
                continue;
            };
            index.row_count += 1;
            index.by_state.entry(sid).or_default().push(LookupRow {
                state_id: sid,
                label: table.cell(row, label).to_string(),
                bin_id: table.cell(row, bin_id).to_string(),
                bin_low: parse_optional_number(table.cell(row, bin_low)),
                bin_high: parse_optional_number(table.cell(row, bin_high)),
                method_name: table.cell(row, method_name).to_string(),
            });
        }
        index
    }

    /// Parse and index delimited text.
    pub fn parse(text: &str) -> Self {
        Self::from_table(&Table::parse(text))
    }

    /// Read, parse, and index a lookup table file.
    pub fn read_from_file(path: &Path) -> AtlasResult<Self> {
        let table = Table::read_from_file(path)?;
        let index = Self::from_table(&table);
        tracing::info!(
            "Indexed lookup table {}: {} rows, {} states, {} skipped",
            path.display(),
            index.row_count,
            index.by_state.len(),
            index.skipped
        );
        Ok(index)
    }

    /// All rows matching a state identifier, in table order. Unknown
    /// identifiers yield an empty slice.
    pub fn rows_for(&self, state_id: i64) -> &[LookupRow] {
        self.by_state
            .get(&state_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of indexed rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of distinct state identifiers.
    pub fn state_count(&self) -> usize {
        self.by_state.len()
    }

    /// Number of rows dropped for unusable identifiers.
    pub fn skipped_rows(&self) -> usize {
        self.skipped
    }
}
