//! Interval Atlas — core library for temporal interval patterns: compact-record
//! decoding, lookup-table joins, Allen-relation layout, and catalog assembly.

pub mod catalog;
pub mod decode;
pub mod flatten;
pub mod layout;
pub mod lookup;
pub mod shorten;
pub mod table;
pub mod types;

pub use catalog::{build, build_all, build_all_from, build_from, Collection, PatternCatalog};
pub use decode::decode;
pub use flatten::{
    generate_collection, parse_model_filename, write_collection, ParsedFilename, PatternStats,
    StatsTable,
};
pub use layout::{layout, relation_matrix, EventBar, LayoutBar, PatternLayout, RelationMatrix};
pub use lookup::LookupIndex;
pub use shorten::shorten_name;
pub use table::{parse_optional_number, parse_required_int, Table};
pub use types::*;
