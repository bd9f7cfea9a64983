//! 1-D interval diagram layout driven by pairwise Allen relations.
//!
//! Bars are relaxed by repeated local corrections until a full pass changes
//! nothing. Relation sets can be over- or under-constrained, so the result
//! for contradictory input is best-effort; the only guarantees are
//! termination (the pass cap) and stability once a pass runs clean.

use serde::Serialize;

use crate::types::{DecodedPattern, Relation, RelationSet};

/// Width given to every freshly placed interval bar.
const BAR_WIDTH: f64 = 90.0;

/// Left margin of the canvas.
const START_X: f64 = 10.0;

/// Minimum separation enforced between related bars.
const PAD: f64 = 20.0;

/// Gap between the rightmost interval bar and the event bar.
const EVENT_GAP: f64 = 20.0;

/// Width of the terminal event bar.
const EVENT_WIDTH: f64 = 50.0;

/// Relaxation pass cap; contradictory relation sets stop here.
const MAX_PASSES: usize = 100;

/// One positioned interval bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutBar {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

/// The terminal event bar, placed after every interval bar.
#[derive(Debug, Clone, Serialize)]
pub struct EventBar {
    pub code: String,
    pub start: f64,
    pub end: f64,
}

/// Drawable geometry for one pattern.
#[derive(Debug, Clone, Serialize)]
pub struct PatternLayout {
    pub bars: Vec<LayoutBar>,
    pub event: EventBar,
}

/// Working coordinates during relaxation.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bar {
    x1: f64,
    x2: f64,
}

/// Compute bar positions for a pattern.
///
/// The event bar always sits past the rightmost interval bar and never
/// participates in relaxation.
pub fn layout(pattern: &DecodedPattern) -> PatternLayout {
    let n = pattern.intervals.len();
    let mut bars = initial_bars(n);

    for _ in 0..MAX_PASSES {
        if !relax_pass(&mut bars, &pattern.relations) {
            break;
        }
    }

    // Relaxation may push bars left of the margin; shift the whole diagram
    // back so the leftmost bar starts at it.
    let min_x = bars.iter().map(|b| b.x1).fold(f64::INFINITY, f64::min);
    if min_x < START_X {
        let d = START_X - min_x;
        for bar in &mut bars {
            bar.x1 += d;
            bar.x2 += d;
        }
    }

    let rightmost = bars.iter().map(|b| b.x2).fold(START_X, f64::max);
    let event = EventBar {
        code: pattern.event.code.clone(),
        start: rightmost + EVENT_GAP,
        end: rightmost + EVENT_GAP + EVENT_WIDTH,
    };

    PatternLayout {
        bars: bars
            .iter()
            .enumerate()
            .map(|(index, b)| LayoutBar {
                index,
                start: b.x1,
                end: b.x2,
            })
            .collect(),
        event,
    }
}

/// Same-width bars, all at the canvas origin; the corrective rules only
/// ever push pairs apart, so relaxation must start from coincident bars.
fn initial_bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|_| Bar {
            x1: START_X,
            x2: START_X + BAR_WIDTH,
        })
        .collect()
}

/// Apply every stored relation once, in stored order. Returns whether any
/// coordinate moved.
fn relax_pass(bars: &mut [Bar], relations: &RelationSet) -> bool {
    let mut changed = false;
    for (i, j, relation) in relations.iter() {
        let Some(relation) = relation else { continue };
        if i == j || i >= bars.len() || j >= bars.len() {
            continue;
        }
        let (a, b) = apply_relation(relation, bars[i], bars[j]);
        if a != bars[i] || b != bars[j] {
            changed = true;
        }
        bars[i] = a;
        bars[j] = b;
    }
    changed
}

/// One local correction: nudge bars `a` and/or `b` toward the geometric
/// meaning of their relation.
fn apply_relation(relation: Relation, mut a: Bar, mut b: Bar) -> (Bar, Bar) {
    match relation {
        // a ends, then (after a gap) b starts.
        Relation::Before => {
            if a.x2 + PAD > b.x1 {
                let d = a.x2 + PAD - b.x1;
                b.x1 += d;
                b.x2 += d;
            }
        }
        // b starts exactly where a ends.
        Relation::Meets => {
            b.x1 = a.x2;
            b.x2 = b.x1 + BAR_WIDTH;
        }
        // a starts first, the two overlap, a ends first.
        Relation::Overlaps => {
            if a.x1 >= b.x1 {
                a.x1 = b.x1 - PAD;
            }
            if b.x1 <= a.x1 + PAD {
                b.x1 = a.x1 + PAD;
                b.x2 = b.x1 + BAR_WIDTH;
            }
            if a.x2 >= b.x2 - PAD {
                a.x2 = b.x2 - PAD;
            }
        }
        // b ends where a ends, starting strictly inside a.
        Relation::Finishes => {
            b.x2 = a.x2;
            b.x1 = b.x2 - BAR_WIDTH;
            if b.x1 <= a.x1 {
                b.x1 = a.x1 + PAD;
            }
        }
        // a spans b with padding on both sides.
        Relation::Contains => {
            if b.x1 - PAD < a.x1 {
                a.x1 = b.x1 - PAD;
            }
            if b.x2 + PAD > a.x2 {
                a.x2 = b.x2 + PAD;
            }
        }
        // a and b begin together; b outlasts a.
        Relation::Starts => {
            a.x1 = b.x1;
            a.x2 = a.x1 + BAR_WIDTH;
            if a.x2 + PAD > b.x2 {
                b.x2 = a.x2 + PAD;
            }
        }
        Relation::Equals => {
            b.x1 = a.x1;
            b.x2 = a.x2;
        }
    }
    (a, b)
}

/// Lower-triangular pairwise-relation grid for display.
///
/// Rows cover every entity in pattern order (each interval, then the event)
/// against interval columns. `cells[r][c]` is populated for `c < r`, so the
/// leading row is empty and the grid for `n` intervals is `(n+1) x n`.
#[derive(Debug, Clone, Serialize)]
pub struct RelationMatrix {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `None` above the diagonal; an empty string marks an unresolved pair.
    pub cells: Vec<Vec<Option<String>>>,
}

/// Build the relation grid for a pattern. The event row renders `before` in
/// every column regardless of stored data.
pub fn relation_matrix(pattern: &DecodedPattern) -> RelationMatrix {
    let codes: Vec<String> = pattern.intervals.iter().map(|iv| iv.code.clone()).collect();
    let n = codes.len();

    let mut row_labels = codes.clone();
    row_labels.push(pattern.event.code.clone());

    let cells = (0..=n)
        .map(|r| {
            (0..n)
                .map(|c| {
                    if c >= r {
                        return None;
                    }
                    if r == n {
                        return Some(Relation::Before.code().to_string());
                    }
                    Some(
                        pattern
                            .relations
                            .get(c, r)
                            .map(|rel| rel.code().to_string())
                            .unwrap_or_default(),
                    )
                })
                .collect()
        })
        .collect();

    RelationMatrix {
        row_labels,
        col_labels: codes,
        cells,
    }
}
