// Projection vs. line comparison and ranking.

use crate::lines::LineBook;
use crate::market::Market;
use crate::matching::NameMatcher;
use crate::number::StatValue;
use crate::projections::PlayerProjection;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Rendering of an unavailable number in every report format.
pub const UNAVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Suggestion {
    Over,
    Under,
    MissingProjection,
    NoLine,
}

impl Suggestion {
    pub fn as_str(self) -> &'static str {
        match self {
            Suggestion::Over => "Over",
            Suggestion::Under => "Under",
            Suggestion::MissingProjection => "MissingProjection",
            Suggestion::NoLine => "NoLine",
        }
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub name: String,
    pub position: String,
    #[serde(serialize_with = "or_unavailable")]
    pub projected_yards: Option<StatValue>,
    #[serde(serialize_with = "or_unavailable")]
    pub line: Option<f64>,
    #[serde(serialize_with = "or_unavailable")]
    pub delta: Option<f64>,
    pub suggestion: Suggestion,
}

impl ComparisonResult {
    /// |delta|, with unavailable deltas ranked below everything.
    pub fn magnitude(&self) -> f64 {
        self.delta.map_or(f64::NEG_INFINITY, f64::abs)
    }
}

fn or_unavailable<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(UNAVAILABLE),
    }
}

/// Two decimal places, with negative zero folded to zero.
fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Over strictly above zero, everything else (including an exact tie) Under.
pub fn suggest(delta: f64) -> Suggestion {
    if delta > 0.0 {
        Suggestion::Over
    } else {
        Suggestion::Under
    }
}

/// Join projections to lines and compute each player's delta. Results come
/// back in projection order; see [`rank`] for ordering by edge.
pub fn compare(
    projections: &[PlayerProjection],
    lines: &LineBook,
    market: &Market,
    matcher: &NameMatcher,
) -> Vec<ComparisonResult> {
    // Folding can map two OCR names onto one key; keep the larger line as the
    // book itself does.
    let mut by_key: HashMap<String, f64> = HashMap::with_capacity(lines.len());
    for l in lines.iter() {
        by_key
            .entry(matcher.key(&l.name).into_owned())
            .and_modify(|v| *v = v.max(l.line))
            .or_insert(l.line);
    }

    projections
        .iter()
        .map(|player| {
            let projected = player.projections.value(&market.field);
            let line = by_key.get(matcher.key(&player.name).as_ref()).copied();

            let (delta, suggestion) = match (line, projected) {
                (None, _) => (None, Suggestion::NoLine),
                (Some(_), None) => (None, Suggestion::MissingProjection),
                (Some(line), Some(projected)) => {
                    let delta = round2(projected.as_f64() - line);
                    (Some(delta), suggest(delta))
                }
            };

            ComparisonResult {
                name: player.name.clone(),
                position: player.position.clone(),
                projected_yards: projected,
                line,
                delta,
                suggestion,
            }
        })
        .collect()
}

/// Order by |delta| descending. Stable, so equal magnitudes keep their input
/// order, and unavailable deltas trail in input order.
pub fn rank(results: &mut [ComparisonResult]) {
    results.sort_by(|a, b| b.magnitude().total_cmp(&a.magnitude()));
}
