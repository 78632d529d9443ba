// Sportsbook line recovery from raw OCR text.
//
// Screenshots usually OCR into a header line carrying `Name (POS)` followed,
// some lines later, by a data line such as `70.5 Receiving Yards`. Lines are
// first classified into tokens, then paired, then matched against the
// extraction pattern.

use crate::events::{Event, EventSink};
use crate::market::DEFAULT_PHRASE;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerLine {
    pub name: String,
    pub position: String,
    pub line: f64,
}

/// Name → line, at most one entry per name. Re-inserting a name keeps the
/// larger threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineBook {
    entries: BTreeMap<String, PlayerLine>,
}

impl LineBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `line`, keeping the existing entry unless the new value is
    /// strictly larger. Returns true if the book changed.
    pub fn insert(&mut self, line: PlayerLine) -> bool {
        match self.entries.get(&line.name) {
            Some(existing) if existing.line >= line.line => false,
            _ => {
                self.entries.insert(line.name.clone(), line);
                true
            }
        }
    }

    /// Fold another book in with the same keep-the-maximum rule.
    pub fn merge(&mut self, other: LineBook) {
        for line in other.entries.into_values() {
            self.insert(line);
        }
    }

    pub fn get(&self, name: &str) -> Option<&PlayerLine> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerLine> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PlayerLine> for LineBook {
    fn from_iter<I: IntoIterator<Item = PlayerLine>>(iter: I) -> Self {
        let mut book = LineBook::new();
        for line in iter {
            book.insert(line);
        }
        book
    }
}

/// Classification of one trimmed, non-empty OCR line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineToken<'a> {
    /// `Name (POS)`: parentheses but no market phrase.
    Header(&'a str),
    /// Market phrase without parentheses.
    Data(&'a str),
    /// Header and data already on one line.
    Complete(&'a str),
    Noise(&'a str),
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

lazy_static! {
    static ref DEFAULT_PATTERN: Regex = Regex::new(&pattern_source(DEFAULT_PHRASE)).unwrap();
}

/// `<name> (<pos>) <number> <phrase>`, anchored at the start of the line.
fn pattern_source(phrase: &str) -> String {
    format!(r"^(.+?)\s\((.+?)\)\s([\d.]+)\s{}", regex::escape(phrase))
}

#[derive(Debug, Clone)]
pub struct LineNormalizer {
    phrase: String,
    pattern: Regex,
}

impl Default for LineNormalizer {
    fn default() -> Self {
        LineNormalizer {
            phrase: DEFAULT_PHRASE.to_string(),
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}

impl LineNormalizer {
    pub fn new(phrase: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&pattern_source(phrase))?;
        Ok(LineNormalizer {
            phrase: phrase.to_string(),
            pattern,
        })
    }

    /// Phase 1a: split into trimmed non-empty lines and classify each.
    pub fn classify<'t>(&self, raw_text: &'t str) -> Vec<LineToken<'t>> {
        raw_text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| {
                let header = l.contains('(') && l.contains(')');
                let data = l.contains(self.phrase.as_str());
                match (header, data) {
                    (true, true) => LineToken::Complete(l),
                    (true, false) => LineToken::Header(l),
                    (false, true) => LineToken::Data(l),
                    (false, false) => LineToken::Noise(l),
                }
            })
            .collect()
    }

    /// Phase 1b: pair each data line with the most recent unconsumed header.
    ///
    /// A header that is followed by another header (or a complete line)
    /// before any data is dropped, as is data with no header in front of it.
    pub fn pair(tokens: &[LineToken<'_>]) -> Vec<String> {
        let mut combined = Vec::new();
        let mut pending: Option<&str> = None;
        for token in tokens {
            match *token {
                LineToken::Header(h) => pending = Some(h),
                LineToken::Data(d) => {
                    if let Some(h) = pending.take() {
                        combined.push(format!("{h} {d}"));
                    }
                }
                LineToken::Complete(c) => {
                    pending = None;
                    combined.push(c.to_string());
                }
                LineToken::Noise(_) => {}
            }
        }
        combined
    }

    /// Phase 2: pull name, position and threshold out of a combined line.
    pub fn extract(&self, combined: &str) -> Option<PlayerLine> {
        let caps = self.pattern.captures(combined)?;
        let line = caps[3].parse::<f64>().ok().filter(|v| v.is_finite())?;
        Some(PlayerLine {
            name: caps[1].trim().to_string(),
            position: caps[2].trim().to_string(),
            line,
        })
    }

    pub fn normalize(&self, raw_text: &str, sink: &mut dyn EventSink) -> LineBook {
        let tokens = self.classify(raw_text);
        let mut book = LineBook::new();
        for combined in Self::pair(&tokens) {
            match self.extract(&combined) {
                Some(line) => {
                    book.insert(line);
                }
                None => sink.emit(Event::unmatched(format!(
                    "dropping OCR line that does not match `<name> (<pos>) <number> {}`: '{combined}'",
                    self.phrase
                ))),
            }
        }
        book
    }
}
