// Projection export parsing.
//
// The export is plain text with one value per line. Each player card looks
// like:
//
//   Rank
//   Player
//   1
//   Jane DoeHeadshot
//   <ignored>
//   LionsLionsRB
//   ...
//   WEEK 13 PROJECTIONS
//   10
//   50
//   ...
//
// The parser is an explicit state machine over the line index. Malformed cards
// are reported through the event sink and skipped or truncated; they never
// abort the parse.

use crate::clean::{split_team_position, NameCleaner};
use crate::events::{Event, EventSink};
use crate::number::{coerce, StatValue};
use crate::schema::PositionSchemaTable;
use lazy_static::lazy_static;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const RANK_ANCHOR: &str = "Rank";
pub const PLAYER_ANCHOR: &str = "Player";

/// Lines from the name line to the team/position token.
pub const TEAM_LINE_OFFSET: usize = 2;

lazy_static! {
    static ref WEEK_MARKER: Regex = Regex::new(r"WEEK (\d+) PROJECTIONS").unwrap();
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Field name → value, kept in schema order. A `None` value means the line
/// was present but not numeric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projections {
    fields: Vec<(String, Option<StatValue>)>,
}

impl Projections {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, field: &str, value: Option<StatValue>) {
        self.fields.push((field.to_string(), value));
    }

    /// The numeric value of `field`, or `None` if it is absent or null.
    pub fn value(&self, field: &str) -> Option<StatValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| *value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Projections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// One parsed player card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProjection {
    pub name: String,
    pub team: String,
    pub position: String,
    pub projections: Projections,
}

/// States of the card parser. Each state reads at the current line index and
/// names its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    SeekAnchor,
    ReadRank,
    ReadName,
    SkipFixedGap,
    ReadTeamPosition,
    SeekMarker,
    ReadSchema,
    Done,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ProjectionParser {
    schemas: PositionSchemaTable,
    cleaner: NameCleaner,
    week: Option<u32>,
}

impl ProjectionParser {
    pub fn new(schemas: PositionSchemaTable, cleaner: NameCleaner) -> Self {
        ProjectionParser {
            schemas,
            cleaner,
            week: None,
        }
    }

    /// Only accept `WEEK <week> PROJECTIONS` markers for the given week.
    pub fn with_week(mut self, week: Option<u32>) -> Self {
        self.week = week;
        self
    }

    pub fn parse_text(&self, text: &str, sink: &mut dyn EventSink) -> Vec<PlayerProjection> {
        let lines: Vec<&str> = text.lines().collect();
        self.parse(&lines, sink)
    }

    pub fn parse<S: AsRef<str>>(
        &self,
        lines: &[S],
        sink: &mut dyn EventSink,
    ) -> Vec<PlayerProjection> {
        let lines: Vec<&str> = lines.iter().map(|l| l.as_ref().trim()).collect();
        let mut machine = CardMachine::new(self, &lines, sink);
        machine.run();
        machine.records
    }

    fn is_marker(&self, line: &str) -> bool {
        match WEEK_MARKER.captures(line) {
            Some(caps) => match self.week {
                Some(week) => caps[1].parse::<u32>().is_ok_and(|n| n == week),
                None => true,
            },
            None => false,
        }
    }
}

/// A card being assembled.
#[derive(Debug, Default)]
struct Draft {
    rank: String,
    name: String,
    team: String,
    position: String,
    projections: Projections,
}

impl Draft {
    fn label(&self) -> String {
        if self.name.is_empty() {
            format!("rank {}", self.rank)
        } else {
            format!("rank {} ({})", self.rank, self.name)
        }
    }

    fn finish(self) -> PlayerProjection {
        PlayerProjection {
            name: self.name,
            team: self.team,
            position: self.position,
            projections: self.projections,
        }
    }
}

struct CardMachine<'a, 's> {
    parser: &'a ProjectionParser,
    lines: &'a [&'a str],
    sink: &'s mut dyn EventSink,
    i: usize,
    draft: Option<Draft>,
    records: Vec<PlayerProjection>,
}

impl<'a, 's> CardMachine<'a, 's> {
    fn new(
        parser: &'a ProjectionParser,
        lines: &'a [&'a str],
        sink: &'s mut dyn EventSink,
    ) -> Self {
        CardMachine {
            parser,
            lines,
            sink,
            i: 0,
            draft: None,
            records: Vec::new(),
        }
    }

    fn run(&mut self) {
        let mut state = ParseState::SeekAnchor;
        while state != ParseState::Done {
            state = self.step(state);
        }
    }

    fn step(&mut self, state: ParseState) -> ParseState {
        match state {
            ParseState::SeekAnchor => self.seek_anchor(),
            ParseState::ReadRank => self.read_rank(),
            ParseState::ReadName => self.read_name(),
            ParseState::SkipFixedGap => self.skip_fixed_gap(),
            ParseState::ReadTeamPosition => self.read_team_position(),
            ParseState::SeekMarker => self.seek_marker(),
            ParseState::ReadSchema => self.read_schema(),
            ParseState::Done => ParseState::Done,
        }
    }

    fn line(&self) -> Option<&'a str> {
        self.lines.get(self.i).copied()
    }

    fn draft_mut(&mut self) -> &mut Draft {
        self.draft.get_or_insert_with(Draft::default)
    }

    /// Emit the current draft as-is after the input ran out.
    fn finish_partial(&mut self, missing: &str) -> ParseState {
        let draft = self.draft.take().unwrap_or_default();
        self.sink.emit(Event::malformed(format!(
            "{}: input ended before {missing}, keeping partial record",
            draft.label()
        )));
        self.records.push(draft.finish());
        ParseState::Done
    }

    fn seek_anchor(&mut self) -> ParseState {
        while self.i + 1 < self.lines.len() {
            if self.lines[self.i] == RANK_ANCHOR && self.lines[self.i + 1] == PLAYER_ANCHOR {
                self.i += 2;
                return ParseState::ReadRank;
            }
            self.i += 1;
        }
        self.i = self.lines.len();
        ParseState::Done
    }

    fn read_rank(&mut self) -> ParseState {
        let Some(line) = self.line() else {
            self.sink.emit(Event::malformed(format!(
                "line {}: input ended after `{RANK_ANCHOR}`/`{PLAYER_ANCHOR}` anchor",
                self.i + 1
            )));
            return ParseState::Done;
        };
        if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
            self.sink.emit(Event::malformed(format!(
                "line {}: expected a rank number after anchor, found '{line}'",
                self.i + 1
            )));
            return ParseState::SeekAnchor;
        }
        self.draft = Some(Draft {
            rank: line.to_string(),
            ..Draft::default()
        });
        self.i += 1;
        ParseState::ReadName
    }

    fn read_name(&mut self) -> ParseState {
        let Some(line) = self.line() else {
            return self.finish_partial("the player name");
        };
        let name = self.parser.cleaner.clean(line);
        self.draft_mut().name = name;
        ParseState::SkipFixedGap
    }

    fn skip_fixed_gap(&mut self) -> ParseState {
        self.i += TEAM_LINE_OFFSET;
        ParseState::ReadTeamPosition
    }

    fn read_team_position(&mut self) -> ParseState {
        let Some(line) = self.line() else {
            self.i = self.lines.len();
            return self.finish_partial("the team/position line");
        };
        let (team, position) = split_team_position(line);
        let draft = self.draft_mut();
        draft.team = team;
        draft.position = position.unwrap_or_default();
        self.i += 1;
        ParseState::SeekMarker
    }

    /// The scan is bounded only by the input. Running into the next card's
    /// anchor is reported, since that card's marker and values will be read
    /// into the current record.
    fn seek_marker(&mut self) -> ParseState {
        while let Some(line) = self.line() {
            if line == RANK_ANCHOR && self.lines.get(self.i + 1) == Some(&PLAYER_ANCHOR) {
                let label = self.draft.as_ref().map(Draft::label).unwrap_or_default();
                self.sink.emit(Event::malformed(format!(
                    "{label}: no WEEK projections marker before the next card at line {}, \
                     its values will be read into this record",
                    self.i + 1
                )));
            }
            self.i += 1;
            if self.parser.is_marker(line) {
                return ParseState::ReadSchema;
            }
        }
        let draft = self.draft.take().unwrap_or_default();
        self.sink.emit(Event::malformed(format!(
            "{}: no WEEK projections marker before end of input",
            draft.label()
        )));
        self.records.push(draft.finish());
        ParseState::Done
    }

    fn read_schema(&mut self) -> ParseState {
        let mut draft = self.draft.take().unwrap_or_default();
        let Some(fields) = self.parser.schemas.schema(&draft.position) else {
            self.sink.emit(Event::malformed(format!(
                "{}: no schema for position '{}', projections left empty",
                draft.label(),
                draft.position
            )));
            self.records.push(draft.finish());
            return ParseState::SeekAnchor;
        };

        for field in fields {
            let Some(line) = self.line() else {
                self.sink.emit(Event::malformed(format!(
                    "{}: input ended after {} of {} {} fields",
                    draft.label(),
                    draft.projections.len(),
                    fields.len(),
                    draft.position
                )));
                break;
            };
            let value = coerce(line);
            if value.is_none() {
                self.sink.emit(Event::malformed(format!(
                    "{}: field `{field}` is not a number: '{line}'",
                    draft.label()
                )));
            }
            draft.projections.push(field, value);
            self.i += 1;
        }

        self.records.push(draft.finish());
        ParseState::SeekAnchor
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    fn parser() -> ProjectionParser {
        ProjectionParser::default()
    }

    fn card(rank: &str, name: &str, team_pos: &str, values: &[&str]) -> Vec<String> {
        let mut lines = vec![
            RANK_ANCHOR.to_string(),
            PLAYER_ANCHOR.to_string(),
            rank.to_string(),
            format!("{name}Headshot"),
            "Bye 8".to_string(),
            team_pos.to_string(),
            "Opp: CHI".to_string(),
            "WEEK 13 PROJECTIONS".to_string(),
        ];
        lines.extend(values.iter().map(|v| v.to_string()));
        lines
    }

    const RB_VALUES: &[&str] = &["10", "50", "5.0", "1", "3", "55.0", "0", "12.3"];

    // -- Whole-file parsing --

    #[test]
    fn parses_single_rb_card() {
        let lines = card("1", "Jane Doe", "LionsLionsRB", RB_VALUES);
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse(&lines, &mut events);

        assert!(events.is_empty(), "unexpected events: {events:?}");
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.name, "Jane Doe");
        assert_eq!(rec.team, "LionsLions");
        assert_eq!(rec.position, "RB");
        assert_eq!(rec.projections.len(), 8);
        assert_eq!(
            rec.projections.keys().collect::<Vec<_>>(),
            PositionSchemaTable::default().schema("RB").unwrap()
        );
        assert_eq!(rec.projections.value("carries"), Some(StatValue::Int(10)));
        assert_eq!(
            rec.projections.value("receiving_yards"),
            Some(StatValue::Float(55.0))
        );
        assert_eq!(
            rec.projections.value("fantasy_points"),
            Some(StatValue::Float(12.3))
        );
    }

    #[test]
    fn parses_consecutive_cards_of_mixed_positions() {
        let mut lines = card("1", "Jane Doe", "LionsLionsRB", RB_VALUES);
        lines.push("Advertisement".into());
        lines.extend(card(
            "2",
            "Amon-Ra St. Brown",
            "LionsLionsWR",
            &["9", "7", "82", "11.7", "1", "0", "0", "0", "17.2"],
        ));
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse(&lines, &mut events);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Amon-Ra St. Brown");
        assert_eq!(records[1].position, "WR");
        assert_eq!(records[1].projections.len(), 9);
        assert_eq!(
            records[1].projections.value("receiving_yards"),
            Some(StatValue::Int(82))
        );
        assert!(events.is_empty());
    }

    #[test]
    fn parse_text_trims_lines() {
        let text = "  Rank \nPlayer\n 3 \n Jane DoeHeadshot \nx\n LionsLionsTE \nWEEK 2 PROJECTIONS\n 4\n3\n40\n";
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse_text(text, &mut events);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Jane Doe");
        assert_eq!(records[0].position, "TE");
        // Input ends after 3 of 9 TE fields.
        assert_eq!(records[0].projections.len(), 3);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse::<&str>(&[], &mut events);
        assert!(records.is_empty());
        assert!(events.is_empty());
    }

    // -- Malformed cards --

    #[test]
    fn non_numeric_rank_skips_card() {
        let mut lines = card("1", "Jane Doe", "LionsLionsRB", RB_VALUES);
        lines[2] = "N/A".into();
        lines.extend(card("2", "John Roe", "BearsBearsRB", RB_VALUES));
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse(&lines, &mut events);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "John Roe");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::MalformedRecord);
    }

    #[test]
    fn missing_marker_yields_empty_projections() {
        let lines = vec!["Rank", "Player", "1", "Jane DoeHeadshot", "x", "LionsLionsRB", "10", "50"];
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse(&lines, &mut events);

        assert_eq!(records.len(), 1);
        assert!(records[0].projections.is_empty());
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("marker"));
    }

    #[test]
    fn missing_marker_before_next_card_is_reported() {
        let mut lines: Vec<String> = [
            "Rank",
            "Player",
            "1",
            "Jane DoeHeadshot",
            "Bye 8",
            "LionsLionsRB",
            "Opp: CHI",
        ]
        .iter()
        .map(|l| l.to_string())
        .collect();
        let wr_values = ["8", "6", "70", "11.7", "1", "0", "0", "0", "15.2"];
        lines.extend(card("2", "John Roe", "LionsLionsWR", &wr_values));
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse(&lines, &mut events);

        // John Roe's marker ends Jane Doe's scan, so his card is absorbed.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Jane Doe");
        assert_eq!(records[0].position, "RB");
        assert_eq!(records[0].projections.len(), 8);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::MalformedRecord);
        assert!(events[0].message.contains("Jane Doe"));
        assert!(events[0].message.contains("next card at line 8"));
    }

    #[test]
    fn unknown_position_yields_empty_projections_and_continues() {
        let mut lines = card("1", "Kicker Guy", "LionsLionsPK", &["2", "3"]);
        lines.extend(card("2", "Jane Doe", "LionsLionsRB", RB_VALUES));
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse(&lines, &mut events);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position, "PK");
        assert!(records[0].projections.is_empty());
        assert_eq!(records[1].projections.len(), 8);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("PK"));
    }

    #[test]
    fn truncated_values_yield_prefix() {
        let lines = card("1", "Jane Doe", "LionsLionsRB", &["10", "50", "5.0"]);
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse(&lines, &mut events);

        assert_eq!(records[0].projections.keys().collect::<Vec<_>>(), ["carries", "yards", "average"]);
        assert!(!records[0].projections.contains("receiving_yards"));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn unparsable_value_stored_as_null() {
        let mut values = RB_VALUES.to_vec();
        values[5] = "--";
        let lines = card("1", "Jane Doe", "LionsLionsRB", &values);
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse(&lines, &mut events);

        let proj = &records[0].projections;
        assert_eq!(proj.len(), 8);
        assert!(proj.contains("receiving_yards"));
        assert_eq!(proj.value("receiving_yards"), None);
        assert_eq!(events.len(), 1);
        assert!(events[0].message.contains("receiving_yards"));
    }

    #[test]
    fn input_ending_before_team_line_keeps_partial_record() {
        let lines = vec!["Rank", "Player", "7", "Jane DoeHeadshot", "x"];
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse(&lines, &mut events);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Jane Doe");
        assert_eq!(records[0].team, "");
        assert!(records[0].projections.is_empty());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn input_ending_after_anchor_produces_no_record() {
        let lines = vec!["Rank", "Player"];
        let mut events: Vec<Event> = Vec::new();
        let records = parser().parse(&lines, &mut events);
        assert!(records.is_empty());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn pinned_week_ignores_other_markers() {
        let lines = card("1", "Jane Doe", "LionsLionsRB", RB_VALUES);
        let mut events: Vec<Event> = Vec::new();
        let records = parser().with_week(Some(14)).parse(&lines, &mut events);
        assert!(records[0].projections.is_empty());

        let mut events: Vec<Event> = Vec::new();
        let records = parser().with_week(Some(13)).parse(&lines, &mut events);
        assert_eq!(records[0].projections.len(), 8);
    }

    // -- Individual states --

    fn machine_at<'a, 's>(
        parser: &'a ProjectionParser,
        lines: &'a [&'a str],
        sink: &'s mut Vec<Event>,
        i: usize,
    ) -> CardMachine<'a, 's> {
        let mut m = CardMachine::new(parser, lines, sink);
        m.i = i;
        m
    }

    #[test]
    fn seek_anchor_requires_both_lines_in_order() {
        let p = parser();
        let lines = ["Player", "Rank", "x", "Rank", "Player", "1"];
        let mut sink: Vec<Event> = Vec::new();
        let mut m = machine_at(&p, &lines, &mut sink, 0);
        assert_eq!(m.seek_anchor(), ParseState::ReadRank);
        assert_eq!(m.i, 5);
    }

    #[test]
    fn seek_anchor_without_match_is_done() {
        let p = parser();
        let lines = ["Rank", "x", "Player"];
        let mut sink: Vec<Event> = Vec::new();
        let mut m = machine_at(&p, &lines, &mut sink, 0);
        assert_eq!(m.seek_anchor(), ParseState::Done);
    }

    #[test]
    fn read_rank_rejects_non_digits_without_consuming() {
        let p = parser();
        let lines = ["1a"];
        let mut sink: Vec<Event> = Vec::new();
        let mut m = machine_at(&p, &lines, &mut sink, 0);
        assert_eq!(m.read_rank(), ParseState::SeekAnchor);
        assert_eq!(m.i, 0);
        assert!(m.draft.is_none());
        drop(m);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn name_gap_and_team_states_advance_index() {
        let p = parser();
        let lines = ["Jane DoeHeadshot", "noise", "LionsLionsQB"];
        let mut sink: Vec<Event> = Vec::new();
        let mut m = machine_at(&p, &lines, &mut sink, 0);
        assert_eq!(m.read_name(), ParseState::SkipFixedGap);
        assert_eq!(m.skip_fixed_gap(), ParseState::ReadTeamPosition);
        assert_eq!(m.i, 2);
        assert_eq!(m.read_team_position(), ParseState::SeekMarker);
        let draft = m.draft.as_ref().unwrap();
        assert_eq!(draft.name, "Jane Doe");
        assert_eq!(draft.team, "LionsLions");
        assert_eq!(draft.position, "QB");
        assert_eq!(m.i, 3);
    }

    #[test]
    fn seek_marker_lands_after_marker() {
        let p = parser();
        let lines = ["Opp", "WEEK 13 PROJECTIONS", "10"];
        let mut sink: Vec<Event> = Vec::new();
        let mut m = machine_at(&p, &lines, &mut sink, 0);
        assert_eq!(m.seek_marker(), ParseState::ReadSchema);
        assert_eq!(m.i, 2);
    }

    #[test]
    fn seek_marker_warns_when_crossing_an_anchor() {
        let p = parser();
        let lines = ["Opp", "Rank", "Player", "2", "WEEK 13 PROJECTIONS", "10"];
        let mut sink: Vec<Event> = Vec::new();
        let mut m = machine_at(&p, &lines, &mut sink, 0);
        m.draft = Some(Draft {
            rank: "1".into(),
            name: "Jane Doe".into(),
            ..Draft::default()
        });
        assert_eq!(m.seek_marker(), ParseState::ReadSchema);
        assert_eq!(m.i, 5);
        drop(m);
        assert_eq!(sink.len(), 1);
        assert!(sink[0].message.starts_with("rank 1 (Jane Doe)"));
    }

    #[test]
    fn read_schema_consumes_exactly_schema_length() {
        let p = parser();
        let lines = [
            "20", "15", "180", "2", "1", "4", "0", "18.5", "Rank",
        ];
        let mut sink: Vec<Event> = Vec::new();
        let mut m = machine_at(&p, &lines, &mut sink, 0);
        m.draft = Some(Draft {
            rank: "1".into(),
            name: "Q".into(),
            position: "QB".into(),
            ..Draft::default()
        });
        assert_eq!(m.read_schema(), ParseState::SeekAnchor);
        assert_eq!(m.i, 8);
        assert_eq!(m.records[0].projections.len(), 8);
        assert_eq!(
            m.records[0].projections.value("interceptions"),
            Some(StatValue::Int(2))
        );
    }

    #[test]
    fn projections_serialize_in_schema_order() {
        let lines = card("1", "Jane Doe", "LionsLionsRB", RB_VALUES);
        let records = parser().parse(&lines, &mut Vec::<Event>::new());
        let json = serde_json::to_string(&records[0].projections).unwrap();
        assert!(json.starts_with(r#"{"carries":10,"yards":50,"average":5.0"#));
    }
}
