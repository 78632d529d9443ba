// Position → ordered projection field names.
//
// The export lists a fixed sequence of numbers after the week marker; which
// statistic each number is depends on the player's position. The table can be
// loaded from a versioned `schemas.toml` so that new positions need no parser
// changes.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub const SCHEMA_VERSION: u32 = 1;

/// Position codes are always the last two characters of the team token.
pub const POSITION_CODE_LEN: usize = 2;

const RB_FIELDS: &[&str] = &[
    "carries",
    "yards",
    "average",
    "td",
    "receptions",
    "receiving_yards",
    "receiving_td",
    "fantasy_points",
];

const PASS_CATCHER_FIELDS: &[&str] = &[
    "targets",
    "receptions",
    "receiving_yards",
    "average",
    "td",
    "carries",
    "rush_yards",
    "rush_td",
    "fantasy_points",
];

const QB_FIELDS: &[&str] = &[
    "completions",
    "yards",
    "td",
    "interceptions",
    "carries",
    "rush_yards",
    "rush_td",
    "fantasy_points",
];

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("failed to parse schema table: {0}")]
    Parse(String),

    #[error("unsupported schema version {found} (expected {expected})", expected = SCHEMA_VERSION)]
    Version { found: u32 },

    #[error("schema table defines no positions")]
    Empty,

    #[error("position code `{0}` must be exactly {len} characters", len = POSITION_CODE_LEN)]
    PositionCode(String),

    #[error("position `{0}` has an empty field list")]
    NoFields(String),

    #[error("position `{position}` has an empty field name at index {index}")]
    BlankField { position: String, index: usize },

    #[error("position `{position}` lists field `{field}` more than once")]
    DuplicateField { position: String, field: String },
}

/// Raw deserialization target for `schemas.toml`.
#[derive(Debug, Deserialize)]
struct SchemaFile {
    version: u32,
    positions: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSchemaTable {
    version: u32,
    positions: BTreeMap<String, Vec<String>>,
}

impl Default for PositionSchemaTable {
    /// The canonical RB / WR / TE / QB layouts.
    fn default() -> Self {
        let owned = |fields: &[&str]| fields.iter().map(|f| f.to_string()).collect::<Vec<_>>();
        let mut positions = BTreeMap::new();
        positions.insert("RB".to_string(), owned(RB_FIELDS));
        positions.insert("WR".to_string(), owned(PASS_CATCHER_FIELDS));
        positions.insert("TE".to_string(), owned(PASS_CATCHER_FIELDS));
        positions.insert("QB".to_string(), owned(QB_FIELDS));
        PositionSchemaTable {
            version: SCHEMA_VERSION,
            positions,
        }
    }
}

impl PositionSchemaTable {
    /// Build and validate a table from explicit entries.
    pub fn new(
        version: u32,
        positions: BTreeMap<String, Vec<String>>,
    ) -> Result<Self, SchemaError> {
        let table = PositionSchemaTable { version, positions };
        table.validate()?;
        Ok(table)
    }

    /// Parse and validate a `schemas.toml` document.
    pub fn from_toml_str(text: &str) -> Result<Self, SchemaError> {
        let file: SchemaFile =
            toml::from_str(text).map_err(|e| SchemaError::Parse(e.to_string()))?;
        Self::new(file.version, file.positions)
    }

    pub fn schema(&self, position: &str) -> Option<&[String]> {
        self.positions.get(position).map(Vec::as_slice)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn positions(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.version != SCHEMA_VERSION {
            return Err(SchemaError::Version {
                found: self.version,
            });
        }
        if self.positions.is_empty() {
            return Err(SchemaError::Empty);
        }
        for (position, fields) in &self.positions {
            if position.chars().count() != POSITION_CODE_LEN {
                return Err(SchemaError::PositionCode(position.clone()));
            }
            if fields.is_empty() {
                return Err(SchemaError::NoFields(position.clone()));
            }
            for (index, field) in fields.iter().enumerate() {
                if field.trim().is_empty() {
                    return Err(SchemaError::BlankField {
                        position: position.clone(),
                        index,
                    });
                }
                if fields[..index].contains(field) {
                    return Err(SchemaError::DuplicateField {
                        position: position.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
