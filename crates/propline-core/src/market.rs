// The wagering market being reconciled.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PHRASE: &str = "Receiving Yards";
pub const DEFAULT_FIELD: &str = "receiving_yards";

/// Pairs the literal phrase that identifies a market in OCR text with the
/// projection field it is compared against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub phrase: String,
    pub field: String,
}

impl Default for Market {
    fn default() -> Self {
        Market {
            phrase: DEFAULT_PHRASE.to_string(),
            field: DEFAULT_FIELD.to_string(),
        }
    }
}
