// Core reconciliation logic: projection export parsing, OCR line recovery,
// and the projection vs. line comparison. No file or process I/O lives here.

pub mod clean;
pub mod compare;
pub mod events;
pub mod lines;
pub mod market;
pub mod matching;
pub mod number;
pub mod projections;
pub mod schema;

pub use compare::{compare, rank, ComparisonResult, Suggestion};
pub use events::{Event, EventKind, EventSink, Severity, TracingSink};
pub use lines::{LineBook, LineNormalizer, PlayerLine};
pub use market::Market;
pub use matching::{FoldStep, NameMatcher};
pub use number::{coerce, StatValue};
pub use projections::{PlayerProjection, ProjectionParser, Projections};
pub use schema::{PositionSchemaTable, SchemaError};
