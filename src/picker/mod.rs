pub mod field;
pub mod focus;
pub mod grid;
pub mod selection;

pub use field::{parse_strict_date, DateFields, FieldKind};
pub use focus::{FocusOutcome, GridFocus, NavKey};
pub use grid::{generate_days_in_month, DayCell, MonthYear, WEEKDAY_HEADER};
pub use selection::{DateSelection, SelectionState};
