use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    StartSelected,
    RangeSelected,
}

/// Two-click date range selection.
///
/// A first click sets the start. A later click sets the end. Any other
/// click (on or before the start, or once a range is complete) starts over
/// from the clicked day, so `start < end` holds whenever both are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateSelection {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    selected_day: Option<NaiveDate>,
}

impl DateSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        match (self.start_date, self.end_date) {
            (None, _) => SelectionState::Empty,
            (Some(_), None) => SelectionState::StartSelected,
            (Some(_), Some(_)) => SelectionState::RangeSelected,
        }
    }

    pub fn handle_day_click(&mut self, date: NaiveDate) {
        match (self.start_date, self.end_date) {
            (Some(start), None) if date > start => {
                self.end_date = Some(date);
            }
            _ => {
                self.start_date = Some(date);
                self.end_date = None;
            }
        }
        self.selected_day = Some(date);
    }

    pub fn cancel_selected_dates(&mut self) {
        *self = Self::default();
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// The most recently clicked day.
    pub fn selected_day(&self) -> Option<NaiveDate> {
        self.selected_day
    }

    /// The committed range, present only in `RangeSelected`.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start_date?, self.end_date?))
    }

    pub fn is_in_range(&self, date: NaiveDate) -> bool {
        self.range()
            .is_some_and(|(start, end)| date >= start && date <= end)
    }
}
