use crate::picker::selection::DateSelection;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const DATE_FORMAT_MESSAGE: &str = "Date must be in format YYYY-MM-DD, e.g., 1987-05-22!";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateFieldError {
    #[error("{}", DATE_FORMAT_MESSAGE)]
    Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Start,
    End,
}

/// Year 2000..=2100 with two-digit month and day; the calendar check
/// happens afterwards.
static STRICT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(20[0-9]{2}|2100)-([0-9]{2})-([0-9]{2})$").expect("strict date pattern")
});

static DATE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0?[1-9]|[12][0-9]|3[01])$")
        .expect("date shape pattern")
});

/// Parses `YYYY-MM-DD` with a year in 2000..=2100 and two-digit month and day.
/// Dates that do not exist on the calendar, like 2024-02-30, are rejected.
pub fn parse_strict_date(text: &str) -> Option<NaiveDate> {
    let caps = STRICT_DATE.captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Shape check applied when a field loses focus. Looser than
/// [`parse_strict_date`]: the day may have one digit and any year is allowed.
pub fn validate_date_text(text: &str) -> Result<(), DateFieldError> {
    if DATE_SHAPE.is_match(text) {
        Ok(())
    } else {
        Err(DateFieldError::Format)
    }
}

/// Text of the start and end inputs, kept in step with a [`DateSelection`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateFields {
    pub start_text: String,
    pub end_text: String,
    pub error: Option<String>,
}

impl DateFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, kind: FieldKind) -> &str {
        match kind {
            FieldKind::Start => &self.start_text,
            FieldKind::End => &self.end_text,
        }
    }

    /// Replaces the text of one field. A complete valid date is fed to the
    /// selection as a click; when that changes the selection both fields
    /// are rewritten from it.
    pub fn input(&mut self, kind: FieldKind, text: &str, selection: &mut DateSelection) {
        match kind {
            FieldKind::Start => self.start_text = text.to_string(),
            FieldKind::End => self.end_text = text.to_string(),
        }
        if let Some(date) = parse_strict_date(text) {
            let before = selection.clone();
            selection.handle_day_click(date);
            if *selection != before {
                self.sync_from(selection);
            }
        }
    }

    /// Validates the field's text on focus loss. An empty field is accepted.
    /// The selection is never touched here.
    pub fn blur(&mut self, kind: FieldKind) -> Result<(), String> {
        let text = self.text(kind);
        if text.is_empty() {
            self.error = None;
            return Ok(());
        }
        match validate_date_text(text) {
            Ok(()) => {
                self.error = None;
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.error = Some(message.clone());
                Err(message)
            }
        }
    }

    pub fn sync_from(&mut self, selection: &DateSelection) {
        self.start_text = format_date(selection.start_date());
        self.end_text = format_date(selection.end_date());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
