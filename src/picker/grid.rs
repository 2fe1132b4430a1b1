use crate::picker::selection::DateSelection;
use chrono::{Datelike, NaiveDate};

pub const WEEKDAY_HEADER: &str = "Mo Tu We Th Fr Sa Su";

/// One cell of a month grid. Padding cells from the previous month have no date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: Option<NaiveDate>,
    pub day_of_month: u32,
    pub is_in_range: bool,
}

impl DayCell {
    pub fn is_padding(&self) -> bool {
        self.date.is_none()
    }
}

/// Displayed month, `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32,
}

impl MonthYear {
    pub fn new(year: i32, month: u32) -> Self {
        MonthYear {
            year,
            month: month.clamp(1, 12),
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        MonthYear {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn change_month(&mut self, delta: i32) {
        let total = self.month as i32 - 1 + delta;
        self.year += total.div_euclid(12);
        self.month = total.rem_euclid(12) as u32 + 1;
    }

    pub fn next(&self) -> MonthYear {
        let mut n = *self;
        n.change_month(1);
        n
    }

    pub fn title(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(f), Some(n)) => n.signed_duration_since(f).num_days() as u32,
        _ => 0,
    }
}

/// Cells for one month view, weeks starting on Monday. With
/// `include_leading_days` the grid opens with the tail of the previous
/// month so day 1 sits under its weekday.
pub fn generate_days_in_month(
    year: i32,
    month: u32,
    include_leading_days: bool,
    selection: &DateSelection,
) -> Vec<DayCell> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let mut cells = Vec::with_capacity(42);

    if include_leading_days {
        let prev = first.pred_opt().map(|p| p.day()).unwrap_or(31);
        let leading = first.weekday().num_days_from_monday();
        for day in (prev + 1 - leading)..=prev {
            cells.push(DayCell {
                date: None,
                day_of_month: day,
                is_in_range: false,
            });
        }
    }

    for day in 1..=days_in_month(year, month) {
        let date = NaiveDate::from_ymd_opt(year, month, day);
        cells.push(DayCell {
            date,
            day_of_month: day,
            is_in_range: date.is_some_and(|d| selection.is_in_range(d)),
        });
    }
    cells
}
