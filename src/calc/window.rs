use crate::data::Trip;
use chrono::{Days, NaiveDate};

/// Days a traveller may spend inside the area per window.
pub const ALLOWANCE_DAYS: i64 = 90;
/// Length of the trailing window, in days.
pub const WINDOW_DAYS: i64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRule {
    pub allowance_days: i64,
    pub window_days: i64,
}

impl Default for StayRule {
    fn default() -> Self {
        StayRule {
            allowance_days: ALLOWANCE_DAYS,
            window_days: WINDOW_DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceStatus {
    /// Days still available, `0..=allowance`.
    Remaining(i64),
    /// Days spent beyond the allowance.
    Overstay(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountingSnapshot {
    /// End date of the most recently started trip. `None` when there are no trips.
    pub anchor: Option<NaiveDate>,
    pub window_start: Option<NaiveDate>,
    /// Trips that fall inside `[window_start, anchor]`, most recent first.
    pub window_trips: Vec<Trip>,
    pub total_days_used: i64,
    /// May go negative, see [`AccountingSnapshot::status`].
    pub days_remaining: i64,
    /// Day the oldest relevant trip leaves the window and the full allowance is back.
    pub next_full_refill: Option<NaiveDate>,
}

impl AccountingSnapshot {
    fn empty(rule: StayRule) -> Self {
        AccountingSnapshot {
            anchor: None,
            window_start: None,
            window_trips: Vec::new(),
            total_days_used: 0,
            days_remaining: rule.allowance_days,
            next_full_refill: None,
        }
    }

    pub fn status(&self) -> AllowanceStatus {
        if self.days_remaining < 0 {
            AllowanceStatus::Overstay(self.days_remaining.abs())
        } else {
            AllowanceStatus::Remaining(self.days_remaining)
        }
    }

    pub fn is_overstay(&self) -> bool {
        self.days_remaining < 0
    }
}

/// Inclusive day count of a trip under the nights convention: `end - start`,
/// never negative.
pub fn count_days(trip: &Trip) -> i64 {
    count_days_between(trip.start_date, trip.end_date)
}

pub fn count_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().max(0)
}

/// Accounting snapshot under the standard 90/180 rule.
#[cfg(test)]
pub fn relevant_window(trips: &[Trip]) -> AccountingSnapshot {
    relevant_window_with(trips, StayRule::default())
}

/// Builds the trailing window anchored at the end date of the latest-starting
/// trip (not at today) and totals the days spent inside it.
pub fn relevant_window_with(trips: &[Trip], rule: StayRule) -> AccountingSnapshot {
    if trips.is_empty() {
        return AccountingSnapshot::empty(rule);
    }

    let mut sorted: Vec<&Trip> = trips.iter().collect();
    sorted.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    let anchor = sorted[0].end_date;
    let span = Days::new(rule.window_days.max(0) as u64);
    let window_start = anchor.checked_sub_days(span).unwrap_or(NaiveDate::MIN);

    let window_trips: Vec<Trip> = sorted
        .into_iter()
        .filter(|t| t.start_date >= window_start && t.end_date <= anchor)
        .cloned()
        .collect();

    let total_days_used: i64 = window_trips.iter().map(count_days).sum();

    AccountingSnapshot {
        anchor: Some(anchor),
        window_start: Some(window_start),
        window_trips,
        total_days_used,
        days_remaining: rule.allowance_days - total_days_used,
        next_full_refill: anchor.checked_add_days(span),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Country;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn trip(id: &str, start: NaiveDate, end: NaiveDate) -> Trip {
        Trip::new(id, "user-1", Country::France, start, end)
    }

    #[test]
    fn test_count_days_nine_nights() {
        let t = trip("a", d(2023, 1, 1), d(2023, 1, 10));
        assert_eq!(count_days(&t), 9);
    }

    #[test]
    fn test_count_days_same_day_is_zero() {
        let t = trip("a", d(2023, 1, 1), d(2023, 1, 1));
        assert_eq!(count_days(&t), 0);
    }

    #[test]
    fn test_count_days_clamps_reversed_range() {
        let t = trip("a", d(2023, 1, 10), d(2023, 1, 1));
        assert_eq!(count_days(&t), 0);
    }

    #[test]
    fn test_count_days_across_dst_change() {
        // Last Sunday of March: calendar days only, no hour drift.
        let t = trip("a", d(2024, 3, 30), d(2024, 4, 2));
        assert_eq!(count_days(&t), 3);
    }

    #[test]
    fn test_empty_trip_list_reports_full_allowance() {
        let snap = relevant_window(&[]);
        assert!(snap.window_trips.is_empty());
        assert_eq!(snap.total_days_used, 0);
        assert_eq!(snap.days_remaining, 90);
        assert_eq!(snap.next_full_refill, None);
        assert_eq!(snap.anchor, None);
        assert_eq!(snap.status(), AllowanceStatus::Remaining(90));
    }

    #[test]
    fn test_window_anchored_at_latest_trip() {
        let trips = vec![
            trip("jan", d(2023, 1, 1), d(2023, 1, 10)),
            trip("jun", d(2023, 6, 1), d(2023, 6, 11)),
        ];
        let snap = relevant_window(&trips);
        assert_eq!(snap.anchor, Some(d(2023, 6, 11)));
        assert_eq!(snap.window_start, Some(d(2022, 12, 13)));
        assert_eq!(snap.window_trips.len(), 2);
        assert_eq!(snap.total_days_used, 19);
        assert_eq!(snap.days_remaining, 71);
        assert_eq!(snap.next_full_refill, Some(d(2023, 12, 8)));
    }

    #[test]
    fn test_window_sorts_unordered_input() {
        // Caller passes oldest first; the engine must still anchor on June.
        let trips = vec![
            trip("jan", d(2023, 1, 1), d(2023, 1, 10)),
            trip("jun", d(2023, 6, 1), d(2023, 6, 11)),
        ];
        let snap = relevant_window(&trips);
        assert_eq!(snap.window_trips[0].id, "jun");
        assert_eq!(snap.window_trips[1].id, "jan");
    }

    #[test]
    fn test_window_excludes_trip_starting_before_window() {
        let trips = vec![
            trip("old", d(2022, 12, 1), d(2022, 12, 20)),
            trip("new", d(2023, 6, 1), d(2023, 6, 11)),
        ];
        let snap = relevant_window(&trips);
        assert_eq!(snap.window_trips.len(), 1);
        assert_eq!(snap.window_trips[0].id, "new");
        assert_eq!(snap.total_days_used, 10);
    }

    #[test]
    fn test_window_start_boundary_is_inclusive() {
        let trips = vec![
            trip("edge", d(2022, 12, 13), d(2022, 12, 15)),
            trip("new", d(2023, 6, 1), d(2023, 6, 11)),
        ];
        let snap = relevant_window(&trips);
        assert_eq!(snap.window_trips.len(), 2);
    }

    #[test]
    fn test_window_excludes_trip_ending_after_anchor() {
        // Starts earlier but overlaps past the anchor trip's end date.
        let trips = vec![
            trip("long", d(2023, 5, 1), d(2023, 7, 1)),
            trip("short", d(2023, 6, 1), d(2023, 6, 5)),
        ];
        let snap = relevant_window(&trips);
        assert_eq!(snap.anchor, Some(d(2023, 6, 5)));
        assert_eq!(snap.window_trips.len(), 1);
        assert_eq!(snap.window_trips[0].id, "short");
    }

    #[test]
    fn test_overstay_reports_magnitude() {
        // 60 + 35 = 95 days inside one window.
        let trips = vec![
            trip("a", d(2024, 1, 1), d(2024, 3, 1)),
            trip("b", d(2024, 3, 10), d(2024, 4, 14)),
        ];
        let snap = relevant_window(&trips);
        assert_eq!(snap.total_days_used, 95);
        assert_eq!(snap.days_remaining, -5);
        assert!(snap.is_overstay());
        assert_eq!(snap.status(), AllowanceStatus::Overstay(5));
    }

    #[test]
    fn test_exactly_at_allowance_is_not_overstay() {
        let trips = vec![trip("a", d(2024, 1, 1), d(2024, 3, 31))];
        let snap = relevant_window(&trips);
        assert_eq!(snap.total_days_used, 90);
        assert_eq!(snap.status(), AllowanceStatus::Remaining(0));
        assert!(!snap.is_overstay());
    }

    #[test]
    fn test_malformed_trip_does_not_go_negative() {
        let trips = vec![trip("bad", d(2024, 2, 10), d(2024, 2, 1))];
        let snap = relevant_window(&trips);
        assert_eq!(snap.total_days_used, 0);
        assert_eq!(snap.days_remaining, 90);
    }

    #[test]
    fn test_custom_rule_changes_allowance_and_span() {
        let rule = StayRule {
            allowance_days: 30,
            window_days: 60,
        };
        let trips = vec![
            trip("early", d(2024, 1, 1), d(2024, 1, 20)),
            trip("late", d(2024, 3, 1), d(2024, 3, 11)),
        ];
        let snap = relevant_window_with(&trips, rule);
        // 2024-03-11 minus 60 days is 2024-01-11, so "early" drops out.
        assert_eq!(snap.window_start, Some(d(2024, 1, 11)));
        assert_eq!(snap.window_trips.len(), 1);
        assert_eq!(snap.days_remaining, 20);
        assert_eq!(snap.next_full_refill, Some(d(2024, 5, 10)));
    }
}
