use crate::calc::{count_days, relevant_window_with};
use crate::cmd::auth::require_user;
use crate::data::persistence::get_data_dir;
use crate::data::{AppSettings, Country, FileTripStore, StoreError, Trip, TripPatch, TripStore};
use crate::notify::{self, ConsoleNotifier, Notifier};
use crate::picker::parse_strict_date;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;

fn parse_date(raw: &str) -> Result<NaiveDate> {
    parse_strict_date(raw.trim())
        .ok_or_else(|| anyhow!("invalid date '{}', expected YYYY-MM-DD", raw))
}

fn parse_country(raw: &str) -> Result<Country> {
    raw.parse::<Country>().map_err(|e| anyhow!(e))
}

pub fn list(all: bool) -> Result<()> {
    let dir = get_data_dir()?;
    let owner_id = require_user(&dir)?;
    let settings = AppSettings::load_from(&dir)?;
    let store = FileTripStore::open(&dir)?;
    let trips = store.trips_for(&owner_id);
    let shown = if all {
        trips
    } else {
        relevant_window_with(&trips, settings.stay_rule()).window_trips
    };
    let title = if all { "All Trips" } else { "Trips In Window" };
    write_trips(title, &shown, &mut std::io::stdout())
}

pub(crate) fn write_trips<W: std::io::Write>(title: &str, trips: &[Trip], out: &mut W) -> Result<()> {
    writeln!(out, "{}", title)?;
    writeln!(out, "---")?;
    writeln!(
        out,
        "  {:<36} {:<16} {:<12} {:<12} {}",
        "ID", "Country", "Start", "End", "Days"
    )?;
    for t in trips {
        writeln!(
            out,
            "  {:<36} {:<16} {:<12} {:<12} {}",
            t.id,
            t.country.name(),
            t.start_date.format("%Y-%m-%d"),
            t.end_date.format("%Y-%m-%d"),
            count_days(t)
        )?;
    }
    writeln!(out, "---")?;
    writeln!(out, "Total: {} trip(s)", trips.len())?;
    Ok(())
}

pub fn add(country: &str, start: &str, end: &str) -> Result<()> {
    let dir = get_data_dir()?;
    let owner_id = require_user(&dir)?;
    let country = parse_country(country)?;
    let (start, end) = (parse_date(start)?, parse_date(end)?);
    let mut store = FileTripStore::open(&dir)?;
    let mut notifier = ConsoleNotifier::new(std::io::stdout());
    add_trip(&mut store, &mut notifier, &owner_id, country, start, end)?;
    Ok(())
}

pub(crate) fn add_trip(
    store: &mut dyn TripStore,
    notifier: &mut dyn Notifier,
    owner_id: &str,
    country: Country,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<String> {
    match store.create_trip(owner_id, country, start, end) {
        Ok(id) => {
            notifier.success(notify::TRIP_ADDED);
            Ok(id)
        }
        Err(e) => {
            notifier.error(&notify::trip_add_failed(&e));
            Err(e.into())
        }
    }
}

pub fn edit(
    id: &str,
    country: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let dir = get_data_dir()?;
    let owner_id = require_user(&dir)?;
    let patch = TripPatch {
        country: country.map(parse_country).transpose()?,
        start_date: start.map(parse_date).transpose()?,
        end_date: end.map(parse_date).transpose()?,
    };
    let mut store = FileTripStore::open(&dir)?;
    let mut notifier = ConsoleNotifier::new(std::io::stdout());
    edit_trip(&mut store, &mut notifier, &owner_id, id, patch)
}

/// Trips of other users are reported as missing.
fn check_owner(store: &FileTripStore, owner_id: &str, id: &str) -> Result<(), StoreError> {
    match store.get(id) {
        Some(t) if t.owner_id == owner_id => Ok(()),
        _ => Err(StoreError::NotFound(id.to_string())),
    }
}

pub(crate) fn edit_trip(
    store: &mut FileTripStore,
    notifier: &mut dyn Notifier,
    owner_id: &str,
    id: &str,
    patch: TripPatch,
) -> Result<()> {
    let result = check_owner(store, owner_id, id).and_then(|_| store.update_trip(id, patch));
    match result {
        Ok(()) => {
            notifier.success(notify::TRIP_EDITED);
            Ok(())
        }
        Err(e) => {
            notifier.error(&notify::trip_edit_failed(&e));
            Err(e.into())
        }
    }
}

pub fn delete(id: &str) -> Result<()> {
    let dir = get_data_dir()?;
    let owner_id = require_user(&dir)?;
    let mut store = FileTripStore::open(&dir)?;
    let mut notifier = ConsoleNotifier::new(std::io::stdout());
    delete_trip(&mut store, &mut notifier, &owner_id, id)
}

pub(crate) fn delete_trip(
    store: &mut FileTripStore,
    notifier: &mut dyn Notifier,
    owner_id: &str,
    id: &str,
) -> Result<()> {
    let result = check_owner(store, owner_id, id).and_then(|_| store.delete_trip(id));
    match result {
        Ok(()) => {
            notifier.success(notify::TRIP_DELETED);
            Ok(())
        }
        Err(e) => {
            notifier.error(&notify::trip_delete_failed(&e));
            Err(e.into())
        }
    }
}
