use crate::calc::{relevant_window_with, AccountingSnapshot, AllowanceStatus, StayRule};
use crate::cmd::auth::require_user;
use crate::data::persistence::get_data_dir;
use crate::data::{AppSettings, FileTripStore};
use crate::notify::overstay_message;
use anyhow::Result;

pub fn run() -> Result<()> {
    let dir = get_data_dir()?;
    let settings = AppSettings::load_from(&dir)?;
    let owner_id = require_user(&dir)?;
    let store = FileTripStore::open(&dir)?;
    let rule = settings.stay_rule();
    let snapshot = relevant_window_with(&store.trips_for(&owner_id), rule);
    write_snapshot(&snapshot, rule, &mut std::io::stdout())
}

pub(crate) fn write_snapshot<W: std::io::Write>(
    snapshot: &AccountingSnapshot,
    rule: StayRule,
    out: &mut W,
) -> Result<()> {
    let fmt_date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "—".to_string())
    };

    writeln!(
        out,
        "Schengen Stay ({} / {} rule)",
        rule.allowance_days, rule.window_days
    )?;
    writeln!(
        out,
        "Window: [{} - {}]",
        fmt_date(snapshot.window_start),
        fmt_date(snapshot.anchor)
    )?;
    writeln!(out, "---")?;
    writeln!(out, "{:<26} {}", "Days Spent:", snapshot.total_days_used)?;
    match snapshot.status() {
        AllowanceStatus::Remaining(days) => writeln!(out, "{:<26} {}", "Days Left:", days)?,
        AllowanceStatus::Overstay(days) => {
            writeln!(out, "{:<26} {}", "Overstay:", overstay_message(days))?
        }
    }
    writeln!(
        out,
        "{:<26} {}",
        format!("Next Full {} Days:", rule.allowance_days),
        fmt_date(snapshot.next_full_refill)
    )?;
    writeln!(out, "{:<26} {}", "Trips In Window:", snapshot.window_trips.len())?;
    writeln!(out, "---")?;
    Ok(())
}
