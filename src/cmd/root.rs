use crate::cmd::auth::require_user;
use crate::data::persistence::get_data_dir;
use crate::data::{AppSettings, FileTripStore};
use crate::ui::tracker_view::{run_app, App};
use crate::ui::{restore_terminal, setup_terminal};
use anyhow::Result;
use chrono::Utc;
use tracing::info;

pub fn run() -> Result<()> {
    let dir = get_data_dir()?;
    let settings = AppSettings::load_from(&dir)?;
    let owner_id = require_user(&dir)?;
    let mut store = FileTripStore::open(&dir)?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen
        );
        original_hook(info);
    }));

    let mut terminal = setup_terminal()?;

    let today = Utc::now().date_naive();
    info!(owner_id = %owner_id, "starting interactive view");
    let result = match App::new(&mut store, &owner_id, settings, today) {
        Ok(mut app) => run_app(&mut terminal, &mut app),
        Err(e) => Err(e.into()),
    };

    restore_terminal(&mut terminal)?;
    info!("interactive view closed");
    result
}
