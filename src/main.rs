mod calc;
mod cmd;
mod data;
mod notify;
mod picker;
mod ui;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Parser)]
#[command(name = "schengen", about = "Schengen 90/180 stay tracker")]
struct Cli {
    /// Path to the data directory holding config, users and trips (default: ./data)
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config and an empty trip file
    Init,
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Sign in with an existing account
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    Signout,
    /// Show the signed-in user
    Whoami,
    /// Show days used, days left and the next full-allowance date
    Stats,
    /// List trips inside the current window
    Trips {
        /// List every trip, not just the windowed ones
        #[arg(long)]
        all: bool,
    },
    /// Record a trip
    Add {
        /// Country name or two-letter code
        #[arg(long)]
        country: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: String,
    },
    /// Replace the country or dates of a trip
    Edit {
        id: String,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Delete a trip
    Delete { id: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = if cli.data_dir.is_absolute() {
        cli.data_dir.clone()
    } else {
        std::env::current_dir()?.join(&cli.data_dir)
    };
    data::persistence::set_data_dir(data_dir.clone());

    // Auto-init when the data directory is missing or empty and the user did not
    // explicitly invoke the `init` subcommand.
    let is_init_command = matches!(cli.command, Some(Commands::Init));
    if !is_init_command && dir_needs_init(&data_dir) {
        eprintln!(
            "Data directory '{}' is missing or empty, running init...",
            data_dir.display()
        );
        cmd::init::run()?;
    }

    init_logging(&data_dir)?;

    match cli.command {
        None => cmd::root::run(),
        Some(Commands::Init) => cmd::init::run(),
        Some(Commands::Signup {
            email,
            username,
            password,
            confirm_password,
        }) => cmd::auth::signup(&email, &username, &password, confirm_password.as_deref()),
        Some(Commands::Signin { email, password }) => cmd::auth::signin(&email, &password),
        Some(Commands::Signout) => cmd::auth::signout(),
        Some(Commands::Whoami) => cmd::auth::whoami(),
        Some(Commands::Stats) => cmd::stats::run(),
        Some(Commands::Trips { all }) => cmd::trips::list(all),
        Some(Commands::Add {
            country,
            start,
            end,
        }) => cmd::trips::add(&country, &start, &end),
        Some(Commands::Edit {
            id,
            country,
            start,
            end,
        }) => cmd::trips::edit(&id, country.as_deref(), start.as_deref(), end.as_deref()),
        Some(Commands::Delete { id }) => cmd::trips::delete(&id),
    }
}

/// Logs go to `<data-dir>/schengen.log` since the interactive view owns the
/// terminal. `SCHENGEN_LOG` overrides the configured filter.
fn init_logging(data_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create dir {}", data_dir.display()))?;
    let settings = data::AppSettings::load_from(data_dir).unwrap_or_default();
    let log_path = data_dir.join("schengen.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    let filter_layer = EnvFilter::try_from_env("SCHENGEN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));

    // Only fails when a subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
    Ok(())
}

/// Returns true when `dir` does not exist or exists but contains no files.
fn dir_needs_init(dir: &Path) -> bool {
    if !dir.exists() {
        return true;
    }
    dir.read_dir()
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
