use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod chat;
mod controller;
mod deferred;
mod domain;
mod inputter;
mod list_view;
mod model;
mod record;
mod report;
mod session;
mod table;
mod ui;
mod upload;
mod views;

use controller::Controller;
use domain::{TSConfig, TSError};
use model::{Model, Status};
use session::{Credentials, MockSession, Role, Session};
use ui::TSUI;

/// Terminal front-end for uploading and validating term sheets.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Start logged in as this user (requires --role)
    #[arg(long, requires = "role")]
    user: Option<String>,

    /// Role for --user: admin, validator or user
    #[arg(long, value_parser = parse_role)]
    role: Option<Role>,

    /// Write logs to this file; RUST_LOG controls the level
    #[arg(long, default_value = "tsdesk.log")]
    log_file: PathBuf,

    /// Milliseconds to wait for input before polling pending operations
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Simulated latency of login and chat replies
    #[arg(long, default_value_t = 1000)]
    latency_ms: u64,

    /// Give up on a pending operation after this many milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Clip table cells longer than this many chars
    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Directory the validation report is exported to
    #[arg(long)]
    export_dir: Option<PathBuf>,
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse(s).ok_or_else(|| format!("unknown role '{s}'"))
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = run(args);
    ratatui::restore();
    match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_logging(path: &Path) -> Result<(), TSError> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| TSError::LoadingFailed(e.to_string()))
}

fn config(args: &Args) -> TSConfig {
    let cfg = TSConfig::default()
        .with_event_poll_time(args.poll_ms)
        .with_max_column_width(args.max_column_width)
        .with_mock_latency(Duration::from_millis(args.latency_ms))
        .with_operation_timeout(Duration::from_millis(args.timeout_ms));
    match &args.export_dir {
        Some(dir) => cfg.with_export_dir(dir.clone()),
        None => cfg,
    }
}

fn run(args: Args) -> Result<(), TSError> {
    init_logging(&args.log_file)?;

    let cfg = config(&args);
    info!("Starting tsdesk with {:?}", cfg);

    let mut session = MockSession::default();
    if let (Some(user), Some(role)) = (args.user, args.role) {
        let credentials = Credentials {
            username: user.clone(),
            password: user,
            role,
        };
        if let Err(e) = session.login(&credentials) {
            return Err(TSError::LoadingFailed(e.message().to_string()));
        }
    }

    let mut model = Model::init(&cfg, Box::new(session));
    let mut ui = TSUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }
    info!("Bye");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_build_config() {
        let args = Args::try_parse_from([
            "tsdesk",
            "--max-column-width",
            "12",
            "--latency-ms",
            "5",
            "--export-dir",
            "/tmp/reports",
        ])
        .unwrap();
        let cfg = config(&args);
        assert_eq!(cfg.max_column_width, 12);
        assert_eq!(cfg.mock_latency, Duration::from_millis(5));
        assert_eq!(cfg.export_dir, PathBuf::from("/tmp/reports"));
        assert_eq!(cfg.event_poll_time, 100);
    }

    #[test]
    fn defaults_match_config_defaults() {
        let args = Args::try_parse_from(["tsdesk"]).unwrap();
        let cfg = config(&args);
        let defaults = TSConfig::default();
        assert_eq!(cfg.max_column_width, defaults.max_column_width);
        assert_eq!(cfg.operation_timeout, defaults.operation_timeout);
        assert_eq!(cfg.export_dir, defaults.export_dir);
    }

    #[test]
    fn user_requires_role() {
        assert!(Args::try_parse_from(["tsdesk", "--user", "ana"]).is_err());
        let args = Args::try_parse_from(["tsdesk", "--user", "ana", "--role", "validator"]).unwrap();
        assert_eq!(args.role, Some(Role::Validator));
    }
}
