//! Draft review client.
//!
//! ```text
//! draftdesk --origin https://review.example.com --user-id alice
//! ```

use std::process::ExitCode;

use clap::Parser;
use draftdesk_app::{RuntimeError, Session};
use draftdesk_core::EndpointError;
use draftdesk_tui::{
    Args, ClientConfig, ConfigError, DesktopHost, Runtime, TerminalDriver, TerminalError,
};
use thiserror::Error;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("failed to start: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Runtime(#[from] RuntimeError<TerminalError>),
}

fn main() -> ExitCode {
    let args = Args::parse();

    // stdout belongs to the front end.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("draftdesk=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "draftdesk stopped");
            ExitCode::FAILURE
        },
    }
}

fn run(args: &Args) -> Result<(), MainError> {
    let config = ClientConfig::load(args)?;
    let host = if config.notifications { DesktopHost::detect() } else { DesktopHost::disabled() };
    let session = Session::new(config.session_config()?, host)?;
    info!(url = %session.url(), "starting");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let result = runtime.block_on(async {
        let driver = TerminalDriver::new(BufReader::new(tokio::io::stdin()), std::io::stdout());
        let mut app = Runtime::new(driver, session);

        let result = app.run().await;
        app.driver_mut().finish().await;
        result
    });

    // A stdin read still parked on the blocking pool must not hold up exit.
    runtime.shutdown_background();
    Ok(result?)
}
