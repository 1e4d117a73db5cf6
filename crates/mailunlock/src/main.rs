use std::path::PathBuf;
use std::process::ExitCode;

use log::info;
use tokio::sync::watch;

use mailunlock::{load_config, logging, MailUnlockError, Orchestrator};

/// Environment variable naming the config file when no argument is given.
const CONFIG_ENV_VAR: &str = "MAILUNLOCK_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "/app/config.yaml";

fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn run() -> mailunlock::Result<()> {
    let path = config_path();
    let config = load_config(&path)?;
    logging::init(&config.log)?;

    info!(
        "Starting mailunlock v{} with config {}",
        env!("CARGO_PKG_VERSION"),
        path.display()
    );
    config.ensure_directories()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(MailUnlockError::Runtime)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
    })
    .map_err(|e| MailUnlockError::Runtime(std::io::Error::other(e)))?;

    runtime.block_on(async {
        let mut orchestrator = Orchestrator::from_config(&config);
        orchestrator.run(shutdown_rx).await;
    });

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("mailunlock: {}", e);
            ExitCode::FAILURE
        }
    }
}
