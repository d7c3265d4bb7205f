use std::path::PathBuf;
use std::process::ExitCode;

use chatline::ChatApp;
use chatline::app::build_session;
use chatline_session::SettingsStore;
use tracing_subscriber::EnvFilter;

/// Overrides the settings file location.
const SETTINGS_PATH_ENV: &str = "CHATLINE_SETTINGS";

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so they never interleave with the transcript on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings_store = match std::env::var_os(SETTINGS_PATH_ENV) {
        Some(path) => SettingsStore::new(PathBuf::from(path)),
        None => SettingsStore::load(),
    };

    let result = match build_session(&settings_store) {
        Ok(session) => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            ChatApp::new(session).run(input, tokio::io::stdout()).await
        }
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "chatline exited with an error");
            eprintln!("chatline: {error}");
            ExitCode::FAILURE
        }
    }
}
