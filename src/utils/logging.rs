use std::fs::OpenOptions;
use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize tracing output for the process.
///
/// The interactive console owns the terminal, so diagnostics are only
/// written when a log file is given (or when `RUST_LOG` is set and we are
/// not about to enter the alternate screen). Writing to stderr from inside
/// the TUI would corrupt the display.
pub fn init_tracing(
    log_file: Option<&str>,
    interactive: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None if !interactive => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        None => {
            // Interactive with no log file: swallow events entirely.
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new("off"))
                .with_writer(std::io::sink)
                .init();
        }
    }

    Ok(())
}

/// Verify a log file path is writable before the terminal is put into raw
/// mode, so the failure is still readable.
pub fn check_log_path(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(format!("log directory does not exist: {}", parent.display()).into());
        }
    }
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}
