use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{self, LogSettings};

/// Send `tracing` output to the log file; the terminal belongs to the UI.
///
/// `LENIFY_LOG` takes precedence over `log.level`. Returns the file in use, or
/// `None` when no log file could be opened (logging is then disabled).
pub fn init(settings: &LogSettings) -> Option<PathBuf> {
    let path = settings.file.clone().or_else(config::default_log_path)?;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("lenify: cannot create log dir {}: {e}", parent.display());
            return None;
        }
    }

    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("lenify: cannot open log file {}: {e}", path.display());
            return None;
        }
    };

    let filter = EnvFilter::try_from_env("LENIFY_LOG")
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_env_filter(filter)
        .try_init();

    installed.ok().map(|_| path)
}
