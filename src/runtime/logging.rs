//! File logging. The terminal belongs to the UI, so records go to a file.

use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use env_logger::{Builder, Env, Target};

use crate::config::LogSettings;

/// `$XDG_STATE_HOME/audiowave/audiowave.log`, else `~/.local/state/audiowave/audiowave.log`.
pub fn default_log_path() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
    };

    state_home.map(|d| d.join("audiowave").join("audiowave.log"))
}

/// Install the global logger. `RUST_LOG` overrides `log.level`.
/// Failures are reported once on stderr and leave logging disabled.
pub fn init(settings: &LogSettings) {
    let Some(path) = settings.file.clone().or_else(default_log_path) else {
        return;
    };
    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("audiowave: cannot create log directory {}: {e}", dir.display());
            return;
        }
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("audiowave: cannot open log file {}: {e}", path.display());
            return;
        }
    };

    let result = Builder::from_env(Env::default().default_filter_or(settings.level.as_str()))
        .target(Target::Pipe(Box::new(file)))
        .try_init();
    if let Err(e) = result {
        eprintln!("audiowave: logger already initialized: {e}");
    }
}
