use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `AUDIOWAVE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("AUDIOWAVE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        let v = &self.visualizer;
        if !v.fft_size.is_power_of_two() || !(32..=32768).contains(&v.fft_size) {
            return Err(format!(
                "visualizer.fft_size must be a power of two in [32, 32768], got {}",
                v.fft_size
            ));
        }
        if !(0.0..=1.0).contains(&v.smoothing) {
            return Err("visualizer.smoothing must be in [0, 1]".to_string());
        }
        if v.min_decibels >= v.max_decibels {
            return Err("visualizer.min_decibels must be below visualizer.max_decibels".to_string());
        }
        if v.fps == 0 {
            return Err("visualizer.fps must be >= 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.playback.volume) {
            return Err("playback.volume must be in [0, 1]".to_string());
        }
        if self.source.resolve_concurrency == 0 {
            return Err("source.resolve_concurrency must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `AUDIOWAVE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("AUDIOWAVE_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/audiowave/config.toml`
/// or `~/.config/audiowave/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("audiowave").join("config.toml"))
}
