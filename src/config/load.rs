use std::{env, path::PathBuf};

use super::schema::{Settings, SourceKind};

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `LENIFY__`), then an
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
            ::config::Environment::with_prefix("LENIFY")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        for (name, v) in [
            ("audio.initial_volume", self.audio.initial_volume),
            ("audio.unmute_volume", self.audio.unmute_volume),
            ("audio.volume_step", self.audio.volume_step),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("{name} must be within 0.0..=1.0"));
            }
        }
        if self
            .catalog
            .extensions
            .iter()
            .all(|e| e.trim().trim_start_matches('.').is_empty())
        {
            return Err("catalog.extensions must name at least one extension".to_string());
        }
        if self.catalog.source == SourceKind::Local && self.catalog.local_dir.is_none() {
            return Err("catalog.local_dir is required for the local source".to_string());
        }
        Ok(())
    }

    /// Apply the optional command-line catalog location.
    ///
    /// An `http(s)` URL replaces `catalog.base_url`; anything else is treated as a
    /// directory and switches to the local source.
    pub fn apply_location(&mut self, location: &str) {
        let location = location.trim();
        if location.is_empty() {
            return;
        }
        if location.starts_with("http://") || location.starts_with("https://") {
            self.catalog.base_url = location.trim_end_matches('/').to_string();
        } else {
            self.catalog.source = SourceKind::Local;
            self.catalog.local_dir = Some(PathBuf::from(location));
        }
    }
}

/// Resolve the config path from `LENIFY_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("LENIFY_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/lenify/config.toml`
/// or `~/.config/lenify/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("lenify").join("config.toml"))
}

/// `$XDG_CACHE_HOME/lenify/catalog.json` or `~/.cache/lenify/catalog.json`.
pub fn default_cache_path() -> Option<PathBuf> {
    xdg_dir("XDG_CACHE_HOME", ".cache").map(|d| d.join("lenify").join("catalog.json"))
}

/// `$XDG_STATE_HOME/lenify/lenify.log` or `~/.local/state/lenify/lenify.log`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("lenify").join("lenify.log"))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback))
    }
}
