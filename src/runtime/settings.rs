use crate::config;

pub fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("lenify: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("lenify: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}

/// Settings with the optional command line location applied.
pub fn settings_for(location: Option<&str>) -> config::Settings {
    let mut settings = load_settings();
    if let Some(loc) = location.map(str::trim).filter(|l| !l.is_empty()) {
        settings.apply_location(loc);
        if let Err(msg) = settings.validate() {
            eprintln!("lenify: ignoring location {loc}: {msg}");
            settings = load_settings();
        }
    }
    settings
}
