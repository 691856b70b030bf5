use log::LevelFilter;
use std::str::FromStr;

#[derive(Debug, Default, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
}

impl AppSettings {
    /// Log level comes from `NFLWINS_LOG` (error, warn, info, debug, trace).
    pub fn load() -> Self {
        let log_level = std::env::var("NFLWINS_LOG")
            .ok()
            .and_then(|level| parse_level(&level));
        Self { full_screen: false, log_level }
    }
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    LevelFilter::from_str(level.trim()).ok()
}
