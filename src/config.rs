use log::{debug, info};
use std::collections::HashMap;
use std::env;

const DEFAULT_SCAN_DURATION_SECS: u64 = 20;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_LAST_SEEN_TIMEOUT_MINS: u64 = 30;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Friendly names keyed by trap id
    pub trap_names: HashMap<String, String>,
    pub scan_duration_secs: u64,
    pub poll_interval_secs: u64,
    pub last_seen_timeout: time::Duration,
}

impl MonitorConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let trap_names = match env::var("SWISSINNO_TRAPS") {
            Ok(value) => parse_trap_names(&value),
            Err(_) => {
                info!("SWISSINNO_TRAPS not set, traps will use their default names");
                HashMap::new()
            }
        };

        for (trap_id, name) in &trap_names {
            debug!("Trap: {} -> {}", trap_id, name);
        }
        info!("Total trap names loaded: {}", trap_names.len());

        let scan_duration_secs = env_u64("SCAN_DURATION_SECS", DEFAULT_SCAN_DURATION_SECS)?;
        let poll_interval_secs = env_u64("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let timeout_mins = env_u64("LAST_SEEN_TIMEOUT_MINS", DEFAULT_LAST_SEEN_TIMEOUT_MINS)?;

        if scan_duration_secs == 0 {
            return Err("SCAN_DURATION_SECS must be greater than zero".into());
        }

        Ok(MonitorConfig {
            trap_names,
            scan_duration_secs,
            poll_interval_secs,
            last_seen_timeout: minutes_to_duration("LAST_SEEN_TIMEOUT_MINS", timeout_mins)?,
        })
    }

    /// Name shown for a trap, configured or derived from its id
    pub fn trap_name(&self, trap_id: &str) -> String {
        self.trap_names
            .get(trap_id)
            .cloned()
            .unwrap_or_else(|| format!("SWISSINNO Trap {}", trap_id))
    }
}

/// Parse a `TRAPID=Name,TRAPID=Name` list
///
/// Trap ids are upper-cased to match the decoder's hex output; malformed
/// pairs are skipped.
pub fn parse_trap_names(value: &str) -> HashMap<String, String> {
    let mut names = HashMap::new();

    for pair in value.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        match pair.split_once('=') {
            Some((trap_id, name)) => {
                let trap_id = trap_id.trim();
                let name = name.trim();
                if !trap_id.is_empty() && !name.is_empty() {
                    names.insert(trap_id.to_uppercase(), name.to_string());
                }
            }
            None => debug!("Failed to split pair: '{}'", pair),
        }
    }

    names
}

fn env_u64(key: &str, default: u64) -> Result<u64, String> {
    match env::var(key) {
        Ok(value) => parse_u64(key, &value),
        Err(_) => Ok(default),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, String> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("{} has invalid value '{}': {}", key, value, e))
}

/// Convert a configured minute count without wrapping or overflowing
fn minutes_to_duration(key: &str, minutes: u64) -> Result<time::Duration, String> {
    i64::try_from(minutes)
        .ok()
        .and_then(|minutes| minutes.checked_mul(60))
        .map(time::Duration::seconds)
        .ok_or_else(|| format!("{} is out of range: {} minutes", key, minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trap_name_pairs() {
        let names = parse_trap_names(" 3fce03=Kitchen , 11223344 = Garage,,broken, =Nameless");

        assert_eq!(names.len(), 2);
        assert_eq!(names.get("3FCE03").map(String::as_str), Some("Kitchen"));
        assert_eq!(names.get("11223344").map(String::as_str), Some("Garage"));
    }

    #[test]
    fn falls_back_to_default_name() {
        let config = MonitorConfig {
            trap_names: parse_trap_names("3FCE03=Kitchen"),
            scan_duration_secs: DEFAULT_SCAN_DURATION_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            last_seen_timeout: time::Duration::minutes(30),
        };

        assert_eq!(config.trap_name("3FCE03"), "Kitchen");
        assert_eq!(config.trap_name("UNKNOWN"), "SWISSINNO Trap UNKNOWN");
    }

    #[test]
    fn rejects_non_numeric_durations() {
        assert_eq!(parse_u64("POLL_INTERVAL_SECS", " 45 "), Ok(45));
        assert!(parse_u64("POLL_INTERVAL_SECS", "soon").is_err());
    }

    #[test]
    fn converts_timeout_minutes() {
        assert_eq!(
            minutes_to_duration("LAST_SEEN_TIMEOUT_MINS", 30),
            Ok(time::Duration::minutes(30))
        );
    }

    #[test]
    fn rejects_timeout_beyond_i64() {
        assert!(minutes_to_duration("LAST_SEEN_TIMEOUT_MINS", u64::MAX).is_err());
        assert!(minutes_to_duration("LAST_SEEN_TIMEOUT_MINS", i64::MAX as u64 + 1).is_err());
    }

    #[test]
    fn rejects_timeout_overflowing_seconds() {
        assert!(minutes_to_duration("LAST_SEEN_TIMEOUT_MINS", 200_000_000_000_000_000).is_err());
        assert!(minutes_to_duration("LAST_SEEN_TIMEOUT_MINS", (i64::MAX / 60) as u64).is_ok());
    }
}
