/// Utility functions for formatting log output
use time::{format_description, OffsetDateTime};

use crate::models::TrapState;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Convert a time::Duration to whole seconds, clamping negatives to zero
pub fn duration_to_seconds(duration: time::Duration) -> u64 {
    duration.whole_seconds().max(0) as u64
}

pub fn format_battery(volts: Option<f64>) -> String {
    match volts {
        Some(volts) => format!("{:.2} V", volts),
        None => "n/a".to_string(),
    }
}

pub fn format_rssi(rssi: Option<i16>) -> String {
    match rssi {
        Some(rssi) => format!("{} dBm", rssi),
        None => "n/a".to_string(),
    }
}

/// One-line status summary of a trap
pub fn format_trap_summary(state: &TrapState) -> String {
    let counter = match state.event_counter {
        Some(counter) => format!(" events={}", counter),
        None => String::new(),
    };

    format!(
        "{} [{}] {} | Tripped={}{} RSSI={} | Battery={} | last seen {}{}",
        state.name,
        state.trap_id,
        state.address,
        state.is_tripped,
        counter,
        format_rssi(state.rssi),
        format_battery(state.battery_volts),
        format_datetime(&state.last_seen),
        if state.available { "" } else { " (unavailable)" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_timestamp() {
        let dt = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        assert_eq!(format_datetime(&dt), "14.11.2023 - 22:13:20");
    }

    #[test]
    fn negative_durations_clamp_to_zero() {
        assert_eq!(duration_to_seconds(time::Duration::seconds(-5)), 0);
        assert_eq!(duration_to_seconds(time::Duration::milliseconds(90_500)), 90);
    }

    #[test]
    fn summarises_unavailable_legacy_trap() {
        let state = TrapState {
            trap_id: "11223344".to_string(),
            name: "Garage".to_string(),
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            is_tripped: true,
            battery_volts: None,
            rssi: Some(-81),
            event_counter: None,
            last_seen: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            available: false,
        };

        assert_eq!(
            format_trap_summary(&state),
            "Garage [11223344] AA:BB:CC:DD:EE:FF | Tripped=true RSSI=-81 dBm | Battery=n/a | last seen 14.11.2023 - 22:13:20 (unavailable)"
        );
    }

    #[test]
    fn formats_missing_readings() {
        assert_eq!(format_battery(Some(3.08)), "3.08 V");
        assert_eq!(format_battery(None), "n/a");
        assert_eq!(format_rssi(Some(-70)), "-70 dBm");
        assert_eq!(format_rssi(None), "n/a");
    }
}
