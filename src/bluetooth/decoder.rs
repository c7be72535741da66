/// SWISSINNO manufacturer payload decoding
use crate::models::{DecodedFrame, UNKNOWN_TRAP_ID};

// SWISSINNO protocol constants
pub const SWISSINNO_MANUFACTURER_ID: u16 = 3003;
const NEW_FRAME_MIN_LEN: usize = 10;
const NEW_FRAME_MARKER: u8 = 0x00;
const BATTERY_OFFSET: usize = 7;
const BATTERY_FULL_SCALE_VOLTS: f64 = 3.6;

/// Decode a SWISSINNO manufacturer payload into a trap frame
///
/// Two layouts are in the field and neither carries an explicit tag:
///
/// Current traps (at least 10 bytes, byte 0 is 0x00):
/// - Byte 0: Format version (0)
/// - Byte 1: Device type
/// - Bytes 2-3: Event counter (unsigned 16-bit, little-endian)
/// - Byte 4: Status (1, 2 and 3 mean tripped)
/// - Byte 7: Battery
///
/// Legacy traps (everything else):
/// - Byte 0: Status (only 0x01 means tripped)
/// - Bytes 2-5: Trap identity
/// - Byte 7: Battery
///
/// Short legacy payloads still produce a frame with the missing fields left
/// empty and the trap identity set to `UNKNOWN`.
///
/// # Arguments
/// * `payload` - Manufacturer data value bytes, without the manufacturer ID
///
/// # Returns
/// Some(DecodedFrame) for any non-empty payload, None for an empty one
pub fn decode_frame(payload: &[u8]) -> Option<DecodedFrame> {
    if payload.is_empty() {
        return None;
    }

    if payload.len() >= NEW_FRAME_MIN_LEN && payload[0] == NEW_FRAME_MARKER {
        Some(decode_new_frame(payload))
    } else {
        Some(decode_legacy_frame(payload))
    }
}

fn decode_new_frame(payload: &[u8]) -> DecodedFrame {
    let device_type = payload[1];
    let event_counter = u16::from_le_bytes([payload[2], payload[3]]);
    let status = payload[4];

    // Identity is the raw bytes, not a re-encoding of the counter
    let trap_id = format!(
        "{:02X}{:02X}{:02X}",
        device_type, payload[2], payload[3]
    );

    let battery_raw = battery_byte(payload);

    DecodedFrame {
        format_version: Some(payload[0]),
        device_type: Some(device_type),
        event_counter: Some(event_counter),
        status,
        is_tripped: matches!(status, 0x01..=0x03),
        trap_id,
        battery_raw,
        battery_volts: battery_raw.map(battery_to_volts),
    }
}

fn decode_legacy_frame(payload: &[u8]) -> DecodedFrame {
    let status = payload[0];

    let trap_id = match payload.get(2..6) {
        Some(id_bytes) => id_bytes.iter().map(|b| format!("{:02X}", b)).collect(),
        None => UNKNOWN_TRAP_ID.to_string(),
    };

    let battery_raw = battery_byte(payload);

    DecodedFrame {
        format_version: None,
        device_type: None,
        event_counter: None,
        status,
        is_tripped: status == 0x01,
        trap_id,
        battery_raw,
        battery_volts: battery_raw.map(battery_to_volts),
    }
}

fn battery_byte(payload: &[u8]) -> Option<u8> {
    payload.get(BATTERY_OFFSET).copied()
}

/// Convert a raw battery byte to volts, rounded half away from zero to 2 decimals
pub fn battery_to_volts(raw: u8) -> f64 {
    let volts = f64::from(raw) * BATTERY_FULL_SCALE_VOLTS / 255.0;
    (volts * 100.0).round() / 100.0
}
