use time::OffsetDateTime;

/// Trap identity used when a legacy payload is too short to carry one
pub const UNKNOWN_TRAP_ID: &str = "UNKNOWN";

/// One decoded SWISSINNO manufacturer payload
///
/// A frame comes either from the current 10-byte layout or from the legacy
/// layout; `format_version`, `device_type` and `event_counter` are only
/// populated for the current layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub format_version: Option<u8>,
    pub device_type: Option<u8>,
    pub event_counter: Option<u16>,
    pub status: u8,
    pub is_tripped: bool,
    pub trap_id: String,
    pub battery_raw: Option<u8>,
    pub battery_volts: Option<f64>,
}

impl DecodedFrame {
    /// Format version with `-1` standing in for legacy frames
    pub fn version_code(&self) -> i16 {
        self.format_version.map_or(-1, i16::from)
    }

    /// Device type with `-1` standing in for legacy frames
    pub fn device_type_code(&self) -> i16 {
        self.device_type.map_or(-1, i16::from)
    }

    pub fn is_legacy(&self) -> bool {
        self.format_version.is_none()
    }
}

/// A decoded frame together with the radio metadata it arrived with
#[derive(Debug, Clone)]
pub struct Advertisement {
    pub address: String,
    pub rssi: Option<i16>,
    pub frame: DecodedFrame,
}

/// Latest known state of a single trap
#[derive(Debug, Clone)]
pub struct TrapState {
    pub trap_id: String,
    pub name: String,
    pub address: String,
    pub is_tripped: bool,
    pub battery_volts: Option<f64>,
    pub rssi: Option<i16>,
    pub event_counter: Option<u16>,
    pub last_seen: OffsetDateTime,
    pub available: bool,
}
