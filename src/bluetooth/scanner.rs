/// Bluetooth Low Energy scanning for SWISSINNO traps
use futures_util::StreamExt;
use log::{debug, error, warn};
use std::collections::HashMap;
use tokio::time::{sleep, Duration};

use crate::bluetooth::decoder::{decode_frame, SWISSINNO_MANUFACTURER_ID};
use crate::config::MonitorConfig;
use crate::models::{Advertisement, DecodedFrame};

/// Pick the SWISSINNO entry out of a manufacturer data map and decode it
///
/// Returns None when the advertisement carries no SWISSINNO entry or the
/// entry is empty.
pub fn extract_trap_frame(manufacturer_data: &HashMap<u16, Vec<u8>>) -> Option<DecodedFrame> {
    manufacturer_data
        .get(&SWISSINNO_MANUFACTURER_ID)
        .and_then(|payload| decode_frame(payload))
}

/// Build an advertisement for a device heard in the current discovery
///
/// BlueZ keeps cached devices around after they go quiet but clears their
/// RSSI, so a device without RSSI only carries stale manufacturer data and
/// is skipped.
pub fn trap_advertisement(
    address: String,
    rssi: Option<i16>,
    manufacturer_data: &HashMap<u16, Vec<u8>>,
) -> Option<Advertisement> {
    let rssi = rssi?;
    let frame = extract_trap_frame(manufacturer_data)?;

    Some(Advertisement {
        address,
        rssi: Some(rssi),
        frame,
    })
}

/// Scan for SWISSINNO traps and collect their latest advertisements
///
/// This function performs a Bluetooth Low Energy scan for the configured
/// duration, then walks every device the adapter knows about and decodes
/// the ones advertising SWISSINNO manufacturer data. Cached devices that
/// were not heard during this scan are left out.
///
/// # Arguments
/// * `config` - Monitor configuration (scan duration)
///
/// # Returns
/// Result containing one Advertisement per trap device, or error if scan fails
pub async fn scan_for_traps(
    config: &MonitorConfig,
) -> Result<Vec<Advertisement>, Box<dyn std::error::Error>> {
    let mut advertisements = Vec::new();

    // Initialize Bluetooth session
    let session = match bluer::Session::new().await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create Bluetooth session: {}", e);
            return Err(e.into());
        }
    };

    // Get the default Bluetooth adapter
    let adapter = match session.default_adapter().await {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to get default Bluetooth adapter: {}", e);
            return Err(e.into());
        }
    };

    // Ensure Bluetooth adapter is powered on
    if let Err(e) = adapter.set_powered(true).await {
        error!("Failed to power on adapter: {}", e);
        return Err(e.into());
    }

    // Traps advertise passively, so LE transport is enough
    let filter = bluer::DiscoveryFilter {
        transport: bluer::DiscoveryTransport::Le,
        duplicate_data: false,
        ..Default::default()
    };

    // Apply the discovery filter (warn if it fails, but continue)
    if let Err(e) = adapter.set_discovery_filter(filter).await {
        warn!("Failed to set discovery filter: {}", e);
    }

    // Start device discovery in background
    let discovery_handle = match adapter.discover_devices().await {
        Ok(discovery_stream) => tokio::spawn(async move {
            let mut stream = discovery_stream;
            while let Some(event) = stream.next().await {
                debug!("Discovery event: {:?}", event);
            }
        }),
        Err(e) => {
            error!("Failed to start device discovery: {}", e);
            return Err(e.into());
        }
    };

    // Let discovery run for the configured duration
    sleep(Duration::from_secs(config.scan_duration_secs)).await;

    // Stop discovery
    discovery_handle.abort();

    // Get all discovered device addresses
    let devices = match adapter.device_addresses().await {
        Ok(devices) => devices,
        Err(e) => {
            error!("Failed to get device addresses: {}", e);
            return Err(e.into());
        }
    };

    // Process each discovered device
    for addr in devices {
        let device = match adapter.device(addr) {
            Ok(device) => device,
            Err(_) => continue,
        };

        let address = device.address().to_string().to_uppercase();

        let manufacturer_data = match device.manufacturer_data().await {
            Ok(Some(manufacturer_data)) => manufacturer_data,
            Ok(None) => continue,
            Err(e) => {
                debug!("Failed to get manufacturer data for {}: {}", address, e);
                continue;
            }
        };

        // Missing RSSI means BlueZ did not hear the device in this scan
        let rssi = device.rssi().await.unwrap_or_else(|e| {
            debug!("Failed to get RSSI for {}: {}", address, e);
            None
        });

        let advertisement = match trap_advertisement(address, rssi, &manufacturer_data) {
            Some(advertisement) => advertisement,
            None => continue,
        };

        let frame = &advertisement.frame;
        debug!(
            "Received frame from {}: version={} type={} counter={:?} status=0x{:02X} battery_raw={:?}",
            advertisement.address,
            frame.version_code(),
            frame.device_type_code(),
            frame.event_counter,
            frame.status,
            frame.battery_raw
        );

        advertisements.push(advertisement);
    }

    Ok(advertisements)
}
