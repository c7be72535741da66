/// GATT reset of a tripped SWISSINNO trap
use bluer::gatt::remote::{Characteristic, CharacteristicWriteRequest};
use bluer::gatt::WriteOp;
use bluer::{Address, Uuid};
use log::{debug, error, info};

const RESET_CHARACTERISTIC_UUID: &str = "02ECC6CD-2B43-4DB5-96E6-EDE92CF8778D";
const RESET_VALUE: [u8; 1] = [0x00];

/// Normalise a Bluetooth address string and parse it
pub fn parse_address(address: &str) -> Result<Address, String> {
    let normalized = address.trim().to_uppercase();
    normalized
        .parse::<Address>()
        .map_err(|e| format!("Invalid Bluetooth address {}: {}", normalized, e))
}

/// Reset a trap by writing 0x00 to its reset characteristic
///
/// The device must already be known to the adapter (seen during a scan).
/// The write is sent as a request, so the trap has to acknowledge it.
pub async fn reset_trap(address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let addr = parse_address(address)?;
    info!("Resetting trap at {}", addr);

    let session = bluer::Session::new().await?;
    let adapter = session.default_adapter().await?;
    adapter.set_powered(true).await?;

    if !adapter.device_addresses().await?.contains(&addr) {
        error!("Device {} not found for reset", addr);
        return Err(format!("Bluetooth device {} not found", addr).into());
    }

    let device = adapter.device(addr)?;
    if !device.is_connected().await? {
        debug!("Connecting to {}", addr);
        device.connect().await?;
    }

    let result = write_reset(&device).await;

    if let Err(e) = device.disconnect().await {
        debug!("Disconnect from {} failed: {}", addr, e);
    }

    match result {
        Ok(()) => {
            info!("Successfully reset trap {}", addr);
            Ok(())
        }
        Err(e) => {
            error!("Reset failed for {}: {}", addr, e);
            Err(e)
        }
    }
}

async fn write_reset(device: &bluer::Device) -> Result<(), Box<dyn std::error::Error>> {
    let characteristic = find_reset_characteristic(device)
        .await?
        .ok_or("Reset characteristic not found")?;

    let mut request = CharacteristicWriteRequest::default();
    request.op_type = WriteOp::Request;
    characteristic.write_ext(&RESET_VALUE, &request).await?;
    Ok(())
}

async fn find_reset_characteristic(
    device: &bluer::Device,
) -> Result<Option<Characteristic>, Box<dyn std::error::Error>> {
    let wanted = Uuid::parse_str(RESET_CHARACTERISTIC_UUID)?;

    for service in device.services().await? {
        for characteristic in service.characteristics().await? {
            if characteristic.uuid().await? == wanted {
                return Ok(Some(characteristic));
            }
        }
    }

    Ok(None)
}
