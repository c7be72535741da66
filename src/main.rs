mod bluetooth;
mod config;
mod models;
mod registry;
mod utils;

use log::{error, info, warn};
use time::OffsetDateTime;
use tokio::time::{sleep, Duration};

use bluetooth::{reset_trap, scan_for_traps};
use config::MonitorConfig;
use registry::{Observation, TrapRegistry};
use utils::{duration_to_seconds, format_battery, format_datetime, format_rssi, format_trap_summary};

const USAGE: &str = "usage: swissinno-ble [reset <ADDRESS>]";

async fn main_loop(config: MonitorConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting SWISSINNO trap monitor");

    let mut registry = TrapRegistry::new();

    loop {
        let start_time = OffsetDateTime::now_utc();

        let advertisements = match scan_for_traps(&config).await {
            Ok(advertisements) => advertisements,
            Err(e) => {
                error!("Scan failed: {}", e);
                sleep(Duration::from_secs(config.poll_interval_secs)).await;
                continue;
            }
        };

        let now = OffsetDateTime::now_utc();
        for advertisement in &advertisements {
            let frame = &advertisement.frame;

            let observation = registry.observe(advertisement, &config, now);
            let name = registry
                .get(&frame.trap_id)
                .map(|state| state.name.as_str())
                .unwrap_or(frame.trap_id.as_str());

            match observation {
                Observation::New => info!(
                    "New trap {} [{}] ({}) at {}",
                    name,
                    frame.trap_id,
                    if frame.is_legacy() { "legacy" } else { "current" },
                    advertisement.address
                ),
                Observation::Tripped => warn!("{} has been TRIPPED", name),
                Observation::Cleared => info!("{} has been reset", name),
                Observation::Updated => {}
            }

            info!(
                "Trap {} | Tripped={} RSSI={} | Battery={}",
                frame.trap_id,
                frame.is_tripped,
                format_rssi(advertisement.rssi),
                format_battery(frame.battery_volts)
            );
        }

        for trap_id in registry.expire(now, config.last_seen_timeout) {
            warn!(
                "Trap {} unavailable, not heard for {} minutes",
                trap_id,
                config.last_seen_timeout.whole_minutes()
            );
        }

        if advertisements.is_empty() {
            if registry.is_empty() {
                warn!("No SWISSINNO traps heard yet");
            } else {
                warn!("No trap advertisements received in this scan");
            }
        }

        info!(
            "Scan complete at {}: {} advertisements, {} traps known",
            format_datetime(&now),
            advertisements.len(),
            registry.len()
        );
        for state in registry.traps() {
            info!("  {}", format_trap_summary(state));
        }

        // Wait until next poll time
        let elapsed = duration_to_seconds(OffsetDateTime::now_utc() - start_time);
        let sleep_time = config.poll_interval_secs.saturating_sub(elapsed);
        if sleep_time > 0 {
            sleep(Duration::from_secs(sleep_time)).await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => {}
        Some("reset") => {
            let address = args.get(1).ok_or(USAGE)?;
            return reset_trap(address).await;
        }
        Some(other) => {
            error!("Unknown command '{}'", other);
            return Err(USAGE.into());
        }
    }

    let config = match MonitorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        let _ = tx.send(());
    });

    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Monitor stopped"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Monitor terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
