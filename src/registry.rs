/// In-memory table of the latest state of every trap heard
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

use crate::config::MonitorConfig;
use crate::models::{Advertisement, TrapState};

/// What an advertisement changed in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First advertisement from this trap
    New,
    /// Trap went from idle to tripped
    Tripped,
    /// Trap went from tripped back to idle
    Cleared,
    /// Trip state unchanged, readings refreshed
    Updated,
}

#[derive(Debug, Default)]
pub struct TrapRegistry {
    traps: HashMap<String, TrapState>,
}

impl TrapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one advertisement into the trap table
    ///
    /// Battery and RSSI always take the advertisement's values, so a frame
    /// without a battery byte clears the previous reading.
    pub fn observe(
        &mut self,
        advertisement: &Advertisement,
        config: &MonitorConfig,
        now: OffsetDateTime,
    ) -> Observation {
        let frame = &advertisement.frame;

        match self.traps.get_mut(&frame.trap_id) {
            Some(state) => {
                let observation = match (state.is_tripped, frame.is_tripped) {
                    (false, true) => Observation::Tripped,
                    (true, false) => Observation::Cleared,
                    _ => Observation::Updated,
                };

                state.address = advertisement.address.clone();
                state.is_tripped = frame.is_tripped;
                state.battery_volts = frame.battery_volts;
                state.rssi = advertisement.rssi;
                state.event_counter = frame.event_counter;
                state.last_seen = now;
                state.available = true;

                observation
            }
            None => {
                self.traps.insert(
                    frame.trap_id.clone(),
                    TrapState {
                        trap_id: frame.trap_id.clone(),
                        name: config.trap_name(&frame.trap_id),
                        address: advertisement.address.clone(),
                        is_tripped: frame.is_tripped,
                        battery_volts: frame.battery_volts,
                        rssi: advertisement.rssi,
                        event_counter: frame.event_counter,
                        last_seen: now,
                        available: true,
                    },
                );
                Observation::New
            }
        }
    }

    /// Mark traps silent for at least `timeout` as unavailable
    ///
    /// Returns the ids of traps that became unavailable during this call;
    /// traps already marked are not reported again.
    pub fn expire(&mut self, now: OffsetDateTime, timeout: Duration) -> Vec<String> {
        let mut expired: Vec<String> = self
            .traps
            .values_mut()
            .filter(|state| state.available && !is_available(state, now, timeout))
            .map(|state| {
                state.available = false;
                state.trap_id.clone()
            })
            .collect();

        expired.sort();
        expired
    }

    pub fn get(&self, trap_id: &str) -> Option<&TrapState> {
        self.traps.get(trap_id)
    }

    /// All traps ordered by id
    pub fn traps(&self) -> Vec<&TrapState> {
        let mut traps: Vec<&TrapState> = self.traps.values().collect();
        traps.sort_by(|a, b| a.trap_id.cmp(&b.trap_id));
        traps
    }

    pub fn len(&self) -> usize {
        self.traps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traps.is_empty()
    }
}

/// A trap is available while its last advertisement is younger than `timeout`
pub fn is_available(state: &TrapState, now: OffsetDateTime, timeout: Duration) -> bool {
    now - state.last_seen < timeout
}
