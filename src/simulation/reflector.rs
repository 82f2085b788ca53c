//! Roadside reflector sensors and the per-junction detection chain
//!
//! A sensor fires when the siren is inside its direct radius, or when the
//! sensor most recently added to its junction's chain sits inside its relay
//! radius. The chain therefore creeps along a line of sensors at most one
//! hop per tick.

use super::config::SensorConfig;
use super::types::{Position, SensorId};

/// Bounded-duration visual pulse, advanced by the simulation tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SignalPulse {
    pub active: bool,
    pub remaining: f32,
}

impl SignalPulse {
    pub fn fire(&mut self, duration: f32) {
        self.active = true;
        self.remaining = duration;
    }

    /// Returns true on the tick the pulse expires
    pub fn tick(&mut self, delta_secs: f32) -> bool {
        if !self.active {
            return false;
        }
        self.remaining -= delta_secs;
        if self.remaining <= 0.0 {
            self.active = false;
            self.remaining = 0.0;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone)]
pub struct ReflectorSensor {
    pub id: SensorId,
    pub position: Position,
    pub pulse: SignalPulse,
    pub direct_radius: f32,
    pub chain_radius: f32,
    pub pulse_duration: f32,
}

impl ReflectorSensor {
    pub fn new(id: SensorId, position: Position, config: &SensorConfig) -> Self {
        Self {
            id,
            position,
            pulse: SignalPulse::default(),
            direct_radius: config.direct_radius,
            chain_radius: config.chain_radius,
            pulse_duration: config.pulse_duration,
        }
    }

    pub fn can_detect_vehicle(&self, vehicle_pos: &Position) -> bool {
        self.position.distance(vehicle_pos) < self.direct_radius
    }

    pub fn is_near_other_sensor(&self, other_pos: &Position) -> bool {
        self.position.distance(other_pos) < self.chain_radius
    }

    pub fn is_signaling(&self) -> bool {
        self.pulse.active
    }
}

/// A sensor that joined the chain this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainActivation {
    pub sensor: SensorId,
    /// Position of the sensor in placement order
    pub index: usize,
    /// The chain was empty before this activation
    pub first: bool,
    /// Fired by the relay rather than by direct detection
    pub relayed: bool,
    pub pulse_duration: f32,
}

/// Ordered sensors of one junction plus the ones triggered so far
#[derive(Debug, Clone, Default)]
pub struct ReflectorChain {
    sensors: Vec<ReflectorSensor>,
    /// Indices into `sensors`, in activation order
    chain: Vec<usize>,
}

impl ReflectorChain {
    pub fn new(sensors: Vec<ReflectorSensor>) -> Self {
        Self {
            sensors,
            chain: Vec::new(),
        }
    }

    pub fn sensors(&self) -> &[ReflectorSensor] {
        &self.sensors
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    fn last_chained(&self) -> Option<&ReflectorSensor> {
        self.chain.last().map(|&i| &self.sensors[i])
    }

    /// Look for the next sensor to fire.
    ///
    /// Scans in placement order and stops at the first unchained sensor that
    /// detects the vehicle or is near the last chained sensor.
    pub fn scan(&mut self, vehicle_pos: &Position) -> Option<ChainActivation> {
        let last_pos = self.last_chained().map(|s| s.position);
        let was_empty = self.chain.is_empty();

        let (index, relayed) = self
            .sensors
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.chain.contains(i))
            .find_map(|(i, sensor)| {
                if sensor.can_detect_vehicle(vehicle_pos) {
                    Some((i, false))
                } else if last_pos.is_some_and(|p| sensor.is_near_other_sensor(&p)) {
                    Some((i, true))
                } else {
                    None
                }
            })?;

        let sensor = &mut self.sensors[index];
        sensor.pulse.fire(sensor.pulse_duration);
        self.chain.push(index);

        Some(ChainActivation {
            sensor: sensor.id,
            index,
            first: was_empty,
            relayed,
            pulse_duration: sensor.pulse_duration,
        })
    }

    /// Count down sensor pulses
    pub fn tick_pulses(&mut self, delta_secs: f32) {
        for sensor in &mut self.sensors {
            sensor.pulse.tick(delta_secs);
        }
    }

    /// Forget every triggered sensor
    pub fn clear(&mut self) {
        self.chain.clear();
    }
}
