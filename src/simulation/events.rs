//! Notifications from the core to whatever presents it
//!
//! The core never draws anything. It reports light changes, sensor flashes
//! and status messages through a [`SignalSink`], and the presentation side
//! decides what to do with them.

use log::{debug, info};

use super::types::{JunctionId, LightColors, SensorId, VehicleId};

/// Who a status message is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTarget {
    Junction(JunctionId),
    Vehicle(VehicleId),
    EmergencyVehicle,
}

/// Receiver for state-change notifications
pub trait SignalSink {
    /// Displayed light colors of a junction changed
    fn apply_light_colors(&mut self, junction: JunctionId, colors: &LightColors);

    /// A sensor should flash for `duration_ms`
    fn reflector_pulse(&mut self, sensor: SensorId, duration_ms: u32);

    /// Free-text status for display
    fn status_text(&mut self, target: StatusTarget, message: &str);
}

/// A recorded notification
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    LightColors {
        junction: JunctionId,
        colors: LightColors,
    },
    ReflectorPulse {
        sensor: SensorId,
        duration_ms: u32,
    },
    Status {
        target: StatusTarget,
        message: String,
    },
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl SignalSink for NullSink {
    fn apply_light_colors(&mut self, _junction: JunctionId, _colors: &LightColors) {}
    fn reflector_pulse(&mut self, _sensor: SensorId, _duration_ms: u32) {}
    fn status_text(&mut self, _target: StatusTarget, _message: &str) {}
}

/// Writes notifications to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl SignalSink for LogSink {
    fn apply_light_colors(&mut self, junction: JunctionId, colors: &LightColors) {
        let summary: Vec<String> = colors
            .iter()
            .map(|(approach, color)| format!("{}={:?}", approach.short_name(), color))
            .collect();
        debug!("{} lights: {}", junction, summary.join(" "));
    }

    fn reflector_pulse(&mut self, sensor: SensorId, duration_ms: u32) {
        debug!("{} pulse {}ms", sensor, duration_ms);
    }

    fn status_text(&mut self, target: StatusTarget, message: &str) {
        match target {
            StatusTarget::Junction(id) => info!("{}: {}", id, message),
            StatusTarget::Vehicle(id) => debug!("{}: {}", id, message),
            StatusTarget::EmergencyVehicle => info!("Emergency vehicle: {}", message),
        }
    }
}

/// Keeps every notification in order
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SimEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status messages for one target, oldest first
    pub fn statuses_for(&self, target: StatusTarget) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::Status { target: t, message } if *t == target => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn pulse_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SimEvent::ReflectorPulse { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl SignalSink for RecordingSink {
    fn apply_light_colors(&mut self, junction: JunctionId, colors: &LightColors) {
        self.events.push(SimEvent::LightColors {
            junction,
            colors: colors.clone(),
        });
    }

    fn reflector_pulse(&mut self, sensor: SensorId, duration_ms: u32) {
        self.events.push(SimEvent::ReflectorPulse {
            sensor,
            duration_ms,
        });
    }

    fn status_text(&mut self, target: StatusTarget, message: &str) {
        self.events.push(SimEvent::Status {
            target,
            message: message.to_string(),
        });
    }
}
