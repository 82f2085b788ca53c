//! Simulation configuration
//!
//! Every tunable is a plain number read once at setup. A config file only
//! needs to name the values it changes; everything else keeps its default.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::error::ConfigError;

/// Top-level configuration for a simulation run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub layout: LayoutConfig,
    pub signals: PhaseDurations,
    pub preemption: PreemptionConfig,
    pub sensors: SensorConfig,
    pub vehicles: VehicleConfig,
    pub emergency: EmergencyConfig,
    pub simulation: StepConfig,
}

/// Road and junction geometry
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Number of junctions along the main road
    pub junction_count: usize,
    /// Distance between neighbouring junction centers
    pub junction_spacing: f32,
    /// Side length of the square junction box
    pub junction_size: f32,
    /// Full width of the main road, both directions
    pub road_width: f32,
    pub lane_width: f32,
    pub lanes_per_direction: usize,
    /// Road extent beyond the first and last junction
    pub road_margin: f32,
    /// Reflector sensors placed on each approach of every junction
    pub sensors_per_approach: usize,
    pub sensor_spacing: f32,
    /// Gap between the junction box edge and the nearest sensor
    pub sensor_first_offset: f32,
    /// Junction indices built without signal heads
    pub unsignalized_junctions: Vec<usize>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            junction_count: 3,
            junction_spacing: 200.0,
            junction_size: 20.0,
            road_width: 14.0,
            lane_width: 3.5,
            lanes_per_direction: 2,
            road_margin: 250.0,
            sensors_per_approach: 5,
            sensor_spacing: 6.0,
            sensor_first_offset: 4.0,
            unsignalized_junctions: Vec::new(),
        }
    }
}

/// Durations in seconds of the normal signal phases
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseDurations {
    pub ew_green: f32,
    pub ew_yellow: f32,
    pub ns_green: f32,
    pub ns_yellow: f32,
    pub all_red: f32,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            ew_green: 12.0,
            ew_yellow: 3.0,
            ns_green: 10.0,
            ns_yellow: 3.0,
            all_red: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreemptionConfig {
    /// Distance from a junction center at which the zone trigger fires
    pub radius: f32,
    /// How far past the center the emergency vehicle (and its target) must be
    /// before the junction is released
    pub release_distance: f32,
    /// Multiple of the junction size inside which the vehicle always counts as
    /// moving toward the junction
    pub near_field_factor: f32,
    /// Preemption age after which a stalled release is reported
    pub release_watchdog_secs: f32,
}

impl Default for PreemptionConfig {
    fn default() -> Self {
        Self {
            radius: 150.0,
            release_distance: 15.0,
            near_field_factor: 1.5,
            release_watchdog_secs: 60.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    /// Radius inside which a sensor detects the siren itself
    pub direct_radius: f32,
    /// Radius inside which a sensor relays a neighbour's detection
    pub chain_radius: f32,
    /// Length of the visual pulse in seconds
    pub pulse_duration: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            direct_radius: 40.0,
            chain_radius: 10.0,
            pulse_duration: 0.6,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VehicleConfig {
    pub count: usize,
    pub min_speed: f32,
    pub max_speed: f32,
    pub length: f32,
    pub width: f32,
    /// Look-ahead for the junction whose signal a vehicle obeys
    pub detection_distance: f32,
    /// Distance from junction center to the stop line
    pub stop_line_offset: f32,
    /// Distance from junction center inside which a red/yellow stops a vehicle
    pub stop_distance: f32,
    /// Distance ahead of the emergency vehicle inside which vehicles evade
    pub evasion_distance: f32,
    /// Lateral offset from the emergency vehicle inside which vehicles evade
    pub evasion_lateral_window: f32,
    /// Sideways shift applied when evading
    pub evasion_shift: f32,
    /// Distance inside which a vehicle stopped at a signal creeps forward
    pub needs_way_distance: f32,
    /// Fraction of nominal speed used while creeping
    pub creep_fraction: f32,
    /// Rate constant of the lateral exponential approach, per second
    pub lateral_damping: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            count: 12,
            min_speed: 8.0,
            max_speed: 14.0,
            length: 4.5,
            width: 2.0,
            detection_distance: 60.0,
            stop_line_offset: 12.0,
            stop_distance: 30.0,
            evasion_distance: 50.0,
            evasion_lateral_window: 3.0,
            evasion_shift: 2.5,
            needs_way_distance: 15.0,
            creep_fraction: 0.3,
            lateral_damping: 4.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmergencyConfig {
    pub speed: f32,
    /// Seconds between reaching the end of the route and disappearing
    pub fade_duration: f32,
    /// Seconds after start before the first dispatch. None waits for a
    /// manual dispatch.
    pub start_delay: Option<f32>,
    /// Seconds after a fade before the next dispatch. None dispatches once.
    pub repeat_interval: Option<f32>,
    /// Lane index within the travel direction, 0 being next to the centerline
    pub lane: usize,
    /// Travel westbound instead of eastbound
    pub westbound: bool,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            speed: 25.0,
            fade_duration: 2.0,
            start_delay: Some(3.0),
            repeat_interval: None,
            lane: 0,
            westbound: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepConfig {
    /// Largest time step a single tick will integrate
    pub max_step: f32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self { max_step: 0.1 }
    }
}

impl SimConfig {
    /// Load a config from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positives = [
            ("layout.junction_spacing", self.layout.junction_spacing),
            ("layout.junction_size", self.layout.junction_size),
            ("layout.road_width", self.layout.road_width),
            ("layout.lane_width", self.layout.lane_width),
            ("layout.road_margin", self.layout.road_margin),
            ("signals.ew_green", self.signals.ew_green),
            ("signals.ew_yellow", self.signals.ew_yellow),
            ("signals.ns_green", self.signals.ns_green),
            ("signals.ns_yellow", self.signals.ns_yellow),
            ("signals.all_red", self.signals.all_red),
            ("preemption.radius", self.preemption.radius),
            ("preemption.release_watchdog_secs", self.preemption.release_watchdog_secs),
            ("sensors.direct_radius", self.sensors.direct_radius),
            ("sensors.pulse_duration", self.sensors.pulse_duration),
            ("vehicles.length", self.vehicles.length),
            ("vehicles.width", self.vehicles.width),
            ("vehicles.min_speed", self.vehicles.min_speed),
            ("vehicles.lateral_damping", self.vehicles.lateral_damping),
            ("emergency.speed", self.emergency.speed),
            ("simulation.max_step", self.simulation.max_step),
        ];
        for (field, value) in positives {
            if !(value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.vehicles.max_speed < self.vehicles.min_speed {
            return Err(ConfigError::InvertedRange {
                field: "vehicles.speed",
                min: self.vehicles.min_speed,
                max: self.vehicles.max_speed,
            });
        }

        if !(0.0..=1.0).contains(&self.vehicles.creep_fraction) {
            return Err(ConfigError::OutOfRange {
                field: "vehicles.creep_fraction",
                value: self.vehicles.creep_fraction,
                min: 0.0,
                max: 1.0,
            });
        }

        if self.layout.lanes_per_direction == 0 {
            return Err(ConfigError::NoLanes);
        }

        let lanes_width = self.layout.lane_width * self.layout.lanes_per_direction as f32 * 2.0;
        if lanes_width > self.layout.road_width + f32::EPSILON {
            return Err(ConfigError::LanesExceedRoad {
                lanes_width,
                road_width: self.layout.road_width,
            });
        }

        if self.emergency.lane >= self.layout.lanes_per_direction {
            return Err(ConfigError::EmergencyLaneOutOfRange {
                lane: self.emergency.lane,
                lanes: self.layout.lanes_per_direction,
            });
        }

        Ok(())
    }

    /// Total time for one pass through the normal phase sequence
    pub fn cycle_length(&self) -> f32 {
        let s = &self.signals;
        s.ew_green + s.ew_yellow + s.ns_green + s.ns_yellow + 2.0 * s.all_red
    }
}
