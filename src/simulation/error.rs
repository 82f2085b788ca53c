//! Error types for the simulation core.
//!
//! Nothing here is fatal to the tick loop. Setup code surfaces these through
//! `anyhow`, lookups log them and hand back "no data".

use super::types::{Approach, JunctionId};

/// A configuration value the simulation cannot run with.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value that must be strictly positive was zero, negative or NaN.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A value fell outside its allowed interval.
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// A min/max pair where min exceeds max.
    #[error("{field}: minimum {min} exceeds maximum {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("layout needs at least one lane per direction")]
    NoLanes,

    #[error("lanes need {lanes_width} units but the road is {road_width} wide")]
    LanesExceedRoad { lanes_width: f32, road_width: f32 },

    #[error("emergency lane {lane} does not exist (only {lanes} lanes per direction)")]
    EmergencyLaneOutOfRange { lane: usize, lanes: usize },
}

/// A lookup that referenced something the world does not have.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("junction index {0} is out of range")]
    JunctionOutOfRange(usize),

    #[error("junction {junction} has no {approach:?} light")]
    MissingLight {
        junction: JunctionId,
        approach: Approach,
    },

    #[error("vehicle index {0} is out of range")]
    VehicleOutOfRange(usize),
}
