//! Standalone preemption simulation module
//!
//! All junction control, preemption and vehicle behavior lives here. It runs
//! without any renderer and reports what a display would need through a
//! [`SignalSink`].

mod config;
mod emergency;
mod error;
mod events;
mod junction;
mod light_cycle;
mod preemption;
mod reflector;
mod road_layout;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
pub use config::{
    EmergencyConfig, LayoutConfig, PhaseDurations, PreemptionConfig, SensorConfig, SimConfig,
    StepConfig, VehicleConfig,
};
pub use emergency::{
    EmergencyLifecycle, EmergencyTransition, EmergencyVehicle, EmergencyVehicleSnapshot,
};
pub use error::{ConfigError, SimError};
pub use events::{LogSink, NullSink, RecordingSink, SignalSink, SimEvent, StatusTarget};
pub use junction::{ApproachLight, JunctionController, JunctionMode, PreemptTrigger};
pub use light_cycle::{LightCycle, Phase, PhaseName};
pub use preemption::{PreemptionCoordinator, PreemptionReport};
pub use reflector::{ChainActivation, ReflectorChain, ReflectorSensor, SignalPulse};
pub use road_layout::RoadLayout;
pub use types::{
    Approach, Axis, JunctionId, LightColor, LightColors, Position, SensorId, SimId, VehicleId,
};
pub use vehicle::{DrivingRules, VehicleAgent, VehicleOutcome};
pub use world::{SimStats, SimWorld};
