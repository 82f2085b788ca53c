//! Main simulation world that ties everything together
//!
//! `SimWorld` owns every junction, the emergency vehicle and all ordinary
//! vehicles, and runs the strictly ordered tick: emergency vehicle, then
//! junctions and preemption, then vehicles.

use anyhow::{Context, Result};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;
use rand::SeedableRng;

use super::config::SimConfig;
use super::emergency::{EmergencyTransition, EmergencyVehicle};
use super::error::SimError;
use super::events::{SignalSink, StatusTarget};
use super::junction::JunctionController;
use super::preemption::PreemptionCoordinator;
use super::reflector::{ReflectorChain, ReflectorSensor};
use super::road_layout::RoadLayout;
use super::types::{Approach, JunctionId, SensorId, SimId, VehicleId};
use super::vehicle::{DrivingRules, VehicleAgent};

/// Body colors handed out to spawned vehicles
const VEHICLE_PALETTE: [[u8; 3]; 6] = [
    [200, 40, 40],
    [40, 90, 200],
    [230, 230, 230],
    [30, 30, 30],
    [60, 160, 80],
    [220, 180, 40],
];

/// Running totals for a simulation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimStats {
    pub ticks: u64,
    pub dispatches: usize,
    pub preemptions: usize,
    pub releases: usize,
    pub forced_releases: usize,
    pub sensor_pulses: usize,
    pub evasions: usize,
    pub creeps: usize,
    pub signal_stops: usize,
}

/// The main simulation world
pub struct SimWorld {
    pub config: SimConfig,
    pub layout: RoadLayout,
    pub junctions: Vec<JunctionController>,
    pub emergency: EmergencyVehicle,
    pub vehicles: Vec<VehicleAgent>,
    coordinator: PreemptionCoordinator,
    rules: DrivingRules,

    /// Next ID to assign
    next_id: usize,

    /// Simulation time
    pub time: f32,

    /// Countdown to the next automatic dispatch
    dispatch_timer: Option<f32>,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,

    pub stats: SimStats,
}

impl SimWorld {
    fn new_internal(config: SimConfig, rng: Option<StdRng>) -> Result<Self> {
        config.validate().context("Invalid simulation config")?;

        let layout = RoadLayout::new(&config.layout, &config.emergency);
        let coordinator = PreemptionCoordinator::new(&config.preemption, layout.junction_size);
        let rules = DrivingRules::new(&config.vehicles, &layout);
        let emergency = EmergencyVehicle::new(layout.emergency_path().to_vec(), &config.emergency);

        let mut world = Self {
            dispatch_timer: config.emergency.start_delay,
            config,
            layout,
            junctions: Vec::new(),
            emergency,
            vehicles: Vec::new(),
            coordinator,
            rules,
            next_id: 0,
            time: 0.0,
            rng,
            stats: SimStats::default(),
        };

        world.build_junctions();
        for _ in 0..world.config.vehicles.count {
            world.spawn_random_vehicle();
        }
        Ok(world)
    }

    pub fn new(config: SimConfig) -> Result<Self> {
        Self::new_internal(config, None)
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(config: SimConfig, seed: u64) -> Result<Self> {
        Self::new_internal(config, Some(StdRng::seed_from_u64(seed)))
    }

    /// Get a random value in the given range, using seeded RNG if available
    fn random_range(&mut self, range: std::ops::Range<f32>) -> f32 {
        if range.is_empty() {
            return range.start;
        }
        match &mut self.rng {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    }

    fn random_index(&mut self, len: usize) -> usize {
        match &mut self.rng {
            Some(rng) => rng.random_range(0..len),
            None => rand::rng().random_range(0..len),
        }
    }

    fn random_color(&mut self) -> [u8; 3] {
        let color = match &mut self.rng {
            Some(rng) => VEHICLE_PALETTE.choose(rng),
            None => VEHICLE_PALETTE.choose(&mut rand::rng()),
        };
        color.copied().unwrap_or([255, 255, 255])
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    fn build_junctions(&mut self) {
        let centers = self.layout.junction_centers().to_vec();
        for (index, center) in centers.into_iter().enumerate() {
            let sensors = self
                .layout
                .junction_reflectors(index)
                .into_iter()
                .map(|pos| {
                    let id = SensorId(self.next_sim_id());
                    ReflectorSensor::new(id, pos, &self.config.sensors)
                })
                .collect();
            let chain = ReflectorChain::new(sensors);
            let id = JunctionId(SimId(index));

            let junction = if self.layout.is_signalized(index) {
                JunctionController::new(id, center, &self.config.signals, chain)
            } else {
                warn!("{} has no signal heads; it will neither cycle nor preempt", id);
                JunctionController::with_lights(id, center, &[], &self.config.signals, chain)
            };
            self.junctions.push(junction);
        }
    }

    /// Add a vehicle in a given main-road lane
    pub fn spawn_vehicle(
        &mut self,
        x: f32,
        approach: Approach,
        lane: usize,
        speed: f32,
    ) -> VehicleId {
        let id = VehicleId(self.next_sim_id());
        let lane_offset = self.layout.lane_offset(approach, lane);
        let signed_speed = match approach {
            Approach::Westbound => -speed.abs(),
            _ => speed.abs(),
        };
        let color = self.random_color();
        let vehicle = VehicleAgent::new(
            id,
            x,
            lane_offset,
            signed_speed,
            &self.config.vehicles,
            color,
        );
        self.vehicles.push(vehicle);
        id
    }

    /// Add a vehicle with a random lane, direction, position and speed
    pub fn spawn_random_vehicle(&mut self) -> VehicleId {
        let approach = if self.random_index(2) == 0 {
            Approach::Eastbound
        } else {
            Approach::Westbound
        };
        let lane = self.random_index(self.layout.lanes_per_direction.max(1));
        let (min_x, max_x) = self.layout.road_bounds();
        let x = self.random_range(min_x..max_x);
        let speeds = self.config.vehicles.min_speed..self.config.vehicles.max_speed;
        let speed = self.random_range(speeds);
        self.spawn_vehicle(x, approach, lane, speed)
    }

    pub fn try_junction(&self, index: usize) -> Result<&JunctionController, SimError> {
        self.junctions
            .get(index)
            .ok_or(SimError::JunctionOutOfRange(index))
    }

    /// Junction by index. Out-of-range indices log a warning.
    pub fn junction(&self, index: usize) -> Option<&JunctionController> {
        match self.try_junction(index) {
            Ok(junction) => Some(junction),
            Err(err) => {
                warn!("{}", err);
                None
            }
        }
    }

    /// Vehicle by index. Out-of-range indices log a warning.
    pub fn vehicle(&self, index: usize) -> Option<&VehicleAgent> {
        let found = self.vehicles.get(index);
        if found.is_none() {
            warn!("{}", SimError::VehicleOutOfRange(index));
        }
        found
    }

    /// Report the current colors of every junction to the sink
    pub fn announce(&self, sink: &mut dyn SignalSink) {
        for junction in &self.junctions {
            if junction.has_all_lights() {
                sink.apply_light_colors(junction.id, &junction.colors());
            }
        }
    }

    /// Send the emergency vehicle down its route. Clears every junction's
    /// passed flag so the new run can preempt them again.
    pub fn dispatch_emergency(&mut self, sink: &mut dyn SignalSink) -> bool {
        if self.emergency.is_active() {
            warn!("Emergency vehicle already on the road; ignoring dispatch");
            return false;
        }
        if !self.emergency.activate() {
            return false;
        }
        for junction in &mut self.junctions {
            junction.reset_for_dispatch(sink);
        }
        self.dispatch_timer = None;
        self.stats.dispatches += 1;
        info!("Emergency vehicle dispatched at t={:.1}s", self.time);
        sink.status_text(StatusTarget::EmergencyVehicle, "Dispatched");
        true
    }

    /// Main simulation tick
    pub fn tick(&mut self, delta_secs: f32, sink: &mut dyn SignalSink) {
        let delta_secs = delta_secs.clamp(0.0, self.config.simulation.max_step);
        self.time += delta_secs;
        self.stats.ticks += 1;

        if let Some(remaining) = self.dispatch_timer.as_mut() {
            *remaining -= delta_secs;
            if *remaining <= 0.0 {
                self.dispatch_timer = None;
                self.dispatch_emergency(sink);
            }
        }

        self.update_emergency(delta_secs, sink);
        self.update_junctions(delta_secs, sink);
        self.update_vehicles(delta_secs, sink);
    }

    fn update_emergency(&mut self, delta_secs: f32, sink: &mut dyn SignalSink) {
        match self.emergency.update(delta_secs) {
            Some(EmergencyTransition::Departed) => {
                info!("Emergency vehicle reached the end of its route");
                sink.status_text(StatusTarget::EmergencyVehicle, "Departed");
            }
            Some(EmergencyTransition::Faded) => {
                sink.status_text(StatusTarget::EmergencyVehicle, "Faded");
                let released = self.coordinator.release_all(&mut self.junctions, sink);
                self.stats.forced_releases += released.len();
                self.dispatch_timer = self.config.emergency.repeat_interval;
            }
            None => {}
        }
    }

    fn update_junctions(&mut self, delta_secs: f32, sink: &mut dyn SignalSink) {
        for junction in &mut self.junctions {
            junction.tick_pulses(delta_secs);
        }

        let snapshot = self.emergency.snapshot();
        let report = self.coordinator.update(&mut self.junctions, &snapshot, sink);
        self.stats.preemptions += report.preempted.len();
        self.stats.releases += report.released.len();
        self.stats.sensor_pulses += report.pulses;

        for junction in &mut self.junctions {
            junction.tick(delta_secs, sink);
        }
    }

    fn update_vehicles(&mut self, delta_secs: f32, sink: &mut dyn SignalSink) {
        let snapshot = self.emergency.snapshot();
        for vehicle in &mut self.vehicles {
            let outcome = vehicle.update(delta_secs, &self.junctions, &snapshot, &self.rules, sink);
            self.stats.evasions += outcome.started_evading as usize;
            self.stats.creeps += outcome.started_creeping as usize;
            self.stats.signal_stops += outcome.stopped_at_signal as usize;
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Preemption Simulation Summary ===");
        println!("Time: {:.2}s", self.time);
        println!(
            "Junctions: {}, Vehicles: {}",
            self.junctions.len(),
            self.vehicles.len()
        );
        println!(
            "Emergency vehicle: {:?} at ({:.1}, {:.1}), waypoint {}/{}",
            self.emergency.lifecycle(),
            self.emergency.position().x,
            self.emergency.position().z,
            self.emergency.waypoint_index(),
            self.emergency.path().len()
        );
        println!();

        println!("--- Junctions ---");
        for junction in &self.junctions {
            let colors: Vec<String> = junction
                .colors()
                .iter()
                .map(|(approach, color)| format!("{}={}", approach.short_name(), color.symbol()))
                .collect();
            println!(
                "  {}: {:?}, phase={} ({:.1}s left), chain={}, lights=[{}], status={}",
                junction.id,
                junction.mode(),
                junction.cycle().current_phase().name.label(),
                junction.cycle().remaining(),
                junction.chain.len(),
                colors.join(" "),
                junction.status()
            );
        }

        let stopped = self.vehicles.iter().filter(|v| v.stopped_for_signal).count();
        let evading = self.vehicles.iter().filter(|v| v.evading).count();
        println!("--- Vehicles ---");
        println!("  Stopped for signal: {}", stopped);
        println!("  Evading: {}", evading);
    }

    /// Draw the main road in the terminal. One row per lane, westbound lanes
    /// on top; `>`/`<` are vehicles, `E` the emergency vehicle and the
    /// junction columns show their eastbound/westbound signal.
    pub fn draw_map(&self) {
        const COLUMNS: usize = 100;
        let (min_x, max_x) = self.layout.road_bounds();
        let span = (max_x - min_x).max(1.0);
        let to_col = |x: f32| -> usize {
            (((x - min_x) / span) * (COLUMNS - 1) as f32).round().clamp(0.0, (COLUMNS - 1) as f32)
                as usize
        };

        let lanes = self.layout.lanes_per_direction;
        let mut lane_offsets: Vec<f32> = (0..lanes)
            .rev()
            .map(|lane| self.layout.lane_offset(Approach::Westbound, lane))
            .collect();
        lane_offsets.extend(
            (0..lanes).map(|lane| self.layout.lane_offset(Approach::Eastbound, lane)),
        );
        let to_row = |z: f32| -> usize {
            lane_offsets
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| (*a - z).abs().total_cmp(&(*b - z).abs()))
                .map(|(row, _)| row)
                .unwrap_or(0)
        };

        let mut grid = vec![vec!['.'; COLUMNS]; lane_offsets.len()];
        for junction in &self.junctions {
            let col = to_col(junction.center.x);
            for (row, offset) in lane_offsets.iter().enumerate() {
                let approach = if *offset > 0.0 {
                    Approach::Westbound
                } else {
                    Approach::Eastbound
                };
                grid[row][col] = junction
                    .light_color(approach)
                    .map(|c| c.symbol())
                    .unwrap_or('+');
            }
        }

        for vehicle in &self.vehicles {
            let row = to_row(vehicle.current_lateral_offset);
            let symbol = if vehicle.nominal_speed >= 0.0 { '>' } else { '<' };
            grid[row][to_col(vehicle.x)] = symbol;
        }

        if self.emergency.is_active() {
            let pos = self.emergency.position();
            grid[to_row(pos.z)][to_col(pos.x)] = 'E';
        }

        println!("+{}+", "-".repeat(COLUMNS));
        for row in grid {
            println!("|{}|", row.into_iter().collect::<String>());
        }
        println!("+{}+", "-".repeat(COLUMNS));
    }
}
