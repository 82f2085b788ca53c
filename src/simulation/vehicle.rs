//! Ordinary vehicles on the main road
//!
//! Each vehicle obeys the signal of the nearest junction ahead and gets out
//! of the emergency vehicle's way. Evasion overrides signal stops, and a
//! vehicle stopped at a red right in front of the emergency vehicle creeps
//! forward to make room.

use ordered_float::OrderedFloat;

use super::config::VehicleConfig;
use super::emergency::EmergencyVehicleSnapshot;
use super::events::{SignalSink, StatusTarget};
use super::junction::JunctionController;
use super::road_layout::RoadLayout;
use super::types::{Approach, JunctionId, Position, VehicleId};

/// Vehicle tunables plus the road geometry they drive on
#[derive(Debug, Clone)]
pub struct DrivingRules {
    pub config: VehicleConfig,
    pub road_min_x: f32,
    pub road_max_x: f32,
    pub road_half_width: f32,
}

impl DrivingRules {
    pub fn new(config: &VehicleConfig, layout: &RoadLayout) -> Self {
        let (road_min_x, road_max_x) = layout.road_bounds();
        Self {
            config: config.clone(),
            road_min_x,
            road_max_x,
            road_half_width: layout.half_width(),
        }
    }

    /// Furthest a vehicle of `width` may sit from the centerline
    pub fn max_lateral_offset(&self, width: f32) -> f32 {
        (self.road_half_width - width / 2.0).max(0.0)
    }
}

/// Notable changes during one vehicle tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VehicleOutcome {
    pub started_evading: bool,
    pub started_creeping: bool,
    pub stopped_at_signal: bool,
}

#[derive(Debug, Clone)]
pub struct VehicleAgent {
    pub id: VehicleId,
    /// Longitudinal position along the main road
    pub x: f32,
    /// Signed cruising speed; positive travels east
    pub nominal_speed: f32,
    pub current_speed: f32,
    /// Lateral offset of the vehicle's own lane
    pub lane_offset: f32,
    pub current_lateral_offset: f32,
    pub target_lateral_offset: f32,
    pub stopped_for_signal: bool,
    pub evading: bool,
    pub creeping: bool,
    pub length: f32,
    pub width: f32,
    pub color: [u8; 3],
    relevant_junction: Option<JunctionId>,
}

impl VehicleAgent {
    pub fn new(
        id: VehicleId,
        x: f32,
        lane_offset: f32,
        nominal_speed: f32,
        config: &VehicleConfig,
        color: [u8; 3],
    ) -> Self {
        Self {
            id,
            x,
            nominal_speed,
            current_speed: nominal_speed,
            lane_offset,
            current_lateral_offset: lane_offset,
            target_lateral_offset: lane_offset,
            stopped_for_signal: false,
            evading: false,
            creeping: false,
            length: config.length,
            width: config.width,
            color,
            relevant_junction: None,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, 0.0, self.current_lateral_offset)
    }

    /// +1 for eastbound, -1 for westbound
    pub fn travel_sign(&self) -> f32 {
        if self.nominal_speed >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    pub fn approach(&self) -> Approach {
        Approach::for_main_road_speed(self.nominal_speed)
    }

    pub fn relevant_junction(&self) -> Option<JunctionId> {
        self.relevant_junction
    }

    /// Nearest junction ahead within the detection distance, with the
    /// distance to its center. Equal distances go to the lower index.
    pub fn find_relevant_junction<'a>(
        &self,
        junctions: &'a [JunctionController],
        detection_distance: f32,
    ) -> Option<(&'a JunctionController, f32)> {
        let sign = self.travel_sign();
        junctions
            .iter()
            .filter_map(|junction| {
                let ahead = (junction.center.x - self.x) * sign;
                (ahead > 0.0 && ahead <= detection_distance).then_some((junction, ahead))
            })
            .min_by_key(|(_, ahead)| OrderedFloat(*ahead))
    }

    pub fn update(
        &mut self,
        delta_secs: f32,
        junctions: &[JunctionController],
        emergency: &EmergencyVehicleSnapshot,
        rules: &DrivingRules,
        sink: &mut dyn SignalSink,
    ) -> VehicleOutcome {
        let mut outcome = VehicleOutcome::default();
        self.obey_signal(junctions, rules, sink, &mut outcome);
        self.react_to_emergency(emergency, rules, sink, &mut outcome);
        self.integrate(delta_secs, rules);
        outcome
    }

    fn obey_signal(
        &mut self,
        junctions: &[JunctionController],
        rules: &DrivingRules,
        sink: &mut dyn SignalSink,
        outcome: &mut VehicleOutcome,
    ) {
        let config = &rules.config;
        let relevant = self.find_relevant_junction(junctions, config.detection_distance);
        self.relevant_junction = relevant.map(|(junction, _)| junction.id);

        let must_stop = relevant.is_some_and(|(junction, ahead)| {
            let front_before_line = ahead - self.length / 2.0 >= config.stop_line_offset;
            let stop_color = junction
                .light_color(self.approach())
                .is_some_and(|color| color.requires_stop());
            stop_color && front_before_line && ahead <= config.stop_distance
        });

        if must_stop {
            if !self.evading && !self.stopped_for_signal {
                self.stopped_for_signal = true;
                self.current_speed = 0.0;
                outcome.stopped_at_signal = true;
                sink.status_text(StatusTarget::Vehicle(self.id), "Stopped at signal");
            }
        } else {
            if self.stopped_for_signal {
                sink.status_text(StatusTarget::Vehicle(self.id), "Proceeding");
            }
            self.stopped_for_signal = false;
            if !self.evading {
                self.creeping = false;
                self.current_speed = self.nominal_speed;
            }
        }
    }

    fn react_to_emergency(
        &mut self,
        emergency: &EmergencyVehicleSnapshot,
        rules: &DrivingRules,
        sink: &mut dyn SignalSink,
        outcome: &mut VehicleOutcome,
    ) {
        let config = &rules.config;
        let (dx, dz) = if emergency.active {
            let rel = self.position().sub(&emergency.position);
            // Lateral offset measured from the vehicle's own lane so that
            // the evasive shift does not take it out of the window
            (rel.dot(&emergency.direction), self.lane_offset - emergency.position.z)
        } else {
            (f32::NEG_INFINITY, f32::INFINITY)
        };

        let in_window = dx >= -self.length
            && dx <= config.evasion_distance
            && dz.abs() < config.evasion_lateral_window;

        if !in_window {
            if self.evading {
                self.evading = false;
                self.creeping = false;
                self.target_lateral_offset = self.lane_offset;
                self.current_speed = if self.stopped_for_signal {
                    0.0
                } else {
                    self.nominal_speed
                };
                sink.status_text(StatusTarget::Vehicle(self.id), "Returning to lane");
            }
            return;
        }

        if !self.evading {
            self.evading = true;
            self.target_lateral_offset = self.evasion_target(dz, rules);
            outcome.started_evading = true;
            sink.status_text(StatusTarget::Vehicle(self.id), "Evading");
        }

        if self.stopped_for_signal && dx <= config.needs_way_distance && !self.creeping {
            self.creeping = true;
            self.current_speed = self.nominal_speed * config.creep_fraction;
            outcome.started_creeping = true;
            sink.status_text(StatusTarget::Vehicle(self.id), "Creeping (yielding)");
        }
    }

    /// Lateral offset away from the emergency vehicle's lane, kept on the road
    fn evasion_target(&self, dz: f32, rules: &DrivingRules) -> f32 {
        let away = if dz != 0.0 {
            dz.signum()
        } else if self.lane_offset != 0.0 {
            // Same lane: pull toward the curb on this side of the road
            self.lane_offset.signum()
        } else {
            1.0
        };
        let limit = rules.max_lateral_offset(self.width);
        (self.current_lateral_offset + away * rules.config.evasion_shift).clamp(-limit, limit)
    }

    fn integrate(&mut self, delta_secs: f32, rules: &DrivingRules) {
        let moving = !self.stopped_for_signal || (self.evading && self.current_speed != 0.0);
        if moving {
            self.x += self.current_speed * delta_secs;
        }

        let blend = 1.0 - (-rules.config.lateral_damping * delta_secs).exp();
        self.current_lateral_offset +=
            (self.target_lateral_offset - self.current_lateral_offset) * blend;

        let span = rules.road_max_x - rules.road_min_x;
        if span > 0.0 {
            if self.x > rules.road_max_x {
                self.x -= span;
            } else if self.x < rules.road_min_x {
                self.x += span;
            }
        }
    }
}
