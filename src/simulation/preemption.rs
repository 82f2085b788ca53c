//! Cross-junction preemption decisions
//!
//! Each tick, for every junction the emergency vehicle has not yet passed:
//! the proximity zone is checked first, then the reflector chain, then the
//! pass-through release.

use log::{info, warn};

use super::config::PreemptionConfig;
use super::emergency::EmergencyVehicleSnapshot;
use super::events::SignalSink;
use super::junction::{JunctionController, PreemptTrigger};
use super::types::{JunctionId, Position};

/// What the coordinator changed during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreemptionReport {
    pub preempted: Vec<JunctionId>,
    pub released: Vec<JunctionId>,
    pub pulses: usize,
}

#[derive(Debug, Clone)]
pub struct PreemptionCoordinator {
    config: PreemptionConfig,
    junction_size: f32,
}

impl PreemptionCoordinator {
    pub fn new(config: &PreemptionConfig, junction_size: f32) -> Self {
        Self {
            config: config.clone(),
            junction_size,
        }
    }

    /// Whether the vehicle is heading into the junction at `center`.
    ///
    /// True inside the near field regardless of heading. Otherwise the center
    /// must lie ahead and the current path target must reach or close on it.
    pub fn is_moving_toward(&self, center: &Position, snapshot: &EmergencyVehicleSnapshot) -> bool {
        let to_center = center.sub(&snapshot.position);
        let distance = to_center.length();
        if distance < self.config.near_field_factor * self.junction_size {
            return true;
        }

        let along_center = to_center.dot(&snapshot.direction);
        if along_center <= 0.0 {
            return false;
        }

        let along_target = snapshot.target.sub(&snapshot.position).dot(&snapshot.direction);
        along_target >= along_center || snapshot.target.distance(center) < distance
    }

    pub fn update(
        &self,
        junctions: &mut [JunctionController],
        snapshot: &EmergencyVehicleSnapshot,
        sink: &mut dyn SignalSink,
    ) -> PreemptionReport {
        let mut report = PreemptionReport::default();
        if !snapshot.active {
            return report;
        }

        for junction in junctions.iter_mut() {
            if junction.has_vehicle_passed() {
                continue;
            }
            self.update_junction(junction, snapshot, sink, &mut report);
        }
        report
    }

    fn update_junction(
        &self,
        junction: &mut JunctionController,
        snapshot: &EmergencyVehicleSnapshot,
        sink: &mut dyn SignalSink,
        report: &mut PreemptionReport,
    ) {
        let mut triggers_changed = false;

        // Zone
        let in_zone = junction.center.distance(&snapshot.position) < self.config.radius;
        if in_zone && self.is_moving_toward(&junction.center, snapshot) {
            if !junction.is_preempted() && junction.preempt(&snapshot.direction, sink) {
                report.preempted.push(junction.id);
            }
            triggers_changed |= junction.record_trigger(PreemptTrigger::Zone);
        }

        // Reflectors
        if let Some(activation) = junction.chain.scan(&snapshot.position) {
            report.pulses += 1;
            sink.reflector_pulse(activation.sensor, (activation.pulse_duration * 1000.0) as u32);
            if activation.first {
                if !junction.is_preempted() && junction.preempt(&snapshot.direction, sink) {
                    report.preempted.push(junction.id);
                }
                triggers_changed |= junction.record_trigger(PreemptTrigger::Reflectors);
            }
        }

        if triggers_changed && junction.is_preempted() {
            junction.announce_triggers(sink);
        }

        // Release
        if junction.is_preempted() {
            if junction.vehicle_has_cleared(
                &snapshot.position,
                &snapshot.target,
                self.config.release_distance,
            ) {
                if junction.release(sink) {
                    info!("{} released after emergency vehicle passed", junction.id);
                    report.released.push(junction.id);
                }
            } else if junction.check_watchdog(self.config.release_watchdog_secs) {
                warn!(
                    "{} preempted for {:.1}s without the vehicle clearing it \
                     (vehicle at ({:.1}, {:.1}), target ({:.1}, {:.1}))",
                    junction.id,
                    junction.preempted_for(),
                    snapshot.position.x,
                    snapshot.position.z,
                    snapshot.target.x,
                    snapshot.target.z
                );
            }
        }
    }

    /// Release every junction still held once the vehicle is gone
    pub fn release_all(
        &self,
        junctions: &mut [JunctionController],
        sink: &mut dyn SignalSink,
    ) -> Vec<JunctionId> {
        let mut released = Vec::new();
        for junction in junctions.iter_mut() {
            if junction.release_with_status("Released (vehicle departed)", sink) {
                warn!("{} was still preempted when the emergency vehicle left", junction.id);
                released.push(junction.id);
            }
        }
        released
    }
}
