//! Junction signal control
//!
//! A junction is either running its fixed-time cycle or held by an
//! emergency-vehicle override. The override always wins: while it is active
//! the cycle is paused and plain color changes are refused by the lights.

use log::{debug, warn};
use std::collections::BTreeMap;

use super::config::PhaseDurations;
use super::error::SimError;
use super::events::{SignalSink, StatusTarget};
use super::light_cycle::{LightCycle, Phase};
use super::reflector::ReflectorChain;
use super::types::{Approach, Axis, JunctionId, LightColor, LightColors, Position};

/// One signal head controlling a single approach
#[derive(Debug, Clone)]
pub struct ApproachLight {
    pub approach: Approach,
    color: LightColor,
    is_overridden: bool,
}

impl ApproachLight {
    pub fn new(approach: Approach, color: LightColor) -> Self {
        Self {
            approach,
            color,
            is_overridden: false,
        }
    }

    pub fn color(&self) -> LightColor {
        self.color
    }

    pub fn is_overridden(&self) -> bool {
        self.is_overridden
    }

    /// Normal color change. Ignored while overridden.
    /// Returns true if the displayed color changed.
    pub fn set_color(&mut self, color: LightColor) -> bool {
        if self.is_overridden {
            debug!(
                "Ignoring {:?} for overridden {} light",
                color,
                self.approach.short_name()
            );
            return false;
        }
        let changed = self.color != color;
        self.color = color;
        changed
    }

    /// Override color change. Always applies and marks the light overridden.
    pub fn override_color(&mut self, color: LightColor) -> bool {
        let changed = self.color != color || !self.is_overridden;
        self.is_overridden = true;
        self.color = color;
        changed
    }

    pub fn release_override(&mut self) {
        self.is_overridden = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunctionMode {
    /// The light cycle drives the signals
    Normal,
    /// An emergency override drives the signals
    Preempted,
}

/// The independent conditions that asked for preemption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreemptTrigger {
    /// Emergency vehicle inside the preemption radius, heading in
    Zone,
    /// The junction's reflector chain picked the vehicle up
    Reflectors,
}

/// Signal state machine of one junction
#[derive(Debug, Clone)]
pub struct JunctionController {
    pub id: JunctionId,
    pub center: Position,
    lights: BTreeMap<Approach, ApproachLight>,
    cycle: LightCycle,
    mode: JunctionMode,
    /// Unit travel direction of the emergency vehicle when preemption began
    preempt_direction: Option<Position>,
    has_vehicle_passed: bool,
    pub chain: ReflectorChain,
    zone_triggered: bool,
    reflectors_triggered: bool,
    /// Seconds spent in the current preemption
    preempted_for: f32,
    watchdog_reported: bool,
    missing_lights_reported: bool,
    status: String,
}

impl JunctionController {
    /// A fully signalized junction
    pub fn new(
        id: JunctionId,
        center: Position,
        durations: &PhaseDurations,
        chain: ReflectorChain,
    ) -> Self {
        Self::with_lights(id, center, &Approach::ALL, durations, chain)
    }

    /// A junction with signal heads on only some approaches. Anything short
    /// of all four leaves the junction dark: it neither cycles nor preempts.
    pub fn with_lights(
        id: JunctionId,
        center: Position,
        approaches: &[Approach],
        durations: &PhaseDurations,
        chain: ReflectorChain,
    ) -> Self {
        let cycle = LightCycle::new(durations);
        let initial = cycle.current_phase().name.light_colors();
        let lights = approaches
            .iter()
            .map(|approach| {
                let color = initial.get(approach).copied().unwrap_or(LightColor::Off);
                (*approach, ApproachLight::new(*approach, color))
            })
            .collect();

        Self {
            id,
            center,
            lights,
            cycle,
            mode: JunctionMode::Normal,
            preempt_direction: None,
            has_vehicle_passed: false,
            chain,
            zone_triggered: false,
            reflectors_triggered: false,
            preempted_for: 0.0,
            watchdog_reported: false,
            missing_lights_reported: false,
            status: "Normal".to_string(),
        }
    }

    pub fn mode(&self) -> JunctionMode {
        self.mode
    }

    pub fn is_preempted(&self) -> bool {
        self.mode == JunctionMode::Preempted
    }

    pub fn has_vehicle_passed(&self) -> bool {
        self.has_vehicle_passed
    }

    pub fn has_all_lights(&self) -> bool {
        Approach::ALL.iter().all(|a| self.lights.contains_key(a))
    }

    pub fn cycle(&self) -> &LightCycle {
        &self.cycle
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn preempted_for(&self) -> f32 {
        self.preempted_for
    }

    pub fn preempt_direction(&self) -> Option<Position> {
        self.preempt_direction
    }

    pub fn try_light_color(&self, approach: Approach) -> Result<LightColor, SimError> {
        self.lights
            .get(&approach)
            .map(ApproachLight::color)
            .ok_or(SimError::MissingLight {
                junction: self.id,
                approach,
            })
    }

    /// Color shown to an approach, or None if the junction has no such light
    pub fn light_color(&self, approach: Approach) -> Option<LightColor> {
        self.try_light_color(approach).ok()
    }

    pub fn colors(&self) -> LightColors {
        self.lights
            .iter()
            .map(|(approach, light)| (*approach, light.color()))
            .collect()
    }

    /// Whether every light's override flag matches the junction's mode
    pub fn overrides_consistent(&self) -> bool {
        let expected = self.is_preempted();
        self.lights.values().all(|l| l.is_overridden() == expected)
    }

    fn set_status(&mut self, message: &str, sink: &mut dyn SignalSink) {
        self.status = message.to_string();
        sink.status_text(StatusTarget::Junction(self.id), message);
    }

    fn warn_missing_lights(&mut self) {
        if !self.missing_lights_reported {
            warn!(
                "{} has {} of 4 signal heads; leaving it dark",
                self.id,
                self.lights.len()
            );
            self.missing_lights_reported = true;
        }
    }

    /// Push a cycle phase's colors onto the lights
    pub fn apply_phase(&mut self, phase: Phase, sink: &mut dyn SignalSink) {
        if !self.has_all_lights() {
            self.warn_missing_lights();
            return;
        }
        let colors = phase.name.light_colors();
        let mut changed = false;
        for (approach, color) in &colors {
            if let Some(light) = self.lights.get_mut(approach) {
                changed |= light.set_color(*color);
            }
        }
        if changed {
            sink.apply_light_colors(self.id, &self.colors());
        }
    }

    /// Count down sensor pulses fired on earlier ticks. Runs before the
    /// reflector scan so a new pulse keeps its full duration.
    pub fn tick_pulses(&mut self, delta_secs: f32) {
        self.chain.tick_pulses(delta_secs);
    }

    /// Per-tick housekeeping: the normal cycle, and the age of a running
    /// preemption
    pub fn tick(&mut self, delta_secs: f32, sink: &mut dyn SignalSink) {
        match self.mode {
            JunctionMode::Normal => {
                if let Some(phase) = self.cycle.tick(delta_secs) {
                    self.apply_phase(phase, sink);
                }
            }
            JunctionMode::Preempted => self.preempted_for += delta_secs,
        }
    }

    /// Enter (or re-assert) preemption for a vehicle travelling along
    /// `direction`. The two approaches on its axis go green, the others red.
    ///
    /// Returns true only on the NORMAL to PREEMPTED transition.
    pub fn preempt(&mut self, direction: &Position, sink: &mut dyn SignalSink) -> bool {
        if !self.has_all_lights() {
            self.warn_missing_lights();
            return false;
        }

        let entering = self.mode == JunctionMode::Normal;
        if entering {
            self.preempt_direction = Some(direction.normalized());
            self.preempted_for = 0.0;
            self.watchdog_reported = false;
            self.mode = JunctionMode::Preempted;
        }

        let axis = self
            .preempt_direction
            .map(|d| Axis::of_direction(&d))
            .unwrap_or(Axis::EastWest);
        let green = axis.approaches();

        let mut changed = false;
        for (approach, light) in self.lights.iter_mut() {
            let color = if green.contains(approach) {
                LightColor::Green
            } else {
                LightColor::Red
            };
            changed |= light.override_color(color);
        }
        if changed {
            sink.apply_light_colors(self.id, &self.colors());
        }
        entering
    }

    /// Note that a trigger condition holds. Returns true if it is new.
    pub fn record_trigger(&mut self, trigger: PreemptTrigger) -> bool {
        let flag = match trigger {
            PreemptTrigger::Zone => &mut self.zone_triggered,
            PreemptTrigger::Reflectors => &mut self.reflectors_triggered,
        };
        let new = !*flag;
        *flag = true;
        new
    }

    pub fn triggers(&self) -> (bool, bool) {
        (self.zone_triggered, self.reflectors_triggered)
    }

    /// Status line describing every trigger seen so far
    pub fn trigger_status(&self) -> &'static str {
        match (self.zone_triggered, self.reflectors_triggered) {
            (true, true) => "Preempting (Zone & Reflectors Active)",
            (true, false) => "Preempting (Zone Active)",
            (false, true) => "Preempting (Reflectors Active)",
            (false, false) => "Preempting",
        }
    }

    pub fn announce_triggers(&mut self, sink: &mut dyn SignalSink) {
        let message = self.trigger_status();
        self.set_status(message, sink);
    }

    /// Whether the emergency vehicle and its current path target are both
    /// more than `release_distance` past the center along the direction
    /// recorded at preemption
    pub fn vehicle_has_cleared(
        &self,
        vehicle_pos: &Position,
        path_target: &Position,
        release_distance: f32,
    ) -> bool {
        let Some(direction) = self.preempt_direction else {
            return false;
        };
        let past = |p: &Position| p.sub(&self.center).dot(&direction) > release_distance;
        past(vehicle_pos) && past(path_target)
    }

    /// Leave preemption after the vehicle has passed
    pub fn release(&mut self, sink: &mut dyn SignalSink) -> bool {
        self.release_with_status("Passed", sink)
    }

    /// Leave preemption and report `message`. Returns false if the junction
    /// was not preempted.
    pub fn release_with_status(&mut self, message: &str, sink: &mut dyn SignalSink) -> bool {
        if self.mode != JunctionMode::Preempted {
            return false;
        }

        for light in self.lights.values_mut() {
            light.release_override();
        }

        // Resume on the all-red that hands over to the cross street
        let safety_index = match self.preempt_direction.map(|d| Axis::of_direction(&d)) {
            Some(Axis::NorthSouth) => LightCycle::ALL_RED_AFTER_NS,
            _ => LightCycle::ALL_RED_AFTER_EW,
        };
        let phase = self.cycle.reset_to(safety_index);

        self.mode = JunctionMode::Normal;
        self.chain.clear();
        self.has_vehicle_passed = true;
        self.preempt_direction = None;
        self.preempted_for = 0.0;
        self.zone_triggered = false;
        self.reflectors_triggered = false;

        self.apply_phase(phase, sink);
        self.set_status(message, sink);
        true
    }

    /// Returns true once per preemption when it has outlived `limit` seconds
    pub fn check_watchdog(&mut self, limit: f32) -> bool {
        if self.is_preempted() && !self.watchdog_reported && self.preempted_for > limit {
            self.watchdog_reported = true;
            return true;
        }
        false
    }

    /// Clear per-dispatch flags ahead of a new emergency run
    pub fn reset_for_dispatch(&mut self, sink: &mut dyn SignalSink) {
        self.has_vehicle_passed = false;
        self.zone_triggered = false;
        self.reflectors_triggered = false;
        self.watchdog_reported = false;
        if !self.is_preempted() {
            self.chain.clear();
            if self.status != "Normal" {
                self.set_status("Normal", sink);
            }
        }
    }
}
