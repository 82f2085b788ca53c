//! The emergency vehicle
//!
//! Drives a fixed route at constant speed, then fades out. Everything else
//! sees it only through an [`EmergencyVehicleSnapshot`].

use log::warn;

use super::config::EmergencyConfig;
use super::types::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyLifecycle {
    /// Not dispatched yet, or waiting for the next dispatch
    Inactive,
    /// Driving its route
    Approaching,
    /// Reached the end of its route and fading out
    Deactivating,
    /// Gone
    Faded,
}

/// What the emergency vehicle did during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyTransition {
    /// Reached the end of its route
    Departed,
    /// Fade finished
    Faded,
}

/// Read-only view handed to junctions and vehicles each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmergencyVehicleSnapshot {
    pub position: Position,
    /// Unit travel direction
    pub direction: Position,
    /// Waypoint currently being driven toward
    pub target: Position,
    /// Present on the road, including while fading out
    pub active: bool,
}

impl EmergencyVehicleSnapshot {
    /// A snapshot for a vehicle that is not on the road
    pub fn absent() -> Self {
        Self {
            position: Position::default(),
            direction: Position::default(),
            target: Position::default(),
            active: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmergencyVehicle {
    path: Vec<Position>,
    position: Position,
    waypoint_index: usize,
    direction: Position,
    lifecycle: EmergencyLifecycle,
    speed: f32,
    fade_duration: f32,
    fade_remaining: f32,
}

impl EmergencyVehicle {
    pub fn new(path: Vec<Position>, config: &EmergencyConfig) -> Self {
        let position = path.first().copied().unwrap_or_default();
        Self {
            path,
            position,
            waypoint_index: 0,
            direction: Position::default(),
            lifecycle: EmergencyLifecycle::Inactive,
            speed: config.speed,
            fade_duration: config.fade_duration,
            fade_remaining: 0.0,
        }
    }

    pub fn lifecycle(&self) -> EmergencyLifecycle {
        self.lifecycle
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn waypoint_index(&self) -> usize {
        self.waypoint_index
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn current_target(&self) -> Position {
        let last = self.path.len().saturating_sub(1);
        self.path
            .get(self.waypoint_index.min(last))
            .copied()
            .unwrap_or(self.position)
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.lifecycle,
            EmergencyLifecycle::Approaching | EmergencyLifecycle::Deactivating
        )
    }

    pub fn snapshot(&self) -> EmergencyVehicleSnapshot {
        if !self.is_active() {
            return EmergencyVehicleSnapshot::absent();
        }
        EmergencyVehicleSnapshot {
            position: self.position,
            direction: self.direction,
            target: self.current_target(),
            active: true,
        }
    }

    /// Put the vehicle at the start of its route. Returns false if the route
    /// is too short to drive.
    pub fn activate(&mut self) -> bool {
        if self.path.len() < 2 {
            warn!(
                "Emergency route has {} waypoints; cannot dispatch",
                self.path.len()
            );
            return false;
        }
        self.position = self.path[0];
        self.waypoint_index = 1;
        self.direction = self.path[1].sub(&self.path[0]).normalized();
        self.fade_remaining = 0.0;
        self.lifecycle = EmergencyLifecycle::Approaching;
        true
    }

    pub fn update(&mut self, delta_secs: f32) -> Option<EmergencyTransition> {
        match self.lifecycle {
            EmergencyLifecycle::Approaching => self.drive(self.speed * delta_secs),
            EmergencyLifecycle::Deactivating => {
                self.fade_remaining -= delta_secs;
                if self.fade_remaining <= 0.0 {
                    self.fade_remaining = 0.0;
                    self.lifecycle = EmergencyLifecycle::Faded;
                    Some(EmergencyTransition::Faded)
                } else {
                    None
                }
            }
            EmergencyLifecycle::Inactive | EmergencyLifecycle::Faded => None,
        }
    }

    /// Travel `distance` along the route, passing through waypoints
    fn drive(&mut self, mut distance: f32) -> Option<EmergencyTransition> {
        while let Some(target) = self.path.get(self.waypoint_index).copied() {
            let remaining = self.position.distance(&target);
            if distance < remaining {
                self.direction = target.sub(&self.position).normalized();
                self.position = self.position.lerp(&target, distance / remaining);
                return None;
            }

            self.position = target;
            distance -= remaining;
            self.waypoint_index += 1;
            match self.path.get(self.waypoint_index) {
                Some(next) => self.direction = next.sub(&self.position).normalized(),
                None => {
                    self.waypoint_index = self.path.len() - 1;
                    self.lifecycle = EmergencyLifecycle::Deactivating;
                    self.fade_remaining = self.fade_duration;
                    return Some(EmergencyTransition::Departed);
                }
            }
        }
        None
    }
}
