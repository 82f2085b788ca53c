//! Core types for the preemption simulation
//!
//! Plain value types shared by every component. None of them depend on a
//! renderer.

use std::collections::BTreeMap;
use std::fmt;

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimId(pub usize);

/// A wrapper type for junction IDs (the junction's index in layout order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JunctionId(pub SimId);

/// A wrapper type for reflector sensor IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(pub SimId);

/// A wrapper type for ordinary vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub SimId);

impl JunctionId {
    pub fn index(&self) -> usize {
        self.0 .0
    }
}

impl fmt::Display for JunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J{}", self.0 .0)
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0 .0)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0 .0)
    }
}

/// A 3D position in the simulation
///
/// The main road runs along X (east is +X). Cross streets run along Z
/// (north is +Z). Y is height and is ignored by all distance checks that
/// matter to the simulation, but kept so positions round-trip to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn lerp(&self, other: &Position, t: f32) -> Position {
        Position {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    /// Vector from `other` to `self`
    pub fn sub(&self, other: &Position) -> Position {
        Position::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn dot(&self, other: &Position) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalized(&self) -> Position {
        let len = self.length();
        if len > 0.0 {
            Position::new(self.x / len, self.y / len, self.z / len)
        } else {
            Position::default()
        }
    }
}

/// The four traffic streams entering a junction, named by travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Approach {
    /// Traffic travelling +Z
    Northbound,
    /// Traffic travelling -Z
    Southbound,
    /// Traffic travelling +X
    Eastbound,
    /// Traffic travelling -X
    Westbound,
}

impl Approach {
    pub const ALL: [Approach; 4] = [
        Approach::Northbound,
        Approach::Southbound,
        Approach::Eastbound,
        Approach::Westbound,
    ];

    pub fn axis(&self) -> Axis {
        match self {
            Approach::Northbound | Approach::Southbound => Axis::NorthSouth,
            Approach::Eastbound | Approach::Westbound => Axis::EastWest,
        }
    }

    /// Unit vector of travel for vehicles on this approach
    pub fn travel_direction(&self) -> Position {
        match self {
            Approach::Northbound => Position::new(0.0, 0.0, 1.0),
            Approach::Southbound => Position::new(0.0, 0.0, -1.0),
            Approach::Eastbound => Position::new(1.0, 0.0, 0.0),
            Approach::Westbound => Position::new(-1.0, 0.0, 0.0),
        }
    }

    /// Approach used by traffic on the main road given a signed speed
    pub fn for_main_road_speed(speed: f32) -> Approach {
        if speed >= 0.0 {
            Approach::Eastbound
        } else {
            Approach::Westbound
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Approach::Northbound => "NB",
            Approach::Southbound => "SB",
            Approach::Eastbound => "EB",
            Approach::Westbound => "WB",
        }
    }
}

/// Travel axis through a junction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    EastWest,
    NorthSouth,
}

impl Axis {
    /// Dominant axis of a direction vector. Ties go to east/west.
    pub fn of_direction(direction: &Position) -> Axis {
        if direction.x.abs() >= direction.z.abs() {
            Axis::EastWest
        } else {
            Axis::NorthSouth
        }
    }

    pub fn approaches(&self) -> [Approach; 2] {
        match self {
            Axis::EastWest => [Approach::Eastbound, Approach::Westbound],
            Axis::NorthSouth => [Approach::Northbound, Approach::Southbound],
        }
    }
}

/// Displayed state of one signal head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightColor {
    Red,
    Yellow,
    Green,
    Off,
}

impl LightColor {
    /// Whether an approaching vehicle has to stop for this color
    pub fn requires_stop(&self) -> bool {
        matches!(self, LightColor::Red | LightColor::Yellow)
    }

    pub fn symbol(&self) -> char {
        match self {
            LightColor::Red => 'R',
            LightColor::Yellow => 'Y',
            LightColor::Green => 'G',
            LightColor::Off => '-',
        }
    }
}

/// Color per approach for one junction
pub type LightColors = BTreeMap<Approach, LightColor>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_of_direction_prefers_dominant_component() {
        assert_eq!(
            Axis::of_direction(&Position::new(0.9, 0.0, 0.1)),
            Axis::EastWest
        );
        assert_eq!(
            Axis::of_direction(&Position::new(-0.2, 0.0, -0.8)),
            Axis::NorthSouth
        );
    }

    #[test]
    fn normalized_zero_vector_stays_zero() {
        assert_eq!(Position::default().normalized(), Position::default());
        let unit = Position::new(3.0, 0.0, 4.0).normalized();
        assert!((unit.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn main_road_approach_follows_speed_sign() {
        assert_eq!(Approach::for_main_road_speed(12.0), Approach::Eastbound);
        assert_eq!(Approach::for_main_road_speed(-3.0), Approach::Westbound);
    }
}
