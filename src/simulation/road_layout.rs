//! Static road geometry
//!
//! A straight east-west main road crossed by north-south streets at evenly
//! spaced junctions. Everything here is computed once from [`LayoutConfig`]
//! and never changes during a run.

use log::warn;
use std::collections::BTreeMap;

use super::config::{EmergencyConfig, LayoutConfig};
use super::error::SimError;
use super::types::{Approach, Position};

/// Computed road layout
#[derive(Debug, Clone)]
pub struct RoadLayout {
    junction_centers: Vec<Position>,
    /// Reflector positions per junction, per approach, in placement order
    reflectors: Vec<BTreeMap<Approach, Vec<Position>>>,
    signalized: Vec<bool>,
    emergency_path: Vec<Position>,
    min_x: f32,
    max_x: f32,
    pub junction_size: f32,
    pub road_width: f32,
    pub lane_width: f32,
    pub lanes_per_direction: usize,
}

impl RoadLayout {
    pub fn new(layout: &LayoutConfig, emergency: &EmergencyConfig) -> Self {
        let count = layout.junction_count;
        let offset = (count as f32 - 1.0) / 2.0;
        let junction_centers: Vec<Position> = (0..count)
            .map(|i| Position::new((i as f32 - offset) * layout.junction_spacing, 0.0, 0.0))
            .collect();

        let reflectors = junction_centers
            .iter()
            .map(|center| {
                Approach::ALL
                    .iter()
                    .map(|approach| (*approach, Self::place_reflectors(layout, center, *approach)))
                    .collect()
            })
            .collect();

        let mut signalized = vec![true; count];
        for &index in &layout.unsignalized_junctions {
            match signalized.get_mut(index) {
                Some(flag) => *flag = false,
                None => warn!(
                    "Ignoring unsignalized junction {}: layout only has {} junctions",
                    index, count
                ),
            }
        }

        let (min_x, max_x) = match (junction_centers.first(), junction_centers.last()) {
            (Some(first), Some(last)) => {
                (first.x - layout.road_margin, last.x + layout.road_margin)
            }
            _ => (-layout.road_margin, layout.road_margin),
        };

        let mut layout_out = Self {
            junction_centers,
            reflectors,
            signalized,
            emergency_path: Vec::new(),
            min_x,
            max_x,
            junction_size: layout.junction_size,
            road_width: layout.road_width,
            lane_width: layout.lane_width,
            lanes_per_direction: layout.lanes_per_direction,
        };
        layout_out.emergency_path = layout_out.build_emergency_path(emergency);
        layout_out
    }

    /// Sensors leading into a junction along one approach, farthest first so
    /// the list reads in the order an approaching vehicle meets them
    fn place_reflectors(
        layout: &LayoutConfig,
        center: &Position,
        approach: Approach,
    ) -> Vec<Position> {
        let dir = approach.travel_direction();
        let n = layout.sensors_per_approach;
        (0..n)
            .map(|i| {
                let d = layout.junction_size / 2.0
                    + layout.sensor_first_offset
                    + (n - 1 - i) as f32 * layout.sensor_spacing;
                Position::new(center.x - dir.x * d, center.y, center.z - dir.z * d)
            })
            .collect()
    }

    fn build_emergency_path(&self, emergency: &EmergencyConfig) -> Vec<Position> {
        let approach = if emergency.westbound {
            Approach::Westbound
        } else {
            Approach::Eastbound
        };
        let z = self.lane_offset(approach, emergency.lane);

        let mut path = Vec::with_capacity(self.junction_centers.len() + 2);
        path.push(Position::new(self.min_x, 0.0, z));
        path.extend(self.junction_centers.iter().map(|c| Position::new(c.x, 0.0, z)));
        path.push(Position::new(self.max_x, 0.0, z));

        if emergency.westbound {
            path.reverse();
        }
        path
    }

    pub fn junction_count(&self) -> usize {
        self.junction_centers.len()
    }

    pub fn junction_centers(&self) -> &[Position] {
        &self.junction_centers
    }

    pub fn junction_center(&self, index: usize) -> Option<Position> {
        self.junction_centers.get(index).copied()
    }

    /// Whether the junction was built with its four signal heads
    pub fn is_signalized(&self, index: usize) -> bool {
        self.signalized.get(index).copied().unwrap_or(false)
    }

    pub fn try_reflector_positions(
        &self,
        junction_index: usize,
        approach: Approach,
    ) -> Result<&[Position], SimError> {
        let per_approach = self
            .reflectors
            .get(junction_index)
            .ok_or(SimError::JunctionOutOfRange(junction_index))?;
        Ok(per_approach.get(&approach).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Sensor positions on one approach of a junction. Out-of-range indices
    /// log a warning and return nothing.
    pub fn reflector_positions(&self, junction_index: usize, approach: Approach) -> Vec<Position> {
        match self.try_reflector_positions(junction_index, approach) {
            Ok(positions) => positions.to_vec(),
            Err(err) => {
                warn!("Reflector lookup failed: {}", err);
                Vec::new()
            }
        }
    }

    /// All of a junction's sensors in placement order (by approach, then
    /// farthest first)
    pub fn junction_reflectors(&self, junction_index: usize) -> Vec<Position> {
        Approach::ALL
            .iter()
            .flat_map(|approach| self.reflector_positions(junction_index, *approach))
            .collect()
    }

    pub fn emergency_path(&self) -> &[Position] {
        &self.emergency_path
    }

    /// Lateral (Z) offset of a main-road lane. Lane 0 is next to the
    /// centerline. Traffic keeps right, so eastbound lanes sit at negative Z.
    pub fn lane_offset(&self, approach: Approach, lane: usize) -> f32 {
        let magnitude = self.lane_width * (lane as f32 + 0.5);
        match approach {
            Approach::Westbound => magnitude,
            _ => -magnitude,
        }
    }

    /// Longitudinal extent of the main road as (min_x, max_x)
    pub fn road_bounds(&self) -> (f32, f32) {
        (self.min_x, self.max_x)
    }

    pub fn half_width(&self) -> f32 {
        self.road_width / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> RoadLayout {
        RoadLayout::new(&LayoutConfig::default(), &EmergencyConfig::default())
    }

    #[test]
    fn junctions_are_centered_on_origin() {
        let layout = layout();
        let xs: Vec<f32> = layout.junction_centers().iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![-200.0, 0.0, 200.0]);
    }

    #[test]
    fn reflectors_lead_into_the_junction() {
        let layout = layout();
        let eastbound = layout.reflector_positions(1, Approach::Eastbound);
        assert_eq!(eastbound.len(), 5);
        // farthest first, approaching from the west
        assert!((eastbound[0].x - -38.0).abs() < 1e-4);
        assert!((eastbound[4].x - -14.0).abs() < 1e-4);
        assert!(eastbound.windows(2).all(|w| (w[1].x - w[0].x - 6.0).abs() < 1e-4));
    }

    #[test]
    fn bad_junction_index_yields_empty_reflectors() {
        assert!(layout().reflector_positions(42, Approach::Northbound).is_empty());
        assert_eq!(
            layout().try_reflector_positions(42, Approach::Northbound),
            Err(SimError::JunctionOutOfRange(42))
        );
    }

    #[test]
    fn emergency_path_visits_every_junction() {
        let layout = layout();
        let path = layout.emergency_path();
        assert_eq!(path.len(), 5);
        assert_eq!(path[0].x, -450.0);
        assert_eq!(path[4].x, 450.0);
        assert!(path.iter().all(|p| (p.z - -1.75).abs() < 1e-6));
    }
}
