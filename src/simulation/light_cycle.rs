//! Fixed-time phase sequencer for a junction's normal operation

use super::config::PhaseDurations;
use super::types::{Approach, Axis, LightColor, LightColors};

/// Slack for floating-point drift when a phase runs out
const PHASE_EPSILON: f32 = 1e-4;

/// One named interval of the normal cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseName {
    EwGreen,
    EwYellow,
    AllRed,
    NsGreen,
    NsYellow,
}

impl PhaseName {
    /// Colors every approach shows during this phase
    pub fn light_colors(&self) -> LightColors {
        let (ew, ns) = match self {
            PhaseName::EwGreen => (LightColor::Green, LightColor::Red),
            PhaseName::EwYellow => (LightColor::Yellow, LightColor::Red),
            PhaseName::NsGreen => (LightColor::Red, LightColor::Green),
            PhaseName::NsYellow => (LightColor::Red, LightColor::Yellow),
            PhaseName::AllRed => (LightColor::Red, LightColor::Red),
        };
        Approach::ALL
            .iter()
            .map(|approach| match approach.axis() {
                Axis::EastWest => (*approach, ew),
                Axis::NorthSouth => (*approach, ns),
            })
            .collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            PhaseName::EwGreen => "EW_GREEN",
            PhaseName::EwYellow => "EW_YELLOW",
            PhaseName::AllRed => "ALL_RED",
            PhaseName::NsGreen => "NS_GREEN",
            PhaseName::NsYellow => "NS_YELLOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub name: PhaseName,
    pub duration: f32,
}

/// Timed cycle through EW_GREEN, EW_YELLOW, ALL_RED, NS_GREEN, NS_YELLOW,
/// ALL_RED, forever
#[derive(Debug, Clone)]
pub struct LightCycle {
    phases: [Phase; 6],
    phase_index: usize,
    remaining: f32,
}

impl LightCycle {
    /// Index of the ALL_RED that follows the east-west greens
    pub const ALL_RED_AFTER_EW: usize = 2;
    /// Index of the ALL_RED that follows the north-south greens
    pub const ALL_RED_AFTER_NS: usize = 5;

    pub fn new(durations: &PhaseDurations) -> Self {
        let phases = [
            Phase {
                name: PhaseName::EwGreen,
                duration: durations.ew_green,
            },
            Phase {
                name: PhaseName::EwYellow,
                duration: durations.ew_yellow,
            },
            Phase {
                name: PhaseName::AllRed,
                duration: durations.all_red,
            },
            Phase {
                name: PhaseName::NsGreen,
                duration: durations.ns_green,
            },
            Phase {
                name: PhaseName::NsYellow,
                duration: durations.ns_yellow,
            },
            Phase {
                name: PhaseName::AllRed,
                duration: durations.all_red,
            },
        ];
        Self {
            remaining: phases[0].duration,
            phases,
            phase_index: 0,
        }
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn current_phase(&self) -> Phase {
        self.phases[self.phase_index]
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn cycle_length(&self) -> f32 {
        self.phases.iter().map(|p| p.duration).sum()
    }

    /// Advance the cycle by `delta_secs`.
    ///
    /// Returns the phase entered if the tick crossed a phase boundary. Time
    /// left over from the finished phase is carried into the next one, so a
    /// large step may skip through several phases; only the last is reported.
    pub fn tick(&mut self, delta_secs: f32) -> Option<Phase> {
        if self.cycle_length() <= 0.0 {
            return None;
        }
        self.remaining -= delta_secs;
        let mut entered = None;
        while self.remaining <= PHASE_EPSILON {
            self.phase_index = (self.phase_index + 1) % self.phases.len();
            self.remaining += self.phases[self.phase_index].duration;
            entered = Some(self.phases[self.phase_index]);
        }
        entered
    }

    /// Jump to a phase with its full duration
    pub fn reset_to(&mut self, phase_index: usize) -> Phase {
        self.phase_index = phase_index % self.phases.len();
        self.remaining = self.phases[self.phase_index].duration;
        self.phases[self.phase_index]
    }
}
