//! Emergency-vehicle signal preemption simulation library
//!
//! Junction signal control with emergency preemption, roadside reflector
//! sensor chains, and ordinary vehicles that yield. Runs headless; a display
//! plugs in through [`simulation::SignalSink`].

pub mod simulation;
