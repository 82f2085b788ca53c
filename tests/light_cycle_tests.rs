//! Normal signal cycle validation

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use traffic_preempt::simulation::{
    Approach, LightColor, LightCycle, PhaseDurations, PhaseName,
};

#[test]
fn test_cycle_starts_on_first_phase() {
    let durations = PhaseDurations::default();
    let cycle = LightCycle::new(&durations);
    assert_eq!(cycle.phase_index(), 0);
    assert_eq!(cycle.current_phase().name, PhaseName::EwGreen);
    assert_eq!(cycle.remaining(), durations.ew_green);
}

#[test]
fn test_phase_sequence_order() {
    let durations = PhaseDurations::default();
    let cycle = LightCycle::new(&durations);
    let names: Vec<PhaseName> = cycle.phases().iter().map(|p| p.name).collect();
    assert_eq!(
        names,
        vec![
            PhaseName::EwGreen,
            PhaseName::EwYellow,
            PhaseName::AllRed,
            PhaseName::NsGreen,
            PhaseName::NsYellow,
            PhaseName::AllRed,
        ]
    );
}

#[test]
fn test_tick_reports_phase_change_only_at_boundary() {
    let durations = PhaseDurations::default();
    let mut cycle = LightCycle::new(&durations);

    assert!(cycle.tick(durations.ew_green - 1.0).is_none());
    let entered = cycle.tick(1.0).expect("phase should change");
    assert_eq!(entered.name, PhaseName::EwYellow);
    assert_eq!(cycle.phase_index(), 1);
    assert!((cycle.remaining() - durations.ew_yellow).abs() < 1e-4);
}

#[test]
fn test_returns_to_start_after_full_cycles_with_random_ticks() {
    let durations = PhaseDurations::default();
    let mut rng = StdRng::seed_from_u64(42);

    for cycles in 1..=4 {
        let mut cycle = LightCycle::new(&durations);
        // Ticks in 1/64 s steps so the sum is exact
        let total_steps = (cycle.cycle_length() * 64.0) as u32 * cycles;
        let mut done = 0u32;
        while done < total_steps {
            let step = rng.random_range(1..=32u32).min(total_steps - done);
            cycle.tick(step as f32 / 64.0);
            done += step;
        }

        assert_eq!(cycle.phase_index(), 0, "after {} cycles", cycles);
        assert!(
            (cycle.remaining() - durations.ew_green).abs() < 1e-3,
            "remaining {} after {} cycles",
            cycle.remaining(),
            cycles
        );
    }
}

#[test]
fn test_large_step_carries_through_several_phases() {
    let durations = PhaseDurations::default();
    let mut cycle = LightCycle::new(&durations);

    // Past EW_GREEN, EW_YELLOW and ALL_RED, one second into NS_GREEN
    let step = durations.ew_green + durations.ew_yellow + durations.all_red + 1.0;
    let entered = cycle.tick(step).expect("phases should change");
    assert_eq!(entered.name, PhaseName::NsGreen);
    assert_eq!(cycle.phase_index(), 3);
    assert!((cycle.remaining() - (durations.ns_green - 1.0)).abs() < 1e-4);
}

#[test]
fn test_reset_to_safety_phase_uses_full_duration() {
    let durations = PhaseDurations::default();
    let mut cycle = LightCycle::new(&durations);
    cycle.tick(4.0);

    let phase = cycle.reset_to(LightCycle::ALL_RED_AFTER_EW);
    assert_eq!(phase.name, PhaseName::AllRed);
    assert_eq!(cycle.phase_index(), 2);
    assert_eq!(cycle.remaining(), durations.all_red);
}

#[test]
fn test_phase_color_mapping() {
    let ew = PhaseName::EwGreen.light_colors();
    assert_eq!(ew[&Approach::Eastbound], LightColor::Green);
    assert_eq!(ew[&Approach::Westbound], LightColor::Green);
    assert_eq!(ew[&Approach::Northbound], LightColor::Red);
    assert_eq!(ew[&Approach::Southbound], LightColor::Red);

    let ns_yellow = PhaseName::NsYellow.light_colors();
    assert_eq!(ns_yellow[&Approach::Northbound], LightColor::Yellow);
    assert_eq!(ns_yellow[&Approach::Southbound], LightColor::Yellow);
    assert_eq!(ns_yellow[&Approach::Eastbound], LightColor::Red);

    let all_red = PhaseName::AllRed.light_colors();
    assert_eq!(all_red.len(), 4);
    assert!(all_red.values().all(|c| *c == LightColor::Red));
}
