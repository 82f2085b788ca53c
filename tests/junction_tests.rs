//! Junction state machine validation

use traffic_preempt::simulation::{
    Approach, ApproachLight, JunctionController, JunctionId, JunctionMode, LightColor,
    LightCycle, NullSink, Phase, PhaseDurations, PhaseName, Position, PreemptTrigger, RecordingSink,
    ReflectorChain, ReflectorSensor, SensorConfig, SensorId, SimEvent, SimId, StatusTarget,
};

fn junction() -> JunctionController {
    JunctionController::new(
        JunctionId(SimId(0)),
        Position::new(0.0, 0.0, 0.0),
        &PhaseDurations::default(),
        ReflectorChain::default(),
    )
}

fn eastward() -> Position {
    Position::new(1.0, 0.0, 0.0)
}

#[test]
fn test_light_rejects_normal_changes_while_overridden() {
    let mut light = ApproachLight::new(Approach::Eastbound, LightColor::Red);
    assert!(light.set_color(LightColor::Green));
    assert_eq!(light.color(), LightColor::Green);

    light.override_color(LightColor::Red);
    assert!(light.is_overridden());
    assert!(!light.set_color(LightColor::Green));
    assert_eq!(light.color(), LightColor::Red);

    light.release_override();
    assert!(light.set_color(LightColor::Yellow));
    assert_eq!(light.color(), LightColor::Yellow);
}

#[test]
fn test_initial_colors_follow_first_phase() {
    let junction = junction();
    assert_eq!(junction.mode(), JunctionMode::Normal);
    assert_eq!(junction.light_color(Approach::Eastbound), Some(LightColor::Green));
    assert_eq!(junction.light_color(Approach::Northbound), Some(LightColor::Red));
    assert!(junction.overrides_consistent());
}

#[test]
fn test_preempt_sets_travel_axis_green() {
    let mut junction = junction();
    let mut sink = RecordingSink::new();

    // Start from the north-south green so the change is visible
    junction.apply_phase(
        Phase { name: PhaseName::NsGreen, duration: 10.0 },
        &mut sink,
    );
    assert!(junction.preempt(&eastward(), &mut sink));

    assert!(junction.is_preempted());
    assert_eq!(junction.light_color(Approach::Eastbound), Some(LightColor::Green));
    assert_eq!(junction.light_color(Approach::Westbound), Some(LightColor::Green));
    assert_eq!(junction.light_color(Approach::Northbound), Some(LightColor::Red));
    assert_eq!(junction.light_color(Approach::Southbound), Some(LightColor::Red));
    assert!(junction.overrides_consistent());
}

#[test]
fn test_preempt_north_south_vehicle() {
    let mut junction = junction();
    junction.preempt(&Position::new(0.1, 0.0, -0.9), &mut NullSink);
    assert_eq!(junction.light_color(Approach::Northbound), Some(LightColor::Green));
    assert_eq!(junction.light_color(Approach::Southbound), Some(LightColor::Green));
    assert_eq!(junction.light_color(Approach::Eastbound), Some(LightColor::Red));
}

#[test]
fn test_preempt_is_idempotent() {
    let mut junction = junction();
    let mut sink = RecordingSink::new();

    assert!(junction.preempt(&eastward(), &mut sink));
    let colors = junction.colors();
    let events_after_first = sink.events.len();

    assert!(!junction.preempt(&eastward(), &mut sink));
    assert!(!junction.preempt(&Position::new(0.0, 0.0, 1.0), &mut sink));
    assert_eq!(junction.colors(), colors);
    assert_eq!(sink.events.len(), events_after_first);
    assert!(junction.is_preempted());
}

#[test]
fn test_cycle_is_paused_while_preempted() {
    let mut junction = junction();
    junction.preempt(&eastward(), &mut NullSink);
    let index = junction.cycle().phase_index();
    let remaining = junction.cycle().remaining();

    for _ in 0..500 {
        junction.tick(0.1, &mut NullSink);
    }
    assert_eq!(junction.cycle().phase_index(), index);
    assert_eq!(junction.cycle().remaining(), remaining);
    assert!(junction.preempted_for() > 49.0);
}

#[test]
fn test_release_resumes_on_all_red_safety_phase() {
    let mut junction = junction();
    let mut sink = RecordingSink::new();
    junction.preempt(&eastward(), &mut sink);

    assert!(junction.release(&mut sink));
    assert_eq!(junction.mode(), JunctionMode::Normal);
    assert!(junction.has_vehicle_passed());
    assert!(junction.overrides_consistent());
    assert_eq!(junction.cycle().phase_index(), LightCycle::ALL_RED_AFTER_EW);
    assert_eq!(
        junction.cycle().remaining(),
        PhaseDurations::default().all_red
    );
    assert!(junction
        .colors()
        .values()
        .all(|c| *c == LightColor::Red));
    assert_eq!(
        sink.statuses_for(StatusTarget::Junction(junction.id)),
        vec!["Passed"]
    );

    // A second release is a no-op
    assert!(!junction.release(&mut sink));
}

#[test]
fn test_release_after_north_south_preemption_hands_over_to_east_west() {
    let mut junction = junction();
    junction.preempt(&Position::new(0.0, 0.0, 1.0), &mut NullSink);
    junction.release(&mut NullSink);
    assert_eq!(junction.cycle().phase_index(), LightCycle::ALL_RED_AFTER_NS);

    junction.tick(PhaseDurations::default().all_red, &mut NullSink);
    assert_eq!(junction.cycle().current_phase().name, PhaseName::EwGreen);
    assert_eq!(junction.light_color(Approach::Eastbound), Some(LightColor::Green));
}

#[test]
fn test_release_clears_reflector_chain() {
    let config = SensorConfig::default();
    let sensors = vec![ReflectorSensor::new(
        SensorId(SimId(1)),
        Position::new(-20.0, 0.0, 0.0),
        &config,
    )];
    let mut junction = JunctionController::new(
        JunctionId(SimId(0)),
        Position::new(0.0, 0.0, 0.0),
        &PhaseDurations::default(),
        ReflectorChain::new(sensors),
    );

    assert!(junction.chain.scan(&Position::new(-25.0, 0.0, 0.0)).is_some());
    junction.preempt(&eastward(), &mut NullSink);
    assert_eq!(junction.chain.len(), 1);

    junction.release(&mut NullSink);
    assert!(junction.chain.is_empty());
}

#[test]
fn test_junction_missing_lights_never_cycles_or_preempts() {
    let mut junction = JunctionController::with_lights(
        JunctionId(SimId(3)),
        Position::new(0.0, 0.0, 0.0),
        &[Approach::Eastbound, Approach::Westbound],
        &PhaseDurations::default(),
        ReflectorChain::default(),
    );
    let mut sink = RecordingSink::new();

    assert!(!junction.has_all_lights());
    assert!(!junction.preempt(&eastward(), &mut sink));
    assert!(!junction.is_preempted());

    for _ in 0..400 {
        junction.tick(0.1, &mut sink);
    }
    assert!(sink
        .events
        .iter()
        .all(|e| !matches!(e, SimEvent::LightColors { .. })));
    assert_eq!(junction.light_color(Approach::Northbound), None);
    assert_eq!(junction.light_color(Approach::Eastbound), Some(LightColor::Green));
}

#[test]
fn test_trigger_status_reports_combined_reasons() {
    let mut junction = junction();
    assert!(junction.record_trigger(PreemptTrigger::Zone));
    assert_eq!(junction.trigger_status(), "Preempting (Zone Active)");
    assert!(!junction.record_trigger(PreemptTrigger::Zone));
    assert!(junction.record_trigger(PreemptTrigger::Reflectors));
    assert_eq!(
        junction.trigger_status(),
        "Preempting (Zone & Reflectors Active)"
    );
}

#[test]
fn test_watchdog_fires_once_without_releasing() {
    let mut junction = junction();
    junction.preempt(&eastward(), &mut NullSink);

    junction.tick(5.0, &mut NullSink);
    assert!(!junction.check_watchdog(10.0));
    junction.tick(6.0, &mut NullSink);
    assert!(junction.check_watchdog(10.0));
    assert!(!junction.check_watchdog(10.0));
    assert!(junction.is_preempted());
}
