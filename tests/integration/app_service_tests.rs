//! AppService scenarios: detector timeline → pattern match → actuator cycle.

use core::ops::RangeInclusive;

use dishopener::app::commands::AppCommand;
use dishopener::app::events::AppEvent;
use dishopener::app::service::AppService;
use dishopener::config::ControllerConfig;
use dishopener::fsm::ActuatorState::{DeadTime, Listening, Opening, Retracting};
use dishopener::fsm::context::DriveCommand;

use crate::mock_hw::{MockHardware, RecordingSink};

fn started(config: ControllerConfig) -> (AppService, MockHardware, RecordingSink) {
    let mut app = AppService::new(config);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::default();
    app.start(0, &mut hw, &mut sink);
    (app, hw, sink)
}

/// Tick once per millisecond over `range`, delivering each command at
/// its timestamp.
fn run(
    app: &mut AppService,
    hw: &mut MockHardware,
    sink: &mut RecordingSink,
    range: RangeInclusive<u64>,
    commands: &[(u64, AppCommand)],
) {
    for t in range {
        hw.now = t;
        let due: Vec<AppCommand> = commands
            .iter()
            .filter(|(at, _)| *at == t)
            .map(|(_, c)| *c)
            .collect();
        app.tick(t, hw, &due, sink);
    }
}

fn index_of(sink: &RecordingSink, pred: impl Fn(&AppEvent) -> bool) -> usize {
    sink.events.iter().position(pred).expect("event not emitted")
}

#[test]
fn four_state_beep_pattern_runs_full_cycle() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    // Beeps recognised at 1500, 7500, 13500, 19500: three strikes.
    for start in [1_000, 7_000, 13_000, 19_000] {
        hw.tone(start, 501);
    }

    run(&mut app, &mut hw, &mut sink, 1..=42_000, &[]);

    assert_eq!(sink.beep_count(), 4);
    assert_eq!(sink.finished_count(), 1);
    assert_eq!(
        sink.timeline(),
        vec![
            (Opening, 19_500),
            (DeadTime, 28_001),
            (Retracting, 29_002),
            (Listening, 41_003),
        ]
    );
    assert_eq!(
        hw.drives,
        vec![
            DriveCommand::Idle,
            DriveCommand::Open,
            DriveCommand::Idle,
            DriveCommand::Retract,
            DriveCommand::Idle,
        ]
    );
    assert_eq!(app.state(), Listening);
}

#[test]
fn at_match_reports_finished_before_the_transition() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    for start in [1_000, 7_000, 13_000, 19_000] {
        hw.tone(start, 501);
    }
    run(&mut app, &mut hw, &mut sink, 1..=20_000, &[]);

    let finished = index_of(&sink, |e| matches!(e, AppEvent::CycleFinished(_)));
    let opened = index_of(&sink, |e| {
        matches!(e, AppEvent::StateChanged { to: Opening, .. })
    });
    assert!(finished < opened);
}

#[test]
fn three_state_needs_a_fourth_strike_and_reports_after_transition() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::three_state());
    // The fifth tone starts on the last tick of the first run.
    for start in [1_000, 7_000, 13_000, 19_000, 25_000] {
        hw.tone(start, 501);
    }
    run(&mut app, &mut hw, &mut sink, 1..=25_000, &[]);
    assert_eq!(app.state(), Listening);
    assert_eq!(app.strikes(), 3);
    assert_eq!(sink.finished_count(), 0);

    run(&mut app, &mut hw, &mut sink, 25_001..=41_000, &[]);

    assert_eq!(sink.finished_count(), 1);
    assert_eq!(
        sink.timeline(),
        vec![(Opening, 25_500), (Retracting, 30_501), (Listening, 40_502)]
    );
    let finished = index_of(&sink, |e| matches!(e, AppEvent::CycleFinished(_)));
    let opened = index_of(&sink, |e| {
        matches!(e, AppEvent::StateChanged { to: Opening, .. })
    });
    assert!(opened < finished);
}

#[test]
fn explicit_open_never_reports_finished() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    run(
        &mut app,
        &mut hw,
        &mut sink,
        1..=22_000,
        &[(10, AppCommand::Open)],
    );
    assert_eq!(sink.finished_count(), 0);
    assert_eq!(
        sink.timeline(),
        vec![
            (Opening, 10),
            (DeadTime, 8_511),
            (Retracting, 9_512),
            (Listening, 21_513),
        ]
    );
}

#[test]
fn repeated_open_does_not_redrive() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    run(
        &mut app,
        &mut hw,
        &mut sink,
        1..=1_000,
        &[(100, AppCommand::Open), (500, AppCommand::Open)],
    );
    assert_eq!(hw.drives, vec![DriveCommand::Idle, DriveCommand::Open]);
    assert_eq!(app.state_entry_ms(), 100);
}

#[test]
fn three_state_remote_retract_cuts_opening_short() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::three_state());
    run(
        &mut app,
        &mut hw,
        &mut sink,
        1..=13_000,
        &[(1, AppCommand::Open), (2_001, AppCommand::Retract)],
    );
    assert_eq!(
        sink.timeline(),
        vec![(Opening, 1), (Retracting, 2_001), (Listening, 12_002)]
    );
}

#[test]
fn four_state_ignores_retract() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    run(
        &mut app,
        &mut hw,
        &mut sink,
        1..=3_000,
        &[(1, AppCommand::Open), (2_000, AppCommand::Retract)],
    );
    assert_eq!(app.state(), Opening);
    assert_eq!(sink.timeline(), vec![(Opening, 1)]);
}

#[test]
fn open_interrupts_retracting() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    run(
        &mut app,
        &mut hw,
        &mut sink,
        1..=12_000,
        &[(1, AppCommand::Open), (11_000, AppCommand::Open)],
    );
    assert_eq!(
        sink.timeline(),
        vec![
            (Opening, 1),
            (DeadTime, 8_502),
            (Retracting, 9_503),
            (Opening, 11_000),
        ]
    );
    assert_eq!(hw.last_drive(), Some(DriveCommand::Open));
}

#[test]
fn tones_while_moving_are_ignored() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    hw.tone(100, 5_000);
    run(
        &mut app,
        &mut hw,
        &mut sink,
        1..=6_000,
        &[(1, AppCommand::Open)],
    );
    assert_eq!(sink.beep_count(), 0);
}

#[test]
fn half_integrated_tone_is_discarded_on_leaving_listening() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    // 400 active samples, then the opener is triggered remotely.
    hw.tone(0, 400);
    run(
        &mut app,
        &mut hw,
        &mut sink,
        1..=22_000,
        &[(399, AppCommand::Open)],
    );
    assert_eq!(app.state(), Listening);

    // Would complete a beep if the earlier count had survived.
    hw.tone(22_000, 200);
    run(&mut app, &mut hw, &mut sink, 22_001..=23_000, &[]);
    assert_eq!(sink.beep_count(), 0);

    hw.tone(24_000, 501);
    run(&mut app, &mut hw, &mut sink, 23_001..=25_000, &[]);
    assert_eq!(sink.beep_count(), 1);
}

#[test]
fn strikes_decay_after_silence() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    for start in [1_000, 7_000, 13_000] {
        hw.tone(start, 501);
    }
    run(&mut app, &mut hw, &mut sink, 1..=23_000, &[]);
    assert_eq!(app.strikes(), 2);

    run(&mut app, &mut hw, &mut sink, 23_001..=40_000, &[]);
    assert_eq!(app.strikes(), 0);

    // A late beep is recognised but starts over without striking.
    hw.tone(40_001, 501);
    run(&mut app, &mut hw, &mut sink, 40_001..=41_000, &[]);
    assert_eq!(sink.beep_count(), 4);
    assert_eq!(app.strikes(), 0);
    assert_eq!(app.state(), Listening);
}

#[test]
fn remote_open_keeps_strikes_until_they_decay() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    // Beeps at 1500 and 7500: one strike.
    for start in [1_000, 7_000] {
        hw.tone(start, 501);
    }
    run(
        &mut app,
        &mut hw,
        &mut sink,
        1..=10_000,
        &[(8_000, AppCommand::Open)],
    );
    assert_eq!(app.state(), Opening);
    assert_eq!(app.strikes(), 1);

    // Back to Listening at 29 503, long after the decay delay.
    run(&mut app, &mut hw, &mut sink, 10_001..=30_000, &[]);
    assert_eq!(app.state(), Listening);
    assert_eq!(app.strikes(), 0);
    assert_eq!(sink.finished_count(), 0);
}

#[test]
fn off_rhythm_beeps_do_not_strike() {
    let (mut app, mut hw, mut sink) = started(ControllerConfig::four_state());
    // 4000 ms and 7500 ms spacing: both outside the window.
    for start in [1_000, 5_000, 12_500] {
        hw.tone(start, 501);
    }
    run(&mut app, &mut hw, &mut sink, 1..=14_000, &[]);
    assert_eq!(sink.beep_count(), 3);
    assert_eq!(app.strikes(), 0);
    let strikes = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::Beeped { strike: true, .. }))
        .count();
    assert_eq!(strikes, 0);
}
