//! End-to-end session tests against a simulated robot

use parking_lot::Mutex;
use setu::bus::{command_queue, CommandSender, MemoryPublisher};
use setu::devices::create2::sensors::{
    spec, PACKET_ANGLE, PACKET_BATTERY_CAPACITY, PACKET_BATTERY_CHARGE, PACKET_CHARGING_SOURCES,
    PACKET_CLIFF_LEFT, PACKET_LEFT_ENCODER, PACKET_LEFT_MOTOR_CURRENT, PACKET_RIGHT_ENCODER,
};
use setu::devices::Create2;
use setu::recorder::MovementLog;
use setu::session::{CycleOutcome, Session, SessionOptions};
use setu::status::RobotState;
use setu::transport::MockTransport;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const STATUS_TOPIC: &str = "roomba/status";

/// Sensor values the simulated robot reports; `None` means it stays silent
type Registers = Arc<Mutex<Option<HashMap<u8, i32>>>>;

/// Query-list reply built from the register values
fn query_reply(registers: &Registers, request: &[u8]) -> Vec<u8> {
    let guard = registers.lock();
    let values = match (request.first(), guard.as_ref()) {
        (Some(149), Some(values)) => values,
        _ => return Vec::new(),
    };

    let count = request[1] as usize;
    let mut reply = Vec::new();
    for &id in &request[2..2 + count] {
        let value = values.get(&id).copied().unwrap_or(0);
        match spec(id).map(|s| s.width) {
            Ok(1) => reply.push(value as u8),
            _ => reply.extend_from_slice(&(value as u16).to_be_bytes()),
        }
    }
    reply
}

fn simulated_robot(registers: &Registers) -> MockTransport {
    let registers = Arc::clone(registers);
    MockTransport::with_responder(move |request| query_reply(&registers, request))
}

fn docked_registers() -> Registers {
    let values: HashMap<u8, i32> = [
        (PACKET_CHARGING_SOURCES, 2),
        (PACKET_BATTERY_CHARGE, 2700),
        (PACKET_BATTERY_CAPACITY, 3000),
    ]
    .into_iter()
    .collect();
    Arc::new(Mutex::new(Some(values)))
}

fn session(
    mock: &MockTransport,
    max_wake_attempts: u32,
) -> (
    Session<MockTransport, MemoryPublisher>,
    CommandSender,
    MemoryPublisher,
) {
    let (tx, rx) = command_queue();
    let publisher = MemoryPublisher::new();
    let device = Create2::new(mock.clone(), Duration::ZERO);
    let options = SessionOptions {
        status_topic: STATUS_TOPIC.to_string(),
        interval: Duration::ZERO,
        max_wake_attempts,
    };
    let mut session = Session::new(device, publisher.clone(), rx, options).unwrap();
    session.connect().unwrap();
    mock.clear_written();
    (session, tx, publisher)
}

#[test]
fn test_status_published() {
    let registers = docked_registers();
    let mock = simulated_robot(&registers);
    let (mut session, _tx, publisher) = session(&mock, 3);

    match session.cycle() {
        CycleOutcome::Reported(report) => assert_eq!(report.state, RobotState::Docked),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(
        publisher.payloads(STATUS_TOPIC),
        vec![r#"{"state":"docked","battery_level":90.0}"#]
    );
    assert_eq!(mock.writes(), vec![vec![149, 6, 34, 56, 54, 55, 25, 26]]);
    assert!(publisher.messages().iter().all(|(topic, _)| topic == STATUS_TOPIC));
}

#[test]
fn test_cleaning_status() {
    let registers = docked_registers();
    if let Some(values) = registers.lock().as_mut() {
        values.insert(PACKET_CHARGING_SOURCES, 0);
        values.insert(PACKET_LEFT_MOTOR_CURRENT, 180);
        values.insert(PACKET_BATTERY_CHARGE, 1500);
    }
    let mock = simulated_robot(&registers);
    let (mut session, _tx, publisher) = session(&mock, 3);

    session.cycle();
    assert_eq!(
        publisher.payloads(STATUS_TOPIC),
        vec![r#"{"state":"cleaning","battery_level":50.0}"#]
    );
}

#[test]
fn test_commands_dispatched_before_poll() {
    let registers = docked_registers();
    let mock = simulated_robot(&registers);
    let (mut session, tx, publisher) = session(&mock, 3);

    tx.push("pause");
    tx.push("return_to_base");
    session.cycle();

    let writes = mock.writes();
    assert_eq!(writes[0], vec![131]);
    assert_eq!(writes[1], vec![128]);
    assert_eq!(writes[2], vec![143]);
    assert_eq!(writes[3][0], 149);
    assert_eq!(publisher.payloads(STATUS_TOPIC).len(), 1);
}

#[test]
fn test_unknown_command_dropped() {
    let registers = docked_registers();
    let mock = simulated_robot(&registers);
    let (mut session, tx, publisher) = session(&mock, 3);

    tx.push("dance");
    tx.push("clean_spot");
    session.cycle();

    let writes = mock.writes();
    assert_eq!(writes[0], vec![134]);
    assert_eq!(writes[1][0], 149);
    assert_eq!(publisher.payloads(STATUS_TOPIC).len(), 1);

    // Queue was drained
    mock.clear_written();
    session.cycle();
    assert_eq!(mock.writes()[0][0], 149);
}

#[test]
fn test_silent_robot_woken() {
    let registers: Registers = Arc::new(Mutex::new(None));
    let mock = simulated_robot(&registers);
    let (mut session, _tx, publisher) = session(&mock, 3);
    let opens = mock.open_count();

    assert_eq!(session.cycle(), CycleOutcome::NoResponse { failures: 1 });
    assert_eq!(mock.open_count(), opens + 1);
    let writes = mock.writes();
    assert_eq!(writes.last(), Some(&vec![128]));
    assert!(publisher.payloads(STATUS_TOPIC).is_empty());
}

#[test]
fn test_all_zero_frame_is_no_response() {
    let registers: Registers = Arc::new(Mutex::new(Some(HashMap::new())));
    let mock = simulated_robot(&registers);
    let (mut session, _tx, publisher) = session(&mock, 3);

    assert_eq!(session.cycle(), CycleOutcome::NoResponse { failures: 1 });
    assert!(publisher.payloads(STATUS_TOPIC).is_empty());
}

#[test]
fn test_sustained_outage_reported_once() {
    let registers: Registers = Arc::new(Mutex::new(None));
    let mock = simulated_robot(&registers);
    let (mut session, _tx, publisher) = session(&mock, 3);

    for _ in 0..5 {
        session.cycle();
    }
    assert_eq!(session.consecutive_failures(), 5);
    assert_eq!(
        publisher.payloads(STATUS_TOPIC),
        vec![r#"{"state":"error","battery_level":0.0}"#]
    );

    // Robot comes back
    *registers.lock() = docked_registers().lock().clone();
    assert!(matches!(session.cycle(), CycleOutcome::Reported(_)));
    assert_eq!(session.consecutive_failures(), 0);

    // A new outage is reported again
    *registers.lock() = None;
    for _ in 0..3 {
        session.cycle();
    }
    let payloads = publisher.payloads(STATUS_TOPIC);
    assert_eq!(payloads.len(), 3);
    assert_eq!(payloads[2], r#"{"state":"error","battery_level":0.0}"#);
}

#[test]
fn test_reopen_failure_counts_as_attempt() {
    let registers: Registers = Arc::new(Mutex::new(None));
    let mock = simulated_robot(&registers);
    let (mut session, _tx, publisher) = session(&mock, 2);

    mock.fail_next_opens(10);
    session.cycle();
    session.cycle();
    session.cycle();
    assert_eq!(session.consecutive_failures(), 3);
    assert_eq!(publisher.payloads(STATUS_TOPIC).len(), 1);
}

#[test]
fn test_movement_recorded() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("movement.json");

    let registers = docked_registers();
    if let Some(values) = registers.lock().as_mut() {
        values.insert(PACKET_LEFT_ENCODER, 65_530);
        values.insert(PACKET_RIGHT_ENCODER, 100);
    }
    let mock = simulated_robot(&registers);
    let (session, _tx, _publisher) = session(&mock, 3);
    let mut session = session.with_movement_log(MovementLog::load(&path).unwrap());

    // Baseline only
    session.cycle();
    assert!(!path.exists());

    if let Some(values) = registers.lock().as_mut() {
        values.insert(PACKET_LEFT_ENCODER, 4);
        values.insert(PACKET_RIGHT_ENCODER, 110);
        values.insert(PACKET_ANGLE, -15);
        values.insert(PACKET_CLIFF_LEFT, 1);
    }
    session.cycle();

    let samples = MovementLog::load(&path).unwrap();
    assert_eq!(samples.len(), 1);
    let sample = &samples.samples()[0];
    // Left wrapped: 4 - (65530 - 65536) = 10, right: 10
    assert_eq!(sample.encoder_delta, 20);
    assert_eq!(sample.degrees_turned, -15);
    assert!(sample.cliff);
    assert!(!sample.light_bumper);
    assert!(!sample.bumper_wheel_drop);
    assert_eq!(session.odometry().total(), 20);
}

#[test]
fn test_zero_encoders_from_silent_device_not_recorded() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("movement.json");

    let registers = docked_registers();
    if let Some(values) = registers.lock().as_mut() {
        values.insert(PACKET_LEFT_ENCODER, 100);
        values.insert(PACKET_RIGHT_ENCODER, 100);
    }
    let mock = simulated_robot(&registers);
    let (session, _tx, publisher) = session(&mock, 3);
    let mut session = session.with_movement_log(MovementLog::load(&path).unwrap());

    assert!(matches!(session.cycle(), CycleOutcome::Reported(_)));

    // Status still answers but the movement frame comes back all zero
    if let Some(values) = registers.lock().as_mut() {
        values.remove(&PACKET_LEFT_ENCODER);
        values.remove(&PACKET_RIGHT_ENCODER);
    }
    let opens = mock.open_count();
    assert_eq!(session.cycle(), CycleOutcome::NoResponse { failures: 1 });
    assert_eq!(mock.open_count(), opens + 1);
    assert_eq!(session.consecutive_failures(), 1);
    assert_eq!(session.odometry().total(), 0);
    assert_eq!(session.movement_log().map(|log| log.len()), Some(0));
    assert!(!path.exists());
    assert_eq!(publisher.payloads(STATUS_TOPIC).len(), 2);

    // The baseline survived the silent cycle
    if let Some(values) = registers.lock().as_mut() {
        values.insert(PACKET_LEFT_ENCODER, 105);
        values.insert(PACKET_RIGHT_ENCODER, 107);
    }
    assert!(matches!(session.cycle(), CycleOutcome::Reported(_)));
    assert_eq!(session.consecutive_failures(), 0);
    let samples = MovementLog::load(&path).unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples.samples()[0].encoder_delta, 12);
    assert_eq!(session.odometry().total(), 12);
}

#[test]
fn test_short_movement_frame_wakes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("movement.json");

    let registers = docked_registers();
    if let Some(values) = registers.lock().as_mut() {
        values.insert(PACKET_LEFT_ENCODER, 100);
        values.insert(PACKET_RIGHT_ENCODER, 100);
    }
    let truncate = Arc::new(Mutex::new(false));
    let mock = {
        let registers = Arc::clone(&registers);
        let truncate = Arc::clone(&truncate);
        MockTransport::with_responder(move |request| {
            let mut reply = query_reply(&registers, request);
            // The movement request lists nine packet ids
            if *truncate.lock() && request.get(1) == Some(&9) {
                reply.truncate(1);
            }
            reply
        })
    };
    let (session, _tx, publisher) = session(&mock, 2);
    let mut session = session.with_movement_log(MovementLog::load(&path).unwrap());

    assert!(matches!(session.cycle(), CycleOutcome::Reported(_)));

    *truncate.lock() = true;
    let opens = mock.open_count();
    assert_eq!(session.cycle(), CycleOutcome::NoResponse { failures: 1 });
    assert_eq!(mock.open_count(), opens + 1);
    assert_eq!(mock.writes().last(), Some(&vec![128]));
    assert_eq!(session.odometry().total(), 0);

    // Counts towards the outage like any other failed poll
    assert_eq!(session.cycle(), CycleOutcome::NoResponse { failures: 2 });
    let payloads = publisher.payloads(STATUS_TOPIC);
    assert_eq!(
        payloads.last().map(String::as_str),
        Some(r#"{"state":"error","battery_level":0.0}"#)
    );
    assert!(!path.exists());
}
