//! Reconnection lifecycle through the full runtime.
//!
//! Drives the runtime directly with `step` so every intermediate state can be
//! inspected, then exercises `Runtime::run` end to end.

use std::time::Duration;

use draftdesk_app::{Command, DriverEvent, TransportEvent};
use draftdesk_core::{ConnectionState, Environment};
use draftdesk_harness::{
    SimDriver, SimEnv, SimHost,
    scenario::{review_requested, session_config, world},
};
use draftdesk_proto::CloseCode;

fn started(driver: SimDriver) -> draftdesk_harness::World {
    world(driver, SimHost::granted(), session_config().unwrap()).unwrap()
}

fn fail_attempt(world: &mut draftdesk_harness::World) {
    world.step(DriverEvent::Transport(TransportEvent::Closed { code: CloseCode::ABNORMAL }));
}

#[test]
fn backoff_sequence_then_fatal() {
    let env = SimEnv::new();
    let mut world = started(SimDriver::new(env.clone()));

    let mut delays = Vec::new();
    for attempt in 0..10 {
        fail_attempt(&mut world);
        assert_eq!(world.session().connection_state(), ConnectionState::Reconnecting { attempt });

        let deadline = world.session().next_deadline().unwrap();
        delays.push(deadline - env.now());

        env.advance_to(deadline);
        world.step(DriverEvent::Tick);
        assert_eq!(world.session().connection_state(), ConnectionState::Connecting);
    }

    let secs: Vec<u64> = delays.iter().map(Duration::as_secs).collect();
    assert_eq!(secs, vec![1, 2, 4, 8, 16, 30, 30, 30, 30, 30]);

    fail_attempt(&mut world);
    assert_eq!(world.session().connection_state(), ConnectionState::Failed { attempts: 10 });
    assert!(world.session().view().banner.is_some());
    assert_eq!(world.session().next_deadline(), None);
    assert_eq!(world.driver().connects().len(), 11);

    // Nothing happens on its own any more.
    env.advance(Duration::from_secs(3600));
    world.step(DriverEvent::Tick);
    assert_eq!(world.driver().connects().len(), 11);

    world.step(DriverEvent::Command(Command::Reconnect));
    assert_eq!(world.session().connection_state(), ConnectionState::Connecting);
    world.step(DriverEvent::Transport(TransportEvent::Opened));
    assert!(world.session().is_connected());
    assert!(world.session().view().banner.is_none());
}

#[test]
fn successful_open_resets_budget() {
    let env = SimEnv::new();
    let mut world = started(SimDriver::new(env.clone()));

    for _ in 0..3 {
        fail_attempt(&mut world);
        env.advance(Duration::from_secs(30));
        world.step(DriverEvent::Tick);
    }
    world.step(DriverEvent::Transport(TransportEvent::Opened));

    fail_attempt(&mut world);
    assert_eq!(world.session().connection_state(), ConnectionState::Reconnecting { attempt: 0 });
    let delay = world.session().next_deadline().unwrap() - env.now();
    assert_eq!(delay, Duration::from_secs(1));
}

#[test]
fn connect_while_connecting_is_idempotent() {
    let env = SimEnv::new();
    let mut world = started(SimDriver::new(env.clone()));

    let now = env.now();
    assert!(world.session_mut().connect(now).is_empty());
    world.step(DriverEvent::Transport(TransportEvent::Opened));
    assert!(world.session_mut().connect(now).is_empty());
    assert_eq!(world.driver().connects().len(), 1);
}

#[test]
fn manual_reconnect_cancels_pending_retry() {
    let env = SimEnv::new();
    let mut world = started(SimDriver::new(env.clone()));

    fail_attempt(&mut world);
    fail_attempt(&mut world);
    world.step(DriverEvent::Command(Command::Reconnect));
    assert_eq!(world.session().connection_state(), ConnectionState::Connecting);
    assert_eq!(world.driver().connects().len(), 2);

    // The old retry timer must not fire into the new attempt.
    env.advance(Duration::from_secs(5));
    world.step(DriverEvent::Tick);
    assert_eq!(world.driver().connects().len(), 2);
}

#[test]
fn connect_failure_takes_abnormal_path() {
    let env = SimEnv::new();
    let mut driver = SimDriver::new(env.clone());
    driver.set_fail_connects(true);
    let mut world = started(driver);

    assert_eq!(world.session().connection_state(), ConnectionState::Reconnecting { attempt: 0 });

    world.driver_mut().set_fail_connects(false);
    env.advance(Duration::from_secs(1));
    world.step(DriverEvent::Tick);
    assert_eq!(world.session().connection_state(), ConnectionState::Connecting);
    assert_eq!(world.driver().connects().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn run_processes_script_and_shuts_down() {
    let env = SimEnv::new();
    let mut driver = SimDriver::new(env.clone()).auto_open();
    driver.push_message(review_requested("X", "y@z.com", &["A", "B"]));
    driver.push_event(DriverEvent::Command(Command::AcceptCandidate { index: 1 }));
    driver.push_wait(Duration::from_secs(31));

    let mut runtime = unstarted(driver);
    runtime.run().await.unwrap();

    let driver = runtime.driver();
    assert_eq!(driver.sent_kinds(), vec!["decision", "heartbeat"]);
    assert!(driver.sent()[0].contains("\"body\":\"B\""));
    assert!(driver.renders() >= 4);
    assert!(driver.notices().iter().any(|n| n.message == "Draft response sent"));

    let (code, _) = driver.disconnects().last().unwrap();
    assert!(code.is_normal());
    assert_eq!(runtime.session().connection_state(), ConnectionState::Idle);
    assert_eq!(runtime.session().next_deadline(), None);
}

fn unstarted(driver: SimDriver) -> draftdesk_harness::World {
    let session = draftdesk_app::Session::new(session_config().unwrap(), SimHost::granted()).unwrap();
    draftdesk_app::Runtime::new(driver, session)
}
