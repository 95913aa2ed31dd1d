//! Model-based property tests.
//!
//! Random operation sequences run against both the real runtime and a small
//! reference model of the queue, cursor and connection. After every step the
//! two must agree.
//!
//! ```text
//! proptest generates: Vec<Op>
//!                         │
//!          ┌──────────────┼──────────────┐
//!          ▼              ▼              ▼
//!       Model        RealWorld        Compare
//!    (reference)   (sim runtime)     after each op
//! ```

use draftdesk_app::{Command, DriverEvent, TransportEvent};
use draftdesk_harness::{
    SimDriver, SimEnv, SimHost, World,
    scenario::{review_requested, session_config, world},
};
use draftdesk_proto::CloseCode;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Deliver { valid: bool },
    Accept { send_fails: bool },
    Skip { send_fails: bool },
    SetCursor(usize),
    Next,
    Previous,
    Drop,
    Reconnect,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<bool>().prop_map(|valid| Op::Deliver { valid }),
        2 => any::<bool>().prop_map(|send_fails| Op::Accept { send_fails }),
        2 => any::<bool>().prop_map(|send_fails| Op::Skip { send_fails }),
        1 => (0usize..10).prop_map(Op::SetCursor),
        1 => Just(Op::Next),
        1 => Just(Op::Previous),
        1 => Just(Op::Drop),
        1 => Just(Op::Reconnect),
    ]
}

/// Reference model: a plain vector of subjects plus a cursor.
#[derive(Debug, Default)]
struct Model {
    subjects: Vec<String>,
    cursor: Option<usize>,
    open: bool,
    next: usize,
}

impl Model {
    fn apply(&mut self, op: &Op) {
        match op {
            Op::Deliver { valid } => {
                if !self.open {
                    return;
                }
                let subject = format!("s{}", self.next);
                self.next += 1;
                if *valid {
                    self.subjects.push(subject);
                    self.cursor.get_or_insert(0);
                }
            },
            Op::Accept { send_fails } | Op::Skip { send_fails } => {
                let Some(cursor) = self.cursor else { return };
                if !self.open || *send_fails {
                    return;
                }
                self.subjects.remove(cursor);
                self.cursor = if self.subjects.is_empty() {
                    None
                } else {
                    Some(cursor.min(self.subjects.len() - 1))
                };
            },
            Op::SetCursor(index) => {
                if *index < self.subjects.len() {
                    self.cursor = Some(*index);
                }
            },
            Op::Next => {
                if let Some(cursor) = self.cursor {
                    if cursor + 1 < self.subjects.len() {
                        self.cursor = Some(cursor + 1);
                    }
                }
            },
            Op::Previous => {
                if let Some(cursor) = self.cursor {
                    self.cursor = Some(cursor.saturating_sub(1));
                }
            },
            Op::Drop => self.open = false,
            Op::Reconnect => self.open = true,
        }
    }
}

struct RealWorld {
    world: World,
    next: usize,
}

impl RealWorld {
    fn new() -> Self {
        let config = session_config().unwrap();
        let mut world = world(SimDriver::new(SimEnv::new()), SimHost::granted(), config).unwrap();
        world.step(DriverEvent::Transport(TransportEvent::Opened));
        Self { world, next: 0 }
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::Deliver { valid } => {
                // Frames only arrive over an open transport.
                if !self.world.session().is_connected() {
                    return;
                }
                let subject = format!("s{}", self.next);
                self.next += 1;
                let candidates: &[&str] = if *valid { &["A"] } else { &[] };
                let text = review_requested(&subject, "sender@x.com", candidates);
                self.world.step(DriverEvent::Transport(TransportEvent::Message(text)));
            },
            Op::Accept { send_fails } => {
                self.world.driver_mut().set_fail_sends(*send_fails);
                self.world.step(DriverEvent::Command(Command::AcceptCandidate { index: 0 }));
            },
            Op::Skip { send_fails } => {
                self.world.driver_mut().set_fail_sends(*send_fails);
                self.world.step(DriverEvent::Command(Command::Skip));
            },
            Op::SetCursor(index) => {
                self.world.step(DriverEvent::Command(Command::SetCursor { index: *index }));
            },
            Op::Next => {
                self.world.step(DriverEvent::Command(Command::Next));
            },
            Op::Previous => {
                self.world.step(DriverEvent::Command(Command::Previous));
            },
            Op::Drop => {
                let closed = TransportEvent::Closed { code: CloseCode::ABNORMAL };
                self.world.step(DriverEvent::Transport(closed));
            },
            Op::Reconnect => {
                self.world.step(DriverEvent::Command(Command::Reconnect));
                self.world.step(DriverEvent::Transport(TransportEvent::Opened));
            },
        }
    }

    fn subjects(&self) -> Vec<String> {
        self.world.session().queue().iter().map(|(_, item)| item.subject().to_string()).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn runtime_matches_model(ops in prop::collection::vec(op(), 1..80)) {
        let mut model = Model { open: true, ..Model::default() };
        let mut real = RealWorld::new();

        for op in &ops {
            model.apply(op);
            real.apply(op);

            prop_assert_eq!(real.subjects(), model.subjects.clone(), "after {:?}", op);
            prop_assert_eq!(real.world.session().queue().cursor(), model.cursor, "after {:?}", op);
            prop_assert_eq!(real.world.session().is_connected(), model.open, "after {:?}", op);
        }
    }
}
