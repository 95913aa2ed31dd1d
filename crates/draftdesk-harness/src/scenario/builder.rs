//! Scenario builder API.

use std::time::Duration;

use draftdesk_app::{Command, DriverEvent, SessionConfig, TransportEvent};
use draftdesk_proto::CloseCode;

use super::{OracleFn, session_config, world};
use crate::{
    sim_driver::{SimDriver, Step},
    sim_env::SimEnv,
    sim_host::SimHost,
};

/// Scenario builder.
///
/// Must call `.oracle()` to get a [`RunnableScenario`].
pub struct Scenario {
    name: String,
    seed: u64,
    host: SimHost,
    config: Option<SessionConfig>,
    steps: Vec<Step>,
    fail_sends: bool,
}

impl Scenario {
    /// Create a new scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seed: 0,
            host: SimHost::granted(),
            config: None,
            steps: Vec::new(),
            fail_sends: false,
        }
    }

    /// Seed for the simulation's randomness.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Notification host to run against.
    #[must_use]
    pub fn host(mut self, host: SimHost) -> Self {
        self.host = host;
        self
    }

    /// Session configuration.
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Make every send fail.
    #[must_use]
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// The pending attempt completes.
    #[must_use]
    pub fn open(self) -> Self {
        self.transport(TransportEvent::Opened)
    }

    /// The transport closes with `code`.
    #[must_use]
    pub fn close(self, code: CloseCode) -> Self {
        self.transport(TransportEvent::Closed { code })
    }

    /// The server sends a text frame.
    #[must_use]
    pub fn server(self, text: impl Into<String>) -> Self {
        self.transport(TransportEvent::Message(text.into()))
    }

    /// A transport signal.
    #[must_use]
    pub fn transport(mut self, event: TransportEvent) -> Self {
        self.steps.push(Step::Event(DriverEvent::Transport(event)));
        self
    }

    /// The reviewer issues a command.
    #[must_use]
    pub fn reviewer(mut self, command: Command) -> Self {
        self.steps.push(Step::Event(DriverEvent::Command(command)));
        self
    }

    /// Virtual time passes.
    #[must_use]
    pub fn wait(mut self, duration: Duration) -> Self {
        self.steps.push(Step::Wait(duration));
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory: a scenario cannot run without verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario and run the oracle over the final world.
    ///
    /// The runtime is started, every scripted step is fed through
    /// [`Runtime::step`] (firing deadlines during waits), then the oracle is
    /// invoked. The session is not shut down, so the oracle sees it live.
    ///
    /// # Errors
    /// Returns the oracle's verdict prefixed with the scenario name.
    pub fn run(self) -> Result<(), String> {
        let Scenario { name, seed, host, config, steps, fail_sends } = self.scenario;

        let mut driver = SimDriver::new(SimEnv::with_seed(seed));
        driver.set_fail_sends(fail_sends);
        for step in steps {
            match step {
                Step::Event(event) => driver.push_event(event),
                Step::Wait(duration) => driver.push_wait(duration),
            }
        }

        let config = match config {
            Some(config) => config,
            None => session_config().map_err(|e| format!("Scenario '{name}': {e}"))?,
        };
        let mut world = world(driver, host, config).map_err(|e| format!("Scenario '{name}': {e}"))?;

        while world.driver().has_script() {
            let deadline = world.session().next_deadline();
            let event = world.driver_mut().next_event(deadline);
            if !world.step(event) {
                break;
            }
        }

        (self.oracle)(&world).map_err(|e| format!("Scenario '{name}': {e}"))
    }
}
