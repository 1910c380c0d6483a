//! Multi-participant simulation.
//!
//! A [`SimWorld`] wires several [`Runtime`]s to one [`SimServer`] and one
//! virtual clock. Each participant is the production runtime with a
//! [`SimDriver`] and a [`SimBackend`]; invariants are asserted after every
//! step.

use std::{sync::PoisonError, time::Duration};

use agrichat_app::{Intent, Runtime, RuntimeConfig};
use agrichat_client::{ChatClient, ClientConfig, PanelView};
use agrichat_proto::{OrderSummary, Role, UserId};

use crate::{
    ClientSnapshot, InvariantRegistry, SharedSimServer, SimBackend, SimDriver, SimEnv, SimServer,
    SystemSnapshot, create_shared_server,
};

/// Runtime type every participant runs.
pub type SimRuntime = Runtime<SimDriver, SimBackend, SimEnv>;

/// Endpoint handed to simulated clients; the driver ignores it.
const SIM_ENDPOINT: &str = "ws://sim.agrichat";

/// Handle to a participant in a [`SimWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant(usize);

/// Simulated server plus participants sharing one clock.
pub struct SimWorld {
    env: SimEnv,
    server: SharedSimServer,
    participants: Vec<SimRuntime>,
    invariants: InvariantRegistry,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new(SimEnv::new())
    }
}

impl SimWorld {
    /// Empty world on `env`, checking the standard invariants.
    pub fn new(env: SimEnv) -> Self {
        Self {
            env,
            server: create_shared_server(),
            participants: Vec::new(),
            invariants: InvariantRegistry::standard(),
        }
    }

    /// Add a participant who sees `orders` when opening the panel.
    pub fn join(&mut self, user: &str, role: Role, orders: Vec<OrderSummary>) -> Participant {
        let config = ClientConfig::new(SIM_ENDPOINT, UserId::from(user), role);
        let client = ChatClient::new(self.env.clone(), config);
        let driver = SimDriver::new(self.server.clone());
        let backend = SimBackend::new(self.server.clone(), orders);

        self.participants.push(Runtime::new(driver, backend, client, RuntimeConfig::default()));
        Participant(self.participants.len() - 1)
    }

    /// Start every participant: register and connect.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub async fn start(&mut self) -> Result<(), crate::SimDriverError> {
        for runtime in &mut self.participants {
            runtime.start().await?;
        }
        self.check("after start");
        Ok(())
    }

    /// Queue an intent for one participant.
    pub fn intent(&mut self, who: Participant, intent: Intent) {
        self.runtime_mut(who).driver_mut().push_intent(intent);
    }

    /// Run one loop cycle for every participant, in join order.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub async fn step(&mut self) -> Result<(), crate::SimDriverError> {
        for runtime in &mut self.participants {
            runtime.step().await?;
        }
        self.check("after step");
        Ok(())
    }

    /// Step until no participant has scripted input or undelivered frames.
    /// Always steps at least once.
    ///
    /// # Errors
    ///
    /// Propagates driver errors.
    pub async fn settle(&mut self) -> Result<(), crate::SimDriverError> {
        loop {
            self.step().await?;
            let busy = self
                .participants
                .iter()
                .any(|rt| rt.driver().has_pending() || rt.driver().has_inbound());
            if !busy {
                return Ok(());
            }
        }
    }

    /// Move the shared clock forward.
    pub fn advance(&self, by: Duration) {
        self.env.advance(by);
    }

    /// Latest rendered view of a participant.
    pub fn view(&self, who: Participant) -> Option<&PanelView> {
        self.runtime(who).driver().last_view()
    }

    /// Participant runtime.
    pub fn runtime(&self, who: Participant) -> &SimRuntime {
        &self.participants[who.0]
    }

    /// Participant runtime, mutably.
    pub fn runtime_mut(&mut self, who: Participant) -> &mut SimRuntime {
        &mut self.participants[who.0]
    }

    /// Run `f` against the server.
    pub fn with_server<T>(&self, f: impl FnOnce(&mut SimServer) -> T) -> T {
        let mut server = self.server.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut server)
    }

    /// Snapshot of every participant.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_clients(
            self.participants.iter().map(|rt| ClientSnapshot::capture(rt.client())).collect(),
        )
    }

    fn check(&self, context: &str) {
        self.invariants.assert_all(&self.snapshot(), context);
    }
}
