//! Generic runtime for chat orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`ChatClient`]: the pure chat state machine
//! - [`Driver`]: platform-specific I/O (socket, input, rendering)
//! - [`Backend`]: storefront fetches (orders, history)

use std::{collections::VecDeque, time::Duration};

use agrichat_client::{ChatClient, ClientAction, ClientEvent, ConnectionState, Environment};

use crate::{Backend, Driver};

/// Loop pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Longest wait for input before the client is ticked.
    pub tick_interval: Duration,
    /// Frames drained from the socket per cycle, so input stays responsive
    /// under a burst.
    pub max_frames_per_cycle: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { tick_interval: Duration::from_millis(100), max_frames_per_cycle: 64 }
    }
}

/// Generic runtime that executes client actions through a driver and a
/// backend.
///
/// # Type Parameters
///
/// - `D`: platform-specific I/O driver
/// - `B`: storefront backend
/// - `E`: environment supplying time and randomness to the client
pub struct Runtime<D, B, E>
where
    D: Driver,
    B: Backend,
    E: Environment,
{
    driver: D,
    backend: B,
    client: ChatClient<E>,
    config: RuntimeConfig,
}

impl<D, B, E> Runtime<D, B, E>
where
    D: Driver,
    B: Backend,
    E: Environment,
{
    /// Create a runtime around a not-yet-started client.
    pub fn new(driver: D, backend: B, client: ChatClient<E>, config: RuntimeConfig) -> Self {
        Self { driver, backend, client, config }
    }

    /// Run until the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll input or render.
    /// Socket and fetch failures are absorbed by the client.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.start().await?;

        while !self.step().await? {}

        self.shutdown().await?;
        self.driver.stop();
        Ok(())
    }

    /// Leave the open conversation and close the socket.
    ///
    /// Sends the teardown frames (a pending `stop_typing`) before the socket
    /// goes away. No reconnect is scheduled afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to render.
    pub async fn shutdown(&mut self) -> Result<(), D::Error> {
        let actions = self.client.shutdown();
        self.execute(actions).await
    }

    /// Announce the user, connect, and draw the first frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial render fails.
    pub async fn start(&mut self) -> Result<(), D::Error> {
        let actions = self.client.start();
        self.execute(actions).await?;
        self.render()
    }

    /// Process one cycle of the event loop.
    ///
    /// 1. Wait up to the tick interval for one user intent
    /// 2. Drain buffered server frames
    /// 3. Report a socket the peer closed
    /// 4. Tick the client (typing debounce, reconnect timing)
    ///
    /// Returns `true` if the user asked to quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to poll input or render.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        if let Some(intent) = self.driver.poll_intent(self.config.tick_interval).await? {
            let Some(event) = intent.into_event() else {
                return Ok(true);
            };
            self.feed(event).await?;
        }

        let mut received = 0;
        while received < self.config.max_frames_per_cycle
            && let Some(frame) = self.driver.recv_frame().await
        {
            received += 1;
            self.feed(ClientEvent::FrameReceived(frame)).await?;
        }

        if self.client.connection_state() == ConnectionState::Connected
            && !self.driver.is_connected()
        {
            tracing::info!("socket closed by server");
            self.feed(ClientEvent::Disconnected).await?;
        }

        self.feed(ClientEvent::Tick).await?;
        Ok(false)
    }

    /// Hand one event to the client and execute what it asks for.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub async fn feed(&mut self, event: ClientEvent) -> Result<(), D::Error> {
        let actions = self.client.handle(event);
        self.execute(actions).await
    }

    /// Execute actions in order. Completed connects and fetches are fed back
    /// to the client and their actions queued behind the current ones.
    /// Redraws are coalesced into one render at the end.
    async fn execute(&mut self, actions: Vec<ClientAction>) -> Result<(), D::Error> {
        let mut pending: VecDeque<ClientAction> = actions.into();
        let mut needs_render = false;

        while let Some(action) = pending.pop_front() {
            let completion = match action {
                ClientAction::Render => {
                    needs_render = true;
                    None
                },
                ClientAction::SendFrame(frame) => {
                    if let Err(err) = self.driver.send_frame(frame).await {
                        tracing::warn!(error = %err, "failed to send frame");
                    }
                    None
                },
                ClientAction::Connect { endpoint } => match self.driver.connect(&endpoint).await {
                    Ok(()) => Some(ClientEvent::Connected),
                    Err(err) => {
                        tracing::warn!(%endpoint, error = %err, "connect failed");
                        Some(ClientEvent::Disconnected)
                    },
                },
                ClientAction::Close { reason } => {
                    tracing::debug!(%reason, "closing socket");
                    self.driver.close();
                    None
                },
                ClientAction::FetchOrders { role } => {
                    Some(ClientEvent::OrdersLoaded(self.backend.list_orders(role).await))
                },
                ClientAction::FetchHistory { order_id } => {
                    let result = self.backend.fetch_history(&order_id).await;
                    Some(ClientEvent::HistoryLoaded { order_id, result })
                },
                ClientAction::Notify { order_id, preview } => {
                    self.driver.notify(&order_id, &preview);
                    None
                },
            };

            if let Some(event) = completion {
                pending.extend(self.client.handle(event));
            }
        }

        if needs_render {
            self.render()?;
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), D::Error> {
        let view = self.client.view();
        self.driver.render(&view)
    }

    /// Chat client.
    pub fn client(&self) -> &ChatClient<E> {
        &self.client
    }

    /// Driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutable driver, for scripting input in simulation.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend, for seeding data in simulation.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
