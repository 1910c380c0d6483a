//! Storefront backend served from memory.
//!
//! History reads go to the [`SimServer`](crate::SimServer) so messages sent
//! during a simulation show up in later fetches, the way the real backend
//! persists them.

use std::sync::PoisonError;

use agrichat_app::Backend;
use agrichat_client::FetchError;
use agrichat_proto::{Message, OrderId, OrderSummary, Role};

use crate::SharedSimServer;

/// In-memory [`Backend`] with failure injection.
pub struct SimBackend {
    server: SharedSimServer,
    orders: Vec<OrderSummary>,
    failure: Option<FetchError>,
}

impl SimBackend {
    /// Backend listing `orders` and reading history from `server`.
    pub fn new(server: SharedSimServer, orders: Vec<OrderSummary>) -> Self {
        Self { server, orders, failure: None }
    }

    /// Fail every fetch with `failure` until cleared with `None`.
    pub fn fail_with(&mut self, failure: Option<FetchError>) {
        self.failure = failure;
    }

    /// Replace the listed orders.
    pub fn set_orders(&mut self, orders: Vec<OrderSummary>) {
        self.orders = orders;
    }
}

impl Backend for SimBackend {
    async fn list_orders(&self, _role: Role) -> Result<Vec<OrderSummary>, FetchError> {
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(self.orders.clone()),
        }
    }

    async fn fetch_history(&self, order_id: &OrderId) -> Result<Vec<Message>, FetchError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        let history = self.server.lock().unwrap_or_else(PoisonError::into_inner).history(order_id);
        Ok(history)
    }
}
