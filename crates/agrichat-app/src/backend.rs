//! Storefront collaborators the chat depends on.

use std::future::Future;

use agrichat_client::FetchError;
use agrichat_proto::{Message, OrderId, OrderSummary, Role};

/// Persisted history and order listings.
///
/// Production talks to the storefront REST API; simulation serves from
/// memory. Failures are returned, never panicked on; the client treats a
/// failed fetch as an empty result.
pub trait Backend: Send {
    /// Orders eligible for chat.
    ///
    /// Farmers get their active conversations; customers get their own orders.
    fn list_orders(
        &self,
        role: Role,
    ) -> impl Future<Output = Result<Vec<OrderSummary>, FetchError>> + Send;

    /// Persisted messages for one order, oldest first.
    fn fetch_history(
        &self,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<Vec<Message>, FetchError>> + Send;
}
