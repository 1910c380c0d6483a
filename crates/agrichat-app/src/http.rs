//! Storefront REST backend.
//!
//! Endpoints, relative to the API base URL:
//!
//! - `GET /chat/history/{orderId}` returns `[Message]`
//! - `GET /chat/conversations` returns the farmer's `[Order]`
//! - `GET /order/` returns the customer's `{ "orders": [Order] }`
//!
//! Requests carry `Authorization: Bearer <token>` when a token is configured.
//! Orders that fail to decode are logged and left out of the listing.

use agrichat_client::FetchError;
use agrichat_proto::{Message, OrderId, OrderListing, OrderSummary, Role};
use serde::{Deserialize, de::DeserializeOwned};

use crate::Backend;

/// Customer order listing envelope.
#[derive(Debug, Deserialize)]
struct CustomerOrders {
    #[serde(default)]
    orders: OrderListing,
}

fn accepted(listing: OrderListing) -> Vec<OrderSummary> {
    for reason in &listing.rejected {
        tracing::warn!(%reason, "skipping undecodable order");
    }
    listing.orders
}

/// [`Backend`] over the storefront REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    api: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Backend rooted at `api`, e.g. `https://shop.example/api/v1/agridirect`.
    pub fn new(api: impl Into<String>, token: Option<String>) -> Self {
        let api = api.into().trim_end_matches('/').to_string();
        Self { client: reqwest::Client::new(), api, token }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = self.url(path);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%url, error = %e, "request failed");
            FetchError::Request(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "request rejected");
            return Err(FetchError::Status { status: status.as_u16() });
        }

        response.json::<T>().await.map_err(|e| {
            tracing::warn!(%url, error = %e, "undecodable response");
            FetchError::Decode(e.to_string())
        })
    }
}

impl Backend for HttpBackend {
    async fn list_orders(&self, role: Role) -> Result<Vec<OrderSummary>, FetchError> {
        let listing = match role {
            Role::Farmer => self.get::<OrderListing>("/chat/conversations").await?,
            Role::Customer => self.get::<CustomerOrders>("/order/").await?.orders,
        };
        Ok(accepted(listing))
    }

    async fn fetch_history(&self, order_id: &OrderId) -> Result<Vec<Message>, FetchError> {
        self.get(&format!("/chat/history/{order_id}")).await
    }
}
