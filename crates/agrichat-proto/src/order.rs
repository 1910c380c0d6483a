//! Orders eligible for chat and the counterpart resolved from them.
//!
//! The order-listing endpoints return the same order document with varying
//! degrees of population: `user` and `farmer` may be bare ids or embedded
//! profiles, the id may be `_id` or `id`, and the amount may be `total` or
//! `totalAmount`. [`OrderSummary`] accepts all of these and keeps only what
//! the chat panel needs.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{OrderId, ProtocolError, UserId};

/// Which side of an order the local actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Buyer. Chats with the farmer of each order.
    Customer,
    /// Seller. Chats with the customer of each order.
    Farmer,
}

impl Role {
    /// Role of the other party.
    pub fn counterpart(self) -> Self {
        match self {
            Self::Customer => Self::Farmer,
            Self::Farmer => Self::Customer,
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Farmer => "farmer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "farmer" => Ok(Self::Farmer),
            _ => Err(ProtocolError::UnknownRole(s.to_owned())),
        }
    }
}

/// Farm metadata attached to a farmer profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmDetails {
    /// Storefront name of the farm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
}

/// Embedded user or farmer document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyProfile {
    /// Database object id
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<UserId>,
    /// Virtual id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Contact phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Present on farmer profiles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_details: Option<FarmDetails>,
}

impl PartyProfile {
    /// `_id`, else `id`.
    pub fn id(&self) -> Option<&UserId> {
        self.object_id.as_ref().or(self.id.as_ref())
    }

    fn farm_name(&self) -> Option<&str> {
        self.farm_details.as_ref().and_then(|farm| non_empty(farm.farm_name.as_deref()))
    }
}

/// Order party: a bare id or a populated profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartyRef {
    /// Unpopulated reference
    Id(UserId),
    /// Populated reference
    Profile(PartyProfile),
}

impl PartyRef {
    /// Identifier regardless of population.
    pub fn id(&self) -> Option<&UserId> {
        match self {
            Self::Id(id) => Some(id),
            Self::Profile(profile) => profile.id(),
        }
    }

    fn profile(&self) -> Option<&PartyProfile> {
        match self {
            Self::Id(_) => None,
            Self::Profile(profile) => Some(profile),
        }
    }
}

/// Populated product document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    /// Database object id
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Product name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unit of sale, e.g. `kg`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Unit price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// Line item product: a bare id or a populated product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    /// Unpopulated reference
    Id(String),
    /// Populated reference
    Details(ProductDetails),
}

impl ProductRef {
    fn details(&self) -> Option<&ProductDetails> {
        match self {
            Self::Id(_) => None,
            Self::Details(details) => Some(details),
        }
    }
}

/// Line item. Every field is optional because listings vary in detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product, bare or populated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductRef>,
    /// Product reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Product name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Units ordered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    /// Unit of measure, e.g. `kg`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Line price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl OrderItem {
    /// Populated product name, else the item's own name.
    pub fn display_name(&self) -> Option<&str> {
        let product = self.product.as_ref().and_then(ProductRef::details);
        non_empty(product.and_then(|p| p.name.as_deref()))
            .or_else(|| non_empty(self.name.as_deref()))
    }

    /// `{quantity} {unit} x {name}`, leaving out the unit when none is known.
    pub fn summary_line(&self) -> String {
        let product = self.product.as_ref().and_then(ProductRef::details);
        let unit = non_empty(self.unit.as_deref())
            .or_else(|| non_empty(product.and_then(|p| p.unit.as_deref())));
        let quantity = self.quantity.unwrap_or(1.0);
        let name = self.display_name().unwrap_or("Item");

        match unit {
            Some(unit) => format!("{quantity} {unit} x {name}"),
            None => format!("{quantity} x {name}"),
        }
    }
}

/// The other party of a conversation, resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterpart {
    /// Who to route messages to and watch for presence
    pub id: UserId,
    /// Header name
    pub name: String,
    /// Secondary line (farmer name for customers, email or phone for farmers)
    pub details: Option<String>,
}

/// Order as listed for chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawOrder")]
pub struct OrderSummary {
    /// Order id, also the room key
    #[serde(rename = "_id")]
    pub id: OrderId,
    /// Workflow status as reported by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Line items
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Order total, `totalAmount` taking precedence over `total`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    /// Creation instant (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Customer who placed the order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PartyRef>,
    /// Farmer fulfilling the order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farmer: Option<PartyRef>,
}

impl OrderSummary {
    /// Minimal order with only an id.
    pub fn new(id: impl Into<OrderId>) -> Self {
        Self {
            id: id.into(),
            status: None,
            items: Vec::new(),
            total: None,
            created_at: None,
            user: None,
            farmer: None,
        }
    }

    /// Reference to the party `role` talks to.
    pub fn counterpart_ref(&self, role: Role) -> Option<&PartyRef> {
        match role {
            Role::Customer => self.farmer.as_ref(),
            Role::Farmer => self.user.as_ref(),
        }
    }

    /// Resolve the counterpart for an actor in `role`.
    ///
    /// Returns `None` when the order carries no usable counterpart id; such an
    /// order cannot be chatted on.
    pub fn counterpart(&self, role: Role) -> Option<Counterpart> {
        let party = self.counterpart_ref(role)?;
        let id = party.id()?.clone();
        let profile = party.profile();

        Some(Counterpart {
            id,
            name: counterpart_name(role, profile),
            details: counterpart_details(role, profile),
        })
    }

    /// `Order #` followed by the last six characters of the id, uppercased.
    pub fn short_label(&self) -> String {
        let id = self.id.as_str();
        let start = id.char_indices().rev().nth(5).map_or(0, |(at, _)| at);
        format!("Order #{}", id[start..].to_uppercase())
    }
}

/// Order listing decoded one entry at a time.
///
/// An entry that is not a valid order is set aside with the reason instead
/// of failing the whole listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderListing {
    /// Entries that decoded, in listing order
    pub orders: Vec<OrderSummary>,
    /// Why each skipped entry was rejected
    pub rejected: Vec<String>,
}

impl OrderListing {
    /// Decode each entry independently.
    pub fn from_entries(entries: Vec<serde_json::Value>) -> Self {
        let mut listing = Self::default();
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<OrderSummary>(entry) {
                Ok(order) => listing.orders.push(order),
                Err(e) => listing.rejected.push(format!("entry {index}: {e}")),
            }
        }
        listing
    }
}

impl<'de> Deserialize<'de> for OrderListing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<serde_json::Value>::deserialize(deserializer).map(Self::from_entries)
    }
}

fn counterpart_name(role: Role, profile: Option<&PartyProfile>) -> String {
    let name = profile.and_then(|p| non_empty(p.name.as_deref()));
    match role {
        Role::Customer => profile
            .and_then(PartyProfile::farm_name)
            .or(name)
            .unwrap_or("Farmer")
            .to_owned(),
        Role::Farmer => name.unwrap_or("Customer").to_owned(),
    }
}

fn counterpart_details(role: Role, profile: Option<&PartyProfile>) -> Option<String> {
    let profile = profile?;
    let details = match role {
        Role::Customer => non_empty(profile.name.as_deref()),
        Role::Farmer => {
            non_empty(profile.email.as_deref()).or_else(|| non_empty(profile.phone.as_deref()))
        },
    };
    details.map(str::to_owned)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrder {
    #[serde(rename = "_id", default)]
    object_id: Option<OrderId>,
    #[serde(default)]
    id: Option<OrderId>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    items: Option<Vec<OrderItem>>,
    #[serde(default)]
    total: Option<f64>,
    #[serde(default)]
    total_amount: Option<f64>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    user: Option<PartyRef>,
    #[serde(default)]
    farmer: Option<PartyRef>,
}

impl TryFrom<RawOrder> for OrderSummary {
    type Error = String;

    fn try_from(raw: RawOrder) -> Result<Self, Self::Error> {
        let id = raw.object_id.or(raw.id).ok_or_else(|| "order has neither _id nor id".to_owned())?;

        Ok(Self {
            id,
            status: raw.status,
            items: raw.items.unwrap_or_default(),
            total: raw.total_amount.or(raw.total),
            created_at: raw.created_at,
            user: raw.user,
            farmer: raw.farmer,
        })
    }
}
