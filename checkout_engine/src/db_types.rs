use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use cko_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------       OrderId       ---------------------------------------------------------
/// Orders are keyed by the payment intent that paid for them, not by a synthetic id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ConversionError("Order id cannot be empty".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Payment has been authorized but not settled. Materialized orders never start here.
    Pending,
    /// The payment succeeded and the order has been recorded.
    Succeeded,
    Shipped,
    Delivered,
    /// Terminal. The order will not be fulfilled.
    Canceled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Succeeded => write!(f, "Succeeded"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Canceled => write!(f, "Canceled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Succeeded" => Ok(Self::Succeeded),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Canceled" => Ok(Self::Canceled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------   ShippingAddress     ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

impl Display for ShippingAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.line1)?;
        if let Some(line2) = &self.line2 {
            write!(f, ", {line2}")?;
        }
        write!(f, ", {}", self.city)?;
        if let Some(state) = &self.state {
            write!(f, ", {state}")?;
        }
        write!(f, " {}, {}", self.postal_code, self.country)
    }
}

//--------------------------------------    OrderLineItem      ---------------------------------------------------------
/// A line of an order, snapshotted at checkout. Never re-derived from current catalog prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub item_id: String,
    pub name: String,
    pub variant: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: OrderId,
    /// `None` for guest checkouts
    pub customer_id: Option<String>,
    pub buyer_name: String,
    pub email: String,
    pub items: Vec<OrderLineItem>,
    pub grand_total: Money,
    pub discount: Money,
    pub currency: String,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatusType,
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: Option<String>,
    pub buyer_name: String,
    pub email: String,
    pub items: Vec<OrderLineItem>,
    pub grand_total: Money,
    pub discount: Money,
    pub currency: String,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|i| i.line_total).sum()
    }
}

//--------------------------------------      CatalogItem      ---------------------------------------------------------
pub const BASE_VARIANT: &str = "Base";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemVariant {
    pub name: String,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    /// The price of the base variant
    pub price: Money,
    #[serde(default)]
    pub variants: Vec<ItemVariant>,
}

impl CatalogItem {
    pub fn new<S: Into<String>>(id: S, name: S, price: Money) -> Self {
        Self { id: id.into(), name: name.into(), price, variants: vec![] }
    }

    pub fn with_variant(mut self, name: &str, price: Money) -> Self {
        self.variants.push(ItemVariant { name: name.to_string(), price });
        self
    }

    /// Resolves the variant name and unit price for a requested variant. A matching variant's price replaces the
    /// base price outright. Unknown or absent variants resolve to the base variant.
    pub fn price_for(&self, variant: Option<&str>) -> (String, Money) {
        variant
            .and_then(|name| self.variants.iter().find(|v| v.name == name))
            .map(|v| (v.name.clone(), v.price))
            .unwrap_or_else(|| (BASE_VARIANT.to_string(), self.price))
    }
}

//--------------------------------------       Customer        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub discount_eligible: bool,
}

impl Customer {
    pub fn new<S: Into<String>>(id: S, name: S, email: S) -> Self {
        Self { id: id.into(), name: name.into(), email: email.into(), discount_eligible: true }
    }
}
