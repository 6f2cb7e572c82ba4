use std::fmt::Display;

use checkout_engine::{
    checkout_objects::{CartLine, CheckoutRequest, CheckoutResult, PricedLine, ShippingDetails},
    db_types::ShippingAddress,
};
use cko_common::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//----------------------------------------------   Checkout  ----------------------------------------------------
/// Storefronts send postal codes as either numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostalCode {
    Number(u64),
    Text(String),
}

impl Default for PostalCode {
    fn default() -> Self {
        PostalCode::Text(String::new())
    }
}

impl Display for PostalCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostalCode::Number(n) => write!(f, "{n}"),
            PostalCode::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItemDto {
    #[serde(rename = "itemID")]
    pub item_id: String,
    /// The quantity
    pub amount: i64,
    /// The memory variant, e.g. "16GB"
    #[serde(default)]
    pub memory: Option<String>,
}

/// The body of a `POST /checkout` request.
///
/// Buyer and address fields default to blank so that a missing field is reported by the shipping validation as an
/// invalid address, naming the field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequestDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(alias = "adress", default)]
    pub address: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postalcode: PostalCode,
    #[serde(default)]
    pub country: String,
    pub item: Vec<CheckoutItemDto>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

impl From<CheckoutRequestDto> for CheckoutRequest {
    fn from(dto: CheckoutRequestDto) -> Self {
        let lines = dto
            .item
            .into_iter()
            .map(|i| CartLine {
                item_id: i.item_id,
                variant: i.memory.filter(|m| !m.trim().is_empty()),
                quantity: i.amount,
            })
            .collect();
        let address = ShippingAddress {
            line1: dto.address,
            line2: dto.address_line2,
            city: dto.city,
            state: dto.state,
            postal_code: dto.postalcode.to_string(),
            country: dto.country,
        };
        let shipping = ShippingDetails { name: dto.name, lastname: dto.lastname, email: dto.email, address };
        let customer_id = dto.user_id.filter(|s| !s.trim().is_empty());
        CheckoutRequest { lines, customer_id, shipping }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub total_price: Money,
    pub subtotal: Money,
    pub discount: Money,
    pub items: Vec<PricedLine>,
    pub customer_exists: bool,
    pub payment_intent_id: String,
    /// The storefront needs this to complete the payment
    pub client_secret: String,
    pub currency: String,
}

impl From<CheckoutResult> for CheckoutResponse {
    fn from(result: CheckoutResult) -> Self {
        Self {
            total_price: result.cart.grand_total,
            subtotal: result.cart.subtotal,
            discount: result.cart.discount,
            items: result.cart.lines,
            customer_exists: result.customer_exists,
            payment_intent_id: result.payment_intent_id,
            client_secret: result.client_secret,
            currency: result.currency,
        }
    }
}
