use std::collections::HashMap;

use cko_common::Money;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    cko_api::errors::{AuthorizationError, MetadataError, PricingError},
    db_types::{OrderLineItem, ShippingAddress},
};

/// Payment providers limit the size of each metadata value...
pub const MAX_METADATA_VALUE_LEN: usize = 500;
/// ...and the number of metadata keys on a single payment.
pub const MAX_METADATA_KEYS: usize = 50;

const KEY_CUSTOMER_ID: &str = "customer_id";
const KEY_NAME: &str = "name";
const KEY_LASTNAME: &str = "lastname";
const KEY_EMAIL: &str = "email";
const KEY_DISCOUNT: &str = "discount";
const KEY_SUBTOTAL: &str = "subtotal";
const KEY_GRAND_TOTAL: &str = "grand_total";
const KEY_ITEMS_CHUNKS: &str = "items_chunks";
const FIXED_KEYS: usize = 8;

//--------------------------------------       CartLine        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: String,
    /// The requested variant, e.g. a memory size. `None` selects the base variant.
    pub variant: Option<String>,
    pub quantity: i64,
}

impl CartLine {
    pub fn new<S: Into<String>>(item_id: S, quantity: i64) -> Self {
        Self { item_id: item_id.into(), variant: None, quantity }
    }

    pub fn with_variant<S: Into<String>>(mut self, variant: S) -> Self {
        self.variant = Some(variant.into());
        self
    }
}

//--------------------------------------    ShippingDetails    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub address: ShippingAddress,
}

impl ShippingDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name.trim(), self.lastname.trim()).trim().to_string()
    }

    /// Checks that the fields needed to ship an order are present.
    pub fn validate(&self) -> Result<(), PricingError> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("address", &self.address.line1),
            ("city", &self.address.city),
            ("postal code", &self.address.postal_code),
            ("country", &self.address.country),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(PricingError::InvalidShippingAddress(field.to_string()));
        }
        if !self.email.contains('@') {
            return Err(PricingError::InvalidShippingAddress("email".into()));
        }
        Ok(())
    }
}

//--------------------------------------      PricedCart       ---------------------------------------------------------
/// A priced cart line. The same record is embedded in the payment metadata and finally stored with the order.
pub type PricedLine = OrderLineItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub discount: Money,
    pub grand_total: Money,
    /// The id of the known customer this cart was priced for. `None` for guests.
    pub customer_id: Option<String>,
}

//--------------------------------------  Checkout request     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub lines: Vec<CartLine>,
    pub customer_id: Option<String>,
    pub shipping: ShippingDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub cart: PricedCart,
    pub customer_exists: bool,
    pub payment_intent_id: String,
    /// Handed to the storefront so that it can complete the payment
    pub client_secret: String,
    /// The amount that was authorized, in minor units
    pub amount: i64,
    pub currency: String,
}

//--------------------------------------  Payment authorizer   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    /// In major units. The authorizer converts to the provider's minor units.
    pub amount: Money,
    pub currency: String,
    pub metadata: HashMap<String, String>,
    pub shipping: ShippingDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRef {
    pub id: String,
    pub client_secret: String,
    /// In minor units
    pub amount: i64,
    pub currency: String,
    pub metadata: HashMap<String, String>,
}

/// Opens payment intents with a payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentAuthorizer {
    async fn authorize(&self, request: PaymentIntentRequest) -> Result<PaymentIntentRef, AuthorizationError>;
}

//--------------------------------------     OrderMetadata     ---------------------------------------------------------
/// Everything needed to materialize an order, carried on the payment intent itself.
///
/// The webhook that eventually reports the payment arrives long after the checkout request is gone, and catalog prices
/// may have changed in the meantime. So the priced cart is snapshotted here at checkout and the order is built from
/// this snapshot alone.
///
/// The serialized lines are split into `items_0`, `items_1`, ... with the count in `items_chunks`, so that each value
/// stays within the provider's limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMetadata {
    pub customer_id: Option<String>,
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub discount: Money,
    pub subtotal: Money,
    pub grand_total: Money,
    pub items: Vec<PricedLine>,
}

impl OrderMetadata {
    pub fn new(cart: &PricedCart, shipping: &ShippingDetails) -> Self {
        Self {
            customer_id: cart.customer_id.clone(),
            name: shipping.name.clone(),
            lastname: shipping.lastname.clone(),
            email: shipping.email.clone(),
            discount: cart.discount,
            subtotal: cart.subtotal,
            grand_total: cart.grand_total,
            items: cart.lines.clone(),
        }
    }

    pub fn buyer_name(&self) -> String {
        format!("{} {}", self.name.trim(), self.lastname.trim()).trim().to_string()
    }

    /// The most item chunks that fit next to the fixed keys.
    pub fn max_item_chunks() -> usize {
        MAX_METADATA_KEYS - FIXED_KEYS
    }

    pub fn encode(&self) -> Result<HashMap<String, String>, MetadataError> {
        let mut map = HashMap::with_capacity(MAX_METADATA_KEYS);
        let mut put = |key: &str, value: String| {
            let len = value.chars().count();
            if len > MAX_METADATA_VALUE_LEN {
                return Err(MetadataError::ValueTooLong { field: key.to_string(), len, max: MAX_METADATA_VALUE_LEN });
            }
            map.insert(key.to_string(), value);
            Ok(())
        };
        if let Some(cid) = &self.customer_id {
            put(KEY_CUSTOMER_ID, cid.clone())?;
        }
        put(KEY_NAME, self.name.clone())?;
        put(KEY_LASTNAME, self.lastname.clone())?;
        put(KEY_EMAIL, self.email.clone())?;
        put(KEY_DISCOUNT, self.discount.value().to_string())?;
        put(KEY_SUBTOTAL, self.subtotal.value().to_string())?;
        put(KEY_GRAND_TOTAL, self.grand_total.value().to_string())?;

        let items = serde_json::to_string(&self.items)
            .map_err(|e| MetadataError::InvalidField { field: "items".into(), reason: e.to_string() })?;
        let chars = items.chars().collect::<Vec<char>>();
        let chunks = chars.chunks(MAX_METADATA_VALUE_LEN).map(|c| c.iter().collect::<String>()).collect::<Vec<_>>();
        let max = Self::max_item_chunks();
        if chunks.len() > max {
            return Err(MetadataError::CartTooLarge { chunks: chunks.len(), max });
        }
        put(KEY_ITEMS_CHUNKS, chunks.len().to_string())?;
        for (i, chunk) in chunks.into_iter().enumerate() {
            put(&format!("items_{i}"), chunk)?;
        }
        trace!("🧾️ Encoded order metadata into {} keys", map.len());
        Ok(map)
    }

    pub fn decode(map: &HashMap<String, String>) -> Result<Self, MetadataError> {
        let get = |key: &str| map.get(key).cloned().ok_or_else(|| MetadataError::MissingField(key.to_string()));
        let money = |key: &str| {
            get(key)?
                .parse::<Money>()
                .map_err(|e| MetadataError::InvalidField { field: key.to_string(), reason: e.to_string() })
        };
        let num_chunks = get(KEY_ITEMS_CHUNKS)?
            .parse::<usize>()
            .map_err(|e| MetadataError::InvalidField { field: KEY_ITEMS_CHUNKS.into(), reason: e.to_string() })?;
        let mut items = String::new();
        for i in 0..num_chunks {
            items.push_str(&get(&format!("items_{i}"))?);
        }
        let items = serde_json::from_str::<Vec<PricedLine>>(&items)
            .map_err(|e| MetadataError::InvalidField { field: "items".into(), reason: e.to_string() })?;
        let customer_id = map.get(KEY_CUSTOMER_ID).filter(|s| !s.trim().is_empty()).cloned();
        Ok(Self {
            customer_id,
            name: get(KEY_NAME)?,
            lastname: get(KEY_LASTNAME)?,
            email: get(KEY_EMAIL)?,
            discount: money(KEY_DISCOUNT)?,
            subtotal: money(KEY_SUBTOTAL)?,
            grand_total: money(KEY_GRAND_TOTAL)?,
            items,
        })
    }
}
