use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::StripeApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Address {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Shipping {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Amount in minor units
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub shipping: Option<Shipping>,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub last_payment_error: Option<PaymentError>,
}

/// The parameters for a new payment intent. Amounts are in minor units.
#[derive(Debug, Clone, Default)]
pub struct NewPaymentIntent {
    pub amount: i64,
    pub currency: String,
    pub payment_method_types: Vec<String>,
    /// Sorted, so that the encoded request is deterministic
    pub metadata: BTreeMap<String, String>,
    pub shipping: Option<Shipping>,
}

impl NewPaymentIntent {
    pub fn new(amount: i64, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_lowercase(),
            payment_method_types: vec!["card".to_string()],
            ..Default::default()
        }
    }

    pub fn with_metadata<I: IntoIterator<Item = (String, String)>>(mut self, metadata: I) -> Self {
        self.metadata.extend(metadata);
        self
    }

    pub fn with_shipping(mut self, shipping: Shipping) -> Self {
        self.shipping = Some(shipping);
        self
    }

    /// Encodes the intent as the bracketed form parameters the Stripe REST API expects,
    /// e.g. `metadata[email]=...` and `shipping[address][city]=...`.
    pub fn to_form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("amount".to_string(), self.amount.to_string()), ("currency".into(), self.currency.clone())];
        for (i, method) in self.payment_method_types.iter().enumerate() {
            params.push((format!("payment_method_types[{i}]"), method.clone()));
        }
        for (k, v) in &self.metadata {
            params.push((format!("metadata[{k}]"), v.clone()));
        }
        if let Some(shipping) = &self.shipping {
            let mut push = |key: &str, value: &Option<String>| {
                if let Some(v) = value {
                    params.push((format!("shipping{key}"), v.clone()));
                }
            };
            push("[name]", &shipping.name);
            push("[phone]", &shipping.phone);
            push("[address][line1]", &shipping.address.line1);
            push("[address][line2]", &shipping.address.line2);
            push("[address][city]", &shipping.address.city);
            push("[address][state]", &shipping.address.state);
            push("[address][postal_code]", &shipping.address.postal_code);
            push("[address][country]", &shipping.address.country);
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventData {
    pub object: Value,
}

/// A webhook event, as delivered by Stripe. Only trust instances produced by [`crate::verify_event`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    pub data: EventData,
}

impl StripeEvent {
    /// The `object` field of the event's data, e.g. `payment_intent` or `charge`.
    pub fn object_type(&self) -> &str {
        self.data.object["object"].as_str().unwrap_or("unknown")
    }

    pub fn payment_intent(&self) -> Result<PaymentIntent, StripeApiError> {
        match self.object_type() {
            "payment_intent" => serde_json::from_value(self.data.object.clone())
                .map_err(|e| StripeApiError::JsonError(format!("Invalid payment intent in event {}. {e}", self.id))),
            other => Err(StripeApiError::UnexpectedEventObject { expected: "payment_intent", found: other.to_string() }),
        }
    }
}
