//! # Stripe tools
//!
//! A thin client for the parts of the Stripe API that the checkout gateway relies on:
//!
//! * [`StripeApi`] creates payment intents over the REST API.
//! * [`webhook`] authenticates inbound webhook deliveries against the endpoint's signing secret.
//! * [`data_objects`] holds the provider-side representations of payment intents and events.
//!
//! Nothing in this crate knows about orders or carts. Mapping provider objects onto checkout concepts is the job of
//! the server's integration layer.
mod api;
mod config;
mod error;

pub mod data_objects;
pub mod helpers;
pub mod webhook;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{Address, NewPaymentIntent, PaymentIntent, Shipping, StripeEvent};
pub use error::StripeApiError;
pub use webhook::{verify_event, WebhookError, STRIPE_SIGNATURE_HEADER};
