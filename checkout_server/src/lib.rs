//! # Checkout server
//! This crate hosts the HTTP server of the checkout gateway. It is responsible for:
//! * Pricing carts and opening Stripe payment intents for them.
//! * Listening for signed webhook deliveries from Stripe.
//! * Verifying each delivery and handing the event to the order flow, which creates exactly one order per successful
//!   payment.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/checkout`: Prices a cart and opens a payment intent for it.
//! * `/stripe/webhook`: Receives payment events from Stripe.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
