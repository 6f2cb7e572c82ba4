use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::StripeConfig,
    data_objects::{NewPaymentIntent, PaymentIntent},
    helpers::stripe_error_message,
    StripeApiError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        if let Some(version) = &config.api_version {
            let val = HeaderValue::from_str(version).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
            headers.insert("Stripe-Version", val);
        }
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/v1{path}", self.config.api_base)
    }

    /// Sends a request to the Stripe REST API. Request bodies are form-encoded, as Stripe requires.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Option<&[(String, String)]>,
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(form) = form {
            req = req.form(form);
        }
        let response = req.send().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            Err(StripeApiError::QueryError { status, message: stripe_error_message(&body) })
        }
    }

    /// Opens a new payment intent. The returned intent carries the client secret that the storefront needs to
    /// complete the payment.
    pub async fn create_payment_intent(&self, intent: &NewPaymentIntent) -> Result<PaymentIntent, StripeApiError> {
        if intent.amount <= 0 {
            return Err(StripeApiError::InvalidCurrencyAmount(format!(
                "Payment intents must be for a positive amount, not {}",
                intent.amount
            )));
        }
        debug!("💳️ Creating payment intent for {} {}", intent.amount, intent.currency);
        let params = intent.to_form_params();
        let result = self.rest_query::<PaymentIntent>(Method::POST, "/payment_intents", Some(&params)).await?;
        info!("💳️ Created payment intent {} for {} {}", result.id, result.amount, result.currency);
        Ok(result)
    }
}
