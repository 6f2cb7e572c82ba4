use std::fmt::Debug;

use cko_common::DEFAULT_CURRENCY_CODE;
use log::*;

use crate::{
    cko_api::{
        checkout_objects::{CheckoutRequest, CheckoutResult, OrderMetadata, PaymentAuthorizer, PaymentIntentRequest},
        errors::CheckoutError,
        pricing_api::PricingApi,
    },
    traits::PricingDatabase,
};

/// `CheckoutApi` runs the synchronous half of a purchase: validate, price, and open a payment intent that carries the
/// order snapshot. The order itself is only created later, when the payment provider reports success.
pub struct CheckoutApi<B, A> {
    pricing: PricingApi<B>,
    authorizer: A,
    currency: String,
}

impl<B, A> Debug for CheckoutApi<B, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi ({})", self.currency)
    }
}

impl<B, A> CheckoutApi<B, A> {
    pub fn new(pricing: PricingApi<B>, authorizer: A) -> Self {
        Self { pricing, authorizer, currency: DEFAULT_CURRENCY_CODE.to_string() }
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_lowercase();
        self
    }

    pub fn currency(&self) -> &str {
        self.currency.as_str()
    }

    pub fn pricing(&self) -> &PricingApi<B> {
        &self.pricing
    }

    pub fn authorizer(&self) -> &A {
        &self.authorizer
    }
}

impl<B, A> CheckoutApi<B, A>
where
    B: PricingDatabase,
    A: PaymentAuthorizer,
{
    /// Validates the shipping details, prices the cart and asks the payment provider for a payment intent for the
    /// grand total.
    ///
    /// Nothing reaches the provider unless the cart prices cleanly. A provider failure is returned as is; the buyer
    /// has to retry the checkout.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutResult, CheckoutError> {
        let CheckoutRequest { lines, customer_id, shipping } = request;
        self.pricing.validate_shipping(&shipping)?;
        let cart = self.pricing.price_cart(&lines, customer_id.as_deref()).await?;
        if !cart.grand_total.is_positive() {
            return Err(CheckoutError::InvalidAmount(cart.grand_total.to_string()));
        }
        let metadata = OrderMetadata::new(&cart, &shipping).encode()?;
        let request = PaymentIntentRequest {
            amount: cart.grand_total,
            currency: self.currency.clone(),
            metadata,
            shipping,
        };
        let intent = self.authorizer.authorize(request).await.map_err(|e| {
            warn!("🛍️ Payment authorization failed for a cart of {}. {e}", cart.grand_total);
            e
        })?;
        info!("🛍️ Checkout for {} {} opened payment intent {}", cart.grand_total, self.currency, intent.id);
        let customer_exists = cart.customer_id.is_some();
        Ok(CheckoutResult {
            cart,
            customer_exists,
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            amount: intent.amount,
            currency: intent.currency,
        })
    }
}
