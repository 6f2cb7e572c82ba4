use std::fmt::Debug;

use cko_common::Money;
use log::*;
use rust_decimal::Decimal;

use crate::{
    cko_api::{
        checkout_objects::{CartLine, PricedCart, PricedLine, ShippingDetails},
        errors::PricingError,
    },
    db_types::Customer,
    traits::PricingDatabase,
};

/// 5%
pub const DEFAULT_MEMBER_DISCOUNT_PERCENT: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// `PricingApi` turns a list of cart lines into a [`PricedCart`] using the catalog as it stands right now.
///
/// Nothing is cached between calls and nothing the client sends about prices is trusted.
pub struct PricingApi<B> {
    db: B,
    member_discount: Decimal,
}

impl<B> Debug for PricingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PricingApi ({}% member discount)", self.member_discount)
    }
}

impl<B> PricingApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, member_discount: DEFAULT_MEMBER_DISCOUNT_PERCENT }
    }

    /// Sets the percentage taken off the subtotal for known, eligible customers.
    pub fn with_member_discount(mut self, percent: Decimal) -> Self {
        self.member_discount = percent;
        self
    }

    pub fn member_discount(&self) -> Decimal {
        self.member_discount
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn validate_shipping(&self, details: &ShippingDetails) -> Result<(), PricingError> {
        details.validate()
    }
}

impl<B> PricingApi<B>
where B: PricingDatabase
{
    /// Prices the cart.
    ///
    /// Every quantity is checked before the catalog is touched. Each line is priced at the requested variant's price
    /// if the item has that variant, or at the base price otherwise. If `customer_id` resolves to a customer that is
    /// eligible for the member discount, the discount percentage is taken off the subtotal. Unknown customer ids are
    /// priced as guests.
    pub async fn price_cart(&self, lines: &[CartLine], customer_id: Option<&str>) -> Result<PricedCart, PricingError> {
        if lines.is_empty() {
            return Err(PricingError::EmptyCart);
        }
        if let Some(line) = lines.iter().find(|l| l.quantity < 1) {
            debug!("🏷️ Rejecting cart with quantity {} for item {}", line.quantity, line.item_id);
            return Err(PricingError::InvalidQuantity { item_id: line.item_id.clone(), quantity: line.quantity });
        }
        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let item = self
                .db
                .fetch_item(&line.item_id)
                .await?
                .ok_or_else(|| PricingError::ItemNotFound(line.item_id.clone()))?;
            let (variant, unit_price) = item.price_for(line.variant.as_deref());
            if line.variant.as_deref().is_some_and(|v| v != variant) {
                debug!("🏷️ Item {} has no {:?} variant. Using the base price.", item.id, line.variant);
            }
            let line_total = unit_price
                .checked_times(line.quantity)
                .ok_or_else(|| PricingError::AmountTooLarge(format!("{} x {}", line.quantity, item.id)))?;
            priced.push(PricedLine {
                item_id: item.id,
                name: item.name,
                variant,
                unit_price,
                quantity: line.quantity,
                line_total,
            });
        }
        let subtotal = priced
            .iter()
            .try_fold(Money::default(), |acc, l| acc.checked_add(l.line_total))
            .ok_or_else(|| PricingError::AmountTooLarge("the cart subtotal".into()))?;
        let customer = self.resolve_customer(customer_id).await?;
        let discount = match &customer {
            Some(c) if c.discount_eligible => subtotal
                .percentage(self.member_discount)
                .ok_or_else(|| PricingError::AmountTooLarge("the member discount".into()))?,
            _ => Money::default(),
        };
        let grand_total = subtotal - discount;
        trace!("🏷️ Priced {} lines. Subtotal {subtotal}, discount {discount}, total {grand_total}", priced.len());
        Ok(PricedCart { lines: priced, subtotal, discount, grand_total, customer_id: customer.map(|c| c.id) })
    }

    /// Looks the customer up. Blank and unknown ids resolve to `None`.
    pub async fn resolve_customer(&self, customer_id: Option<&str>) -> Result<Option<Customer>, PricingError> {
        let Some(cid) = customer_id.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        let customer = self.db.fetch_customer(cid).await?;
        if customer.is_none() {
            debug!("🏷️ Customer {cid} is unknown. Treating the checkout as a guest checkout.");
        }
        Ok(customer)
    }
}
