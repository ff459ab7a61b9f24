use crate::error::CoreError;
use crate::rules::money::compute_total;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addon {
    pub name: String,
    pub price_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualQuote {
    pub description: String,
    pub price_cents: i64,
}

/// Price snapshot taken at checkout. `total_cents` is always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub base_price_cents: i64,
    pub addons: Vec<Addon>,
    pub manual_quote: Option<ManualQuote>,
    pub total_cents: i64,
}

impl Pricing {
    pub fn new(
        base_price_cents: i64,
        addons: Vec<Addon>,
        manual_quote: Option<ManualQuote>,
    ) -> Result<Self, CoreError> {
        let total_cents = compute_total(base_price_cents, &addons, manual_quote.as_ref())?;
        Ok(Self {
            base_price_cents,
            addons,
            manual_quote,
            total_cents,
        })
    }

    pub fn with_quote(
        &self,
        addons: Vec<Addon>,
        manual_quote: Option<ManualQuote>,
    ) -> Result<Self, CoreError> {
        Self::new(self.base_price_cents, addons, manual_quote)
    }
}
