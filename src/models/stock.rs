use serde::{Deserialize, Serialize};

use super::{Identified, ItemId};

/// A position in the household stock portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    #[serde(default)]
    pub id: ItemId,
    pub ticker: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default, alias = "prevPrice")]
    pub prev_price: f64,
}

impl Holding {
    pub fn from_draft(draft: HoldingDraft) -> Self {
        Self {
            id: ItemId::new(),
            ticker: draft.ticker,
            price: draft.price,
            quantity: draft.quantity,
            prev_price: draft.prev_price,
        }
    }

    pub fn apply(&mut self, draft: HoldingDraft) {
        self.ticker = draft.ticker;
        self.price = draft.price;
        self.quantity = draft.quantity;
        self.prev_price = draft.prev_price;
    }

    /// Records a fresh quote, keeping the current one as the previous price.
    pub fn reprice(&mut self, price: f64) {
        self.prev_price = self.price;
        self.price = price;
    }

    pub fn value(&self) -> f64 {
        self.price * self.quantity
    }

    /// Value change since the previous price.
    pub fn change(&self) -> f64 {
        (self.price - self.prev_price) * self.quantity
    }

    /// Percent change since the previous price, `None` without a previous price.
    pub fn change_pct(&self) -> Option<f64> {
        if self.prev_price == 0.0 {
            return None;
        }
        Some((self.price - self.prev_price) / self.prev_price * 100.0)
    }
}

impl Identified for Holding {
    fn id(&self) -> ItemId {
        self.id
    }

    fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn label(&self) -> &str {
        &self.ticker
    }
}

/// Form values for a holding.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingDraft {
    pub ticker: String,
    pub price: f64,
    pub quantity: f64,
    pub prev_price: f64,
}

impl HoldingDraft {
    pub fn new(ticker: impl Into<String>, price: f64, quantity: f64) -> Self {
        Self {
            ticker: ticker.into().trim().to_uppercase(),
            price,
            quantity,
            prev_price: price,
        }
    }

    pub fn with_prev_price(mut self, prev_price: f64) -> Self {
        self.prev_price = prev_price;
        self
    }
}

/// Totals across all holdings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PortfolioSummary {
    pub value: f64,
    pub change: f64,
}

impl PortfolioSummary {
    pub fn of(holdings: &[Holding]) -> Self {
        holdings.iter().fold(Self::default(), |acc, h| Self {
            value: acc.value + h.value(),
            change: acc.change + h.change(),
        })
    }
}
