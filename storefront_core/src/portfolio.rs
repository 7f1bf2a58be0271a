use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogItem, ItemId};

/// Kilograms of CO2 offset credited per owned item.
pub const DEFAULT_OFFSET_PER_ITEM_KG: f64 = 1.5;

/// The set of catalog items the user currently holds.
#[derive(Debug, Clone)]
pub struct Portfolio {
    owned: HashSet<ItemId>,
    offset_per_item_kg: f64,
}

/// Aggregate valuation of the owned items, derived on every query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub owned_count: usize,
    pub total_value: u64,
    pub total_invested: u64,
    pub absolute_gain: i64,
    pub percent_gain: f64,
    pub environmental_offset_kg: f64,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self {
            owned: HashSet::new(),
            offset_per_item_kg: DEFAULT_OFFSET_PER_ITEM_KG,
        }
    }
}

impl Portfolio {
    pub fn new<I>(seed: I) -> Self
    where
        I: IntoIterator<Item = ItemId>,
    {
        Self {
            owned: seed.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_offset_per_item(mut self, offset_per_item_kg: f64) -> Self {
        self.offset_per_item_kg = offset_per_item_kg;
        self
    }

    /// Adds `id` to the portfolio. Returns `false` when it was already owned.
    pub fn buy(&mut self, id: &ItemId) -> bool {
        let inserted = self.owned.insert(id.clone());
        if inserted {
            info!(target: "greenflwr::portfolio", item = %id, "portfolio.bought");
        } else {
            debug!(target: "greenflwr::portfolio", item = %id, "portfolio.already_owned");
        }
        inserted
    }

    /// Removes `id` from the portfolio. Returns `false` when it was not owned.
    pub fn sell(&mut self, id: &str) -> bool {
        let removed = self.owned.remove(id);
        if removed {
            info!(target: "greenflwr::portfolio", item = id, "portfolio.sold");
        }
        removed
    }

    pub fn owns(&self, id: &str) -> bool {
        self.owned.contains(id)
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    /// Owned ids in catalog order. Ids the catalog does not know are skipped.
    pub fn ids(&self, catalog: &Catalog) -> Vec<ItemId> {
        self.owned_items(catalog)
            .into_iter()
            .map(|item| item.id.clone())
            .collect()
    }

    pub fn owned_items<'a>(&self, catalog: &'a Catalog) -> Vec<&'a CatalogItem> {
        catalog
            .iter()
            .filter(|item| self.owned.contains(&item.id))
            .collect()
    }

    pub fn summary(&self, catalog: &Catalog) -> PortfolioSummary {
        let items = self.owned_items(catalog);
        let total_value: u64 = items.iter().map(|item| item.current_value as u64).sum();
        let total_invested: u64 = items.iter().map(|item| item.purchase_price as u64).sum();
        let absolute_gain = total_value as i64 - total_invested as i64;
        let percent_gain = if total_invested > 0 {
            absolute_gain as f64 / total_invested as f64 * 100.0
        } else {
            0.0
        };

        PortfolioSummary {
            owned_count: items.len(),
            total_value,
            total_invested,
            absolute_gain,
            percent_gain,
            environmental_offset_kg: items.len() as f64 * self.offset_per_item_kg,
        }
    }
}
