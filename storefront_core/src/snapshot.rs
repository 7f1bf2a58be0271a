use serde::Serialize;

use crate::catalog::ItemId;
use crate::filter::CatalogFilter;
use crate::navigation::{NavigationState, View};
use crate::portfolio::PortfolioSummary;
use crate::telemetry::TelemetrySnapshot;

/// Settled storefront state handed to renderers and subscribers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StorefrontSnapshot {
    pub at_ms: u64,
    pub navigation: NavigationState,
    /// View actually shown once the navigation state is resolved.
    pub screen: View,
    pub menu_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<ListingSnapshot>,
    pub owned: Vec<ItemId>,
    pub portfolio: PortfolioSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<TelemetrySnapshot>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListingSnapshot {
    pub filter: CatalogFilter,
    pub items: Vec<ItemId>,
}

impl StorefrontSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
