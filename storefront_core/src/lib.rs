//! Core session logic for the Greenflwr plant storefront.
//!
//! A [`Storefront`] owns one user's navigation, portfolio and marketplace
//! filter, plus the simulated greenhouse feed of the detail view. Time is
//! virtual: the host drives it with [`Storefront::advance`], and every settled
//! change is published as a [`StorefrontSnapshot`].

pub mod catalog;
pub mod config;
pub mod filter;
pub mod navigation;
pub mod portfolio;
pub mod scheduler;
mod snapshot;
mod storefront;
pub mod telemetry;

pub use catalog::{
    Catalog, CatalogError, CatalogItem, Category, GrowthStage, HealthStatus, ItemId, Variant,
    VariantId,
};
pub use config::{StorefrontConfig, StorefrontConfigError, TelemetryConfig};
pub use filter::{CatalogFilter, FilteredCatalog};
pub use navigation::{NavigationState, Navigator, Screen, View};
pub use portfolio::{Portfolio, PortfolioSummary};
pub use scheduler::{Scheduler, TimerId, TimerQueue};
pub use snapshot::{ListingSnapshot, StorefrontSnapshot};
pub use storefront::{DetailView, Storefront, StorefrontError};
pub use telemetry::{
    ConnectionPhase, SensorReadings, SessionId, TelemetrySession, TelemetrySnapshot,
    VariantSelection,
};

/// Builds a storefront from the config named by
/// [`config::CONFIG_PATH_ENV`], falling back to the builtin config and catalog.
pub fn build_storefront() -> Result<Storefront, StorefrontError> {
    let config = StorefrontConfig::from_env()?;
    Storefront::from_config(config)
}
