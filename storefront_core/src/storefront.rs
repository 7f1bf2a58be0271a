use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogError, CatalogItem, Category, GrowthStage, ItemId, Variant};
use crate::config::{StorefrontConfig, StorefrontConfigError};
use crate::filter::{CatalogFilter, FilteredCatalog};
use crate::navigation::{NavigationState, Navigator, Screen, View};
use crate::portfolio::{Portfolio, PortfolioSummary};
use crate::scheduler::{Scheduler, TimerQueue};
use crate::snapshot::{ListingSnapshot, StorefrontSnapshot};
use crate::telemetry::{SessionId, TelemetrySession, TelemetryTimer, VariantSelection};

/// Timer firings dispatched by one [`Storefront::advance`] before the backlog
/// of repeating timers is skipped.
pub const MAX_FIRINGS_PER_ADVANCE: usize = 10_000;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Config(#[from] StorefrontConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Detail-view data for the selected item.
#[derive(Clone, Copy, Debug)]
pub struct DetailView<'a> {
    pub item: &'a CatalogItem,
    pub owned: bool,
    /// Variant picked in the live feed, if the item has any.
    pub active_variant: Option<&'a Variant>,
}

impl<'a> DetailView<'a> {
    pub fn display_value(&self) -> u32 {
        self.active_variant
            .map_or(self.item.current_value, |variant| variant.current_value)
    }

    pub fn display_image(&self) -> &'a str {
        self.active_variant
            .map_or(self.item.image.as_str(), |variant| variant.image.as_str())
    }

    pub fn roi_percent(&self) -> f64 {
        self.item.roi_percent()
    }
}

/// One user session: navigation, portfolio, marketplace filter and the live
/// telemetry session of the detail view, all driven from a single thread.
///
/// Every mutating call leaves the storefront settled and publishes a
/// [`StorefrontSnapshot`] to subscribers.
pub struct Storefront {
    catalog: Arc<Catalog>,
    config: Arc<StorefrontConfig>,
    navigator: Navigator,
    portfolio: Portfolio,
    listing_filter: CatalogFilter,
    timers: TimerQueue<TelemetryTimer>,
    telemetry: Option<TelemetrySession>,
    next_session: u64,
    subscribers: Vec<Sender<StorefrontSnapshot>>,
}

impl Storefront {
    pub fn new(catalog: Arc<Catalog>, config: Arc<StorefrontConfig>) -> Self {
        let seed = config.portfolio.default_owned.iter().filter_map(|id| {
            if catalog.contains(id.as_str()) {
                Some(id.clone())
            } else {
                warn!(
                    target: "greenflwr::storefront",
                    item = %id,
                    "portfolio.seed_unknown_item"
                );
                None
            }
        });
        let portfolio =
            Portfolio::new(seed).with_offset_per_item(config.portfolio.offset_per_item_kg);

        info!(
            target: "greenflwr::storefront",
            items = catalog.len(),
            owned = portfolio.len(),
            "storefront.ready"
        );

        Self {
            catalog,
            config,
            navigator: Navigator::new(),
            portfolio,
            listing_filter: CatalogFilter::default(),
            timers: TimerQueue::new(),
            telemetry: None,
            next_session: 0,
            subscribers: Vec::new(),
        }
    }

    /// Builds a storefront from `config`, loading the catalog it names or the
    /// builtin seed data.
    pub fn from_config(config: Arc<StorefrontConfig>) -> Result<Self, StorefrontError> {
        let catalog = match &config.catalog.path {
            Some(path) => Arc::new(Catalog::from_file(path)?),
            None => Catalog::builtin(),
        };
        Ok(Self::new(catalog, config))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn navigation(&self) -> &NavigationState {
        self.navigator.state()
    }

    pub fn screen(&self) -> Screen<'_> {
        self.navigator.resolve(&self.catalog)
    }

    pub fn menu_open(&self) -> bool {
        self.navigator.menu_open()
    }

    pub fn scroll_resets(&self) -> u64 {
        self.navigator.scroll_resets()
    }

    pub fn navigate_to(&mut self, view: View, category: Option<Category>) {
        let previous = self.screen().view();
        self.navigator.navigate_to(view, category);
        self.after_transition(previous);
    }

    /// Opens the detail view for `id`; unknown ids land on the marketplace.
    pub fn view_item(&mut self, id: &str) -> bool {
        let previous = self.screen().view();
        let resolved = self.navigator.view_item(&self.catalog, id);
        self.after_transition(previous);
        resolved
    }

    pub fn back_to_collection(&mut self) -> bool {
        if !self.navigator.back_to_collection(&self.catalog) {
            return false;
        }
        self.after_transition(View::Detail);
        true
    }

    pub fn view_packaging(&mut self) {
        self.navigate_to(View::Packaging, None);
    }

    pub fn toggle_menu(&mut self) -> bool {
        let open = self.navigator.toggle_menu();
        self.publish();
        open
    }

    pub fn listing_filter(&self) -> CatalogFilter {
        self.listing_filter
    }

    pub fn set_category_filter(&mut self, category: Option<Category>) {
        self.listing_filter.category = category;
        self.publish();
    }

    pub fn set_stage_filter(&mut self, stage: Option<GrowthStage>) {
        self.listing_filter.stage = stage;
        self.publish();
    }

    /// Marketplace listing for the current filter, re-evaluated on each call.
    pub fn listing(&self) -> FilteredCatalog<'_> {
        self.listing_filter.apply(&self.catalog)
    }

    /// Adds `id` to the portfolio and moves to the garden. Unknown ids are
    /// ignored. Returns whether the item was newly acquired.
    pub fn buy(&mut self, id: &str) -> bool {
        if !self.catalog.contains(id) {
            warn!(target: "greenflwr::storefront", item = id, "portfolio.buy_unknown_item");
            return false;
        }
        let acquired = self.portfolio.buy(&ItemId::from(id));
        self.navigate_to(View::Garden, None);
        acquired
    }

    /// Removes `id` from the portfolio and moves to the garden.
    pub fn sell(&mut self, id: &str) -> bool {
        let sold = self.portfolio.sell(id);
        self.navigate_to(View::Garden, None);
        sold
    }

    pub fn owns(&self, id: &str) -> bool {
        self.portfolio.owns(id)
    }

    pub fn owned_items(&self) -> Vec<&CatalogItem> {
        self.portfolio.owned_items(&self.catalog)
    }

    pub fn portfolio_summary(&self) -> PortfolioSummary {
        self.portfolio.summary(&self.catalog)
    }

    pub fn detail(&self) -> Option<DetailView<'_>> {
        let item = self.screen().detail_item()?;
        let active_variant = self
            .telemetry
            .as_ref()
            .and_then(|session| session.selected_variant())
            .and_then(|variant| item.variant(variant.as_str()));
        Some(DetailView {
            item,
            owned: self.portfolio.owns(item.id.as_str()),
            active_variant,
        })
    }

    pub fn telemetry(&self) -> Option<&TelemetrySession> {
        self.telemetry.as_ref()
    }

    pub fn set_camera(&mut self, index: u8) -> bool {
        let changed = self
            .telemetry
            .as_mut()
            .is_some_and(|session| session.set_camera(index));
        if changed {
            self.publish();
        }
        changed
    }

    pub fn zoom_in(&mut self) -> bool {
        let changed = self.telemetry.as_mut().is_some_and(TelemetrySession::zoom_in);
        if changed {
            self.publish();
        }
        changed
    }

    pub fn zoom_out(&mut self) -> bool {
        let changed = self.telemetry.as_mut().is_some_and(TelemetrySession::zoom_out);
        if changed {
            self.publish();
        }
        changed
    }

    pub fn select_variant(&mut self, id: &str) -> VariantSelection {
        let outcome = match self.telemetry.as_mut() {
            Some(session) => session.select_variant(id),
            None => VariantSelection::Rejected,
        };
        if outcome == VariantSelection::Selected {
            self.publish();
        }
        outcome
    }

    /// Session clock, advanced only by [`Storefront::advance`].
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending_len()
    }

    /// Moves the clock forward by `delta`, dispatching every timer that comes
    /// due in order. Returns the number of timers fired.
    ///
    /// After [`MAX_FIRINGS_PER_ADVANCE`] firings the remaining backlog of
    /// repeating timers is skipped, so a huge `delta` settles promptly.
    pub fn advance(&mut self, delta: Duration) -> usize {
        let until = self.timers.now().saturating_add(delta);
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(until) {
            fired += 1;
            if fired % MAX_FIRINGS_PER_ADVANCE == 0 {
                warn!(
                    target: "greenflwr::storefront",
                    fired,
                    "timer.backlog_skipped"
                );
                self.timers.skip_missed(until);
            }
            match self.telemetry.as_mut() {
                Some(session) if session.id() == timer.payload.session => {
                    session.on_timer(timer.payload, &mut self.timers);
                }
                _ => {
                    warn!(
                        target: "greenflwr::storefront",
                        session = %timer.payload.session,
                        "timer.orphaned"
                    );
                    self.timers.cancel(timer.id);
                }
            }
        }
        self.timers.settle(until);
        if fired > 0 {
            self.publish();
        }
        fired
    }

    pub fn snapshot(&self) -> StorefrontSnapshot {
        let screen = self.screen();
        let listing = match screen {
            Screen::Marketplace { .. } => {
                let listing = self.listing();
                Some(ListingSnapshot {
                    filter: listing.filter(),
                    items: listing.ids(),
                })
            }
            _ => None,
        };
        StorefrontSnapshot {
            at_ms: u64::try_from(self.timers.now().as_millis()).unwrap_or(u64::MAX),
            navigation: self.navigator.state().clone(),
            screen: screen.view(),
            menu_open: self.navigator.menu_open(),
            listing,
            owned: self.portfolio.ids(&self.catalog),
            portfolio: self.portfolio_summary(),
            telemetry: self.telemetry.as_ref().map(TelemetrySession::snapshot),
        }
    }

    /// Returns a receiver that gets the current snapshot immediately and a
    /// fresh one after every settled change.
    pub fn subscribe(&mut self) -> Receiver<StorefrontSnapshot> {
        let (sender, receiver) = unbounded();
        let _ = sender.send(self.snapshot());
        self.subscribers.push(sender);
        receiver
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|subscriber| subscriber.send(snapshot.clone()).is_ok());
    }

    /// Settles a transition away from `previous`. Entering the marketplace
    /// takes the category from navigation; the stage filter survives only
    /// while staying on the marketplace.
    fn after_transition(&mut self, previous: View) {
        let marketplace = match self.screen() {
            Screen::Marketplace { category } => Some(category),
            _ => None,
        };
        if let Some(category) = marketplace {
            let stage = if previous == View::Marketplace {
                self.listing_filter.stage
            } else {
                None
            };
            self.listing_filter = CatalogFilter::new(category, stage);
        }
        self.sync_telemetry();
        self.publish();
    }

    /// Keeps exactly one telemetry session alive while the detail view shows
    /// an item, restarting it when the item changes.
    fn sync_telemetry(&mut self) {
        let wanted = self.screen().detail_item().map(|item| item.id.clone());
        let current = self.telemetry.as_ref().map(|session| session.item_id().clone());
        if wanted == current {
            return;
        }

        if let Some(session) = self.telemetry.take() {
            session.teardown(&mut self.timers);
        }

        let catalog = Arc::clone(&self.catalog);
        if let Some(item) = wanted.and_then(|id| catalog.get(id.as_str())) {
            self.next_session += 1;
            self.telemetry = Some(TelemetrySession::start(
                SessionId(self.next_session),
                item,
                &self.config.telemetry,
                &mut self.timers,
            ));
        }
    }
}
