use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::catalog::{Catalog, CatalogItem, Category, ItemId};

/// Closed set of storefront views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum View {
    Home,
    Marketplace,
    Detail,
    Garden,
    Services,
    Blog,
    Offers,
    Corporate,
    Packaging,
}

impl View {
    pub const ALL: [View; 9] = [
        View::Home,
        View::Marketplace,
        View::Detail,
        View::Garden,
        View::Services,
        View::Blog,
        View::Offers,
        View::Corporate,
        View::Packaging,
    ];

    pub fn label(self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Marketplace => "Shop",
            View::Detail => "Live Specimen",
            View::Garden => "My Garden",
            View::Services => "Garden Services",
            View::Blog => "Journal",
            View::Offers => "Offers",
            View::Corporate => "For Business",
            View::Packaging => "Packaging",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Current view plus the context carried across transitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    pub view: View,
    /// Only present while `view` is [`View::Detail`], always a known item.
    pub selected_item: Option<ItemId>,
    pub active_category: Option<Category>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            view: View::Home,
            selected_item: None,
            active_category: None,
        }
    }
}

/// A navigation state resolved against the catalog, one variant per view.
#[derive(Clone, Copy, Debug)]
pub enum Screen<'a> {
    Home,
    Marketplace { category: Option<Category> },
    Detail(&'a CatalogItem),
    Garden,
    Services,
    Blog,
    Offers,
    Corporate,
    Packaging,
}

impl<'a> Screen<'a> {
    pub fn view(&self) -> View {
        match self {
            Screen::Home => View::Home,
            Screen::Marketplace { .. } => View::Marketplace,
            Screen::Detail(_) => View::Detail,
            Screen::Garden => View::Garden,
            Screen::Services => View::Services,
            Screen::Blog => View::Blog,
            Screen::Offers => View::Offers,
            Screen::Corporate => View::Corporate,
            Screen::Packaging => View::Packaging,
        }
    }

    pub fn detail_item(&self) -> Option<&'a CatalogItem> {
        match *self {
            Screen::Detail(item) => Some(item),
            _ => None,
        }
    }
}

/// Owns the [`NavigationState`] and the transient chrome flags that every
/// transition resets.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    state: NavigationState,
    menu_open: bool,
    scroll_resets: u64,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn view(&self) -> View {
        self.state.view
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    /// Number of times a transition asked the renderer to scroll to the top.
    pub fn scroll_resets(&self) -> u64 {
        self.scroll_resets
    }

    pub fn toggle_menu(&mut self) -> bool {
        self.menu_open = !self.menu_open;
        self.menu_open
    }

    /// Switches to `view`. A supplied category becomes the active category;
    /// otherwise the active category is cleared. Detail without a selected
    /// item lands on the marketplace.
    pub fn navigate_to(&mut self, view: View, category: Option<Category>) {
        let from = self.state.view;
        let view = if view == View::Detail && self.state.selected_item.is_none() {
            debug!(
                target: "greenflwr::navigation",
                "navigation.detail_fallback=marketplace"
            );
            View::Marketplace
        } else {
            view
        };
        self.state.view = view;
        self.state.active_category = category;
        if view != View::Detail {
            self.state.selected_item = None;
        }
        self.menu_open = false;
        self.scroll_resets += 1;
        trace!(
            target: "greenflwr::navigation",
            from = %from,
            to = %view,
            category = ?category,
            "navigation.transition"
        );
    }

    /// Opens the detail view for `id`, falling back to the marketplace when
    /// the id is not in the catalog. Returns whether the item resolved.
    pub fn view_item(&mut self, catalog: &Catalog, id: &str) -> bool {
        if !catalog.contains(id) {
            debug!(
                target: "greenflwr::navigation",
                item = id,
                "navigation.detail_fallback=marketplace"
            );
            self.navigate_to(View::Marketplace, None);
            return false;
        }
        self.state.selected_item = Some(ItemId::from(id));
        self.navigate_to(View::Detail, None);
        true
    }

    /// Leaves the detail view for the marketplace, filtered to the category
    /// of the item being left. Returns `false` outside the detail view.
    pub fn back_to_collection(&mut self, catalog: &Catalog) -> bool {
        if self.state.view != View::Detail {
            return false;
        }
        let category = self
            .state
            .selected_item
            .as_ref()
            .and_then(|id| catalog.get(id.as_str()))
            .map(|item| item.category);
        self.navigate_to(View::Marketplace, category);
        true
    }

    pub fn resolve<'a>(&self, catalog: &'a Catalog) -> Screen<'a> {
        match self.state.view {
            View::Home => Screen::Home,
            View::Marketplace => Screen::Marketplace {
                category: self.state.active_category,
            },
            View::Detail => match self
                .state
                .selected_item
                .as_ref()
                .and_then(|id| catalog.get(id.as_str()))
            {
                Some(item) => Screen::Detail(item),
                None => Screen::Marketplace { category: None },
            },
            View::Garden => Screen::Garden,
            View::Services => Screen::Services,
            View::Blog => Screen::Blog,
            View::Offers => Screen::Offers,
            View::Corporate => Screen::Corporate,
            View::Packaging => Screen::Packaging,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_home_without_context() {
        let navigator = Navigator::new();
        assert_eq!(navigator.view(), View::Home);
        assert_eq!(navigator.state(), &NavigationState::default());
        assert!(!navigator.menu_open());
    }

    #[test]
    fn category_is_set_or_cleared_by_each_transition() {
        let mut navigator = Navigator::new();
        navigator.navigate_to(View::Marketplace, Some(Category::Pots));
        assert_eq!(navigator.state().active_category, Some(Category::Pots));

        navigator.navigate_to(View::Marketplace, None);
        assert_eq!(navigator.state().active_category, None);
    }

    #[test]
    fn transitions_close_menu_and_reset_scroll() {
        let mut navigator = Navigator::new();
        assert!(navigator.toggle_menu());
        navigator.navigate_to(View::Blog, None);
        assert!(!navigator.menu_open());
        assert_eq!(navigator.scroll_resets(), 1);
    }

    #[test]
    fn unknown_item_falls_back_to_marketplace() {
        let catalog = Catalog::builtin();
        let mut navigator = Navigator::new();
        navigator.navigate_to(View::Garden, Some(Category::Seeds));

        assert!(!navigator.view_item(&catalog, "nonexistent-id"));
        assert_eq!(navigator.view(), View::Marketplace);
        assert_eq!(navigator.state().selected_item, None);
        assert!(matches!(
            navigator.resolve(&catalog),
            Screen::Marketplace { category: None }
        ));
    }

    #[test]
    fn detail_without_selection_lands_on_marketplace() {
        let catalog = Catalog::builtin();
        let mut navigator = Navigator::new();
        navigator.navigate_to(View::Detail, Some(Category::Care));

        assert_eq!(navigator.view(), View::Marketplace);
        assert_eq!(navigator.state().active_category, Some(Category::Care));
        assert_eq!(navigator.resolve(&catalog).view(), navigator.view());
    }

    #[test]
    fn back_restores_category_of_item_left() {
        let catalog = Catalog::builtin();
        let mut navigator = Navigator::new();
        navigator.navigate_to(View::Marketplace, Some(Category::Seeds));

        assert!(navigator.view_item(&catalog, "6"));
        assert_eq!(navigator.view(), View::Detail);
        assert!(navigator.back_to_collection(&catalog));
        assert_eq!(navigator.view(), View::Marketplace);
        assert_eq!(navigator.state().active_category, Some(Category::Pots));
    }

    #[test]
    fn back_outside_detail_is_ignored() {
        let catalog = Catalog::builtin();
        let mut navigator = Navigator::new();
        assert!(!navigator.back_to_collection(&catalog));
        assert_eq!(navigator.view(), View::Home);
    }

    #[test]
    fn selection_is_dropped_when_leaving_detail() {
        let catalog = Catalog::builtin();
        let mut navigator = Navigator::new();
        navigator.view_item(&catalog, "2");
        navigator.navigate_to(View::Packaging, None);
        assert_eq!(navigator.state().selected_item, None);
        assert!(matches!(navigator.resolve(&catalog), Screen::Packaging));
    }

    #[test]
    fn home_is_reachable_from_every_view() {
        let catalog = Catalog::builtin();
        for view in View::ALL {
            let mut navigator = Navigator::new();
            if view == View::Detail {
                navigator.view_item(&catalog, "1");
            } else {
                navigator.navigate_to(view, None);
            }
            assert_eq!(navigator.resolve(&catalog).view(), view);
            navigator.navigate_to(View::Home, None);
            assert_eq!(navigator.view(), View::Home);
        }
    }
}
