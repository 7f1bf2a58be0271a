use serde::Serialize;

use crate::catalog::{Catalog, CatalogItem, Category, GrowthStage, ItemId};

/// Category and growth-stage predicates combined with logical AND.
///
/// An absent predicate matches every item, so the default filter returns the
/// whole catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogFilter {
    pub category: Option<Category>,
    pub stage: Option<GrowthStage>,
}

impl CatalogFilter {
    pub fn new(category: Option<Category>, stage: Option<GrowthStage>) -> Self {
        Self { category, stage }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.category.is_none() && self.stage.is_none()
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        self.category.map_or(true, |category| item.category == category)
            && self.stage.map_or(true, |stage| item.stage == stage)
    }

    pub fn apply<'a>(&self, catalog: &'a Catalog) -> FilteredCatalog<'a> {
        FilteredCatalog {
            filter: *self,
            items: catalog.iter().filter(|item| self.matches(item)).collect(),
        }
    }
}

/// Result of applying a [`CatalogFilter`], in catalog order.
///
/// Carries the filter that produced it so an empty filtered listing can be
/// told apart from an unfiltered query over an empty catalog.
#[derive(Clone, Debug)]
pub struct FilteredCatalog<'a> {
    filter: CatalogFilter,
    items: Vec<&'a CatalogItem>,
}

impl<'a> FilteredCatalog<'a> {
    pub fn filter(&self) -> CatalogFilter {
        self.filter
    }

    pub fn is_unfiltered(&self) -> bool {
        self.filter.is_unfiltered()
    }

    pub fn items(&self) -> &[&'a CatalogItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a CatalogItem> + '_ {
        self.items.iter().copied()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_item;

    fn mixed_catalog() -> Catalog {
        Catalog::from_items(vec![
            sample_item("a", Category::Plants, GrowthStage::Mature),
            sample_item("b", Category::Pots, GrowthStage::Mature),
            sample_item("c", Category::Plants, GrowthStage::Seedling),
            sample_item("d", Category::Plants, GrowthStage::Mature),
            sample_item("e", Category::Seeds, GrowthStage::Seedling),
        ])
        .expect("valid catalog")
    }

    fn ids(listing: &FilteredCatalog<'_>) -> Vec<String> {
        listing.iter().map(|item| item.id.0.clone()).collect()
    }

    #[test]
    fn unfiltered_returns_whole_catalog_in_order() {
        let catalog = mixed_catalog();
        let listing = catalog.filter(None, None);
        assert!(listing.is_unfiltered());
        assert_eq!(ids(&listing), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn predicates_intersect() {
        let catalog = mixed_catalog();
        let listing = catalog.filter(Some(Category::Plants), Some(GrowthStage::Mature));
        assert_eq!(ids(&listing), vec!["a", "d"]);
        assert!(listing
            .iter()
            .all(|item| item.category == Category::Plants && item.stage == GrowthStage::Mature));
    }

    #[test]
    fn single_predicates_filter_independently() {
        let catalog = mixed_catalog();
        assert_eq!(
            ids(&catalog.filter(None, Some(GrowthStage::Seedling))),
            vec!["c", "e"]
        );
        assert_eq!(ids(&catalog.filter(Some(Category::Pots), None)), vec!["b"]);
    }

    #[test]
    fn empty_result_is_distinguishable_from_unfiltered() {
        let catalog = mixed_catalog();
        let listing = catalog.filter(Some(Category::Gifting), None);
        assert!(listing.is_empty());
        assert!(!listing.is_unfiltered());

        let empty = Catalog::default();
        let everything = empty.filter(None, None);
        assert!(everything.is_empty());
        assert!(everything.is_unfiltered());
    }

    #[test]
    fn repeated_queries_are_deterministic() {
        let catalog = Catalog::builtin();
        let first = catalog.filter(Some(Category::Plants), None).ids();
        let second = catalog.filter(Some(Category::Plants), None).ids();
        assert_eq!(first, second);
    }
}
