use std::{
    borrow::Borrow,
    collections::{HashMap, HashSet},
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{CatalogFilter, FilteredCatalog};

pub const BUILTIN_CATALOG: &str = include_str!("data/catalog.json");

/// Number of items shown on the home page "new arrivals" shelf.
pub const NEW_ARRIVALS_LEN: usize = 4;
/// Catalog positions shown on the home page "best sellers" shelf.
pub const BEST_SELLERS_RANGE: std::ops::Range<usize> = 2..6;

/// Stable identifier of a catalog item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a variant, unique within its owning item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(pub String);

impl VariantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for VariantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Plants,
    Seeds,
    Pots,
    Care,
    Gifting,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Plants,
        Category::Seeds,
        Category::Pots,
        Category::Care,
        Category::Gifting,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Plants => "Plants",
            Category::Seeds => "Seeds",
            Category::Pots => "Pots",
            Category::Care => "Care",
            Category::Gifting => "Gifting",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowthStage {
    Seedling,
    Growing,
    Mature,
}

impl GrowthStage {
    pub const ALL: [GrowthStage; 3] = [
        GrowthStage::Seedling,
        GrowthStage::Growing,
        GrowthStage::Mature,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GrowthStage::Seedling => "Seedling",
            GrowthStage::Growing => "Growing",
            GrowthStage::Mature => "Mature",
        }
    }
}

impl fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Excellent,
    Healthy,
    #[serde(rename = "Needs Care")]
    NeedsCare,
}

impl HealthStatus {
    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Healthy => "Healthy",
            HealthStatus::NeedsCare => "Needs Care",
        }
    }
}

/// A single point of an item's valuation history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueSample {
    pub date: NaiveDate,
    pub value: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CareProfile {
    pub water_frequency: String,
    pub sunlight_needs: String,
    pub soil_type: String,
    pub humidity_level: String,
}

/// A physically distinct, individually trackable unit of a catalog item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub sku: String,
    pub image: String,
    pub height_cm: u32,
    pub current_value: u32,
    pub health: HealthStatus,
    #[serde(default)]
    pub traits: Vec<String>,
    /// Compatibility score in `0..=100`.
    pub matches: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    pub image: String,
    pub category: Category,
    pub stage: GrowthStage,
    pub health: HealthStatus,
    pub planted_date: NaiveDate,
    pub height_cm: u32,
    pub max_height_cm: u32,
    pub growth_percentage: u8,
    pub purchase_price: u32,
    pub current_value: u32,
    pub expected_value_30_days: u32,
    #[serde(default)]
    pub value_history: Vec<ValueSample>,
    pub care: CareProfile,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl CatalogItem {
    pub fn variant(&self, id: &str) -> Option<&Variant> {
        self.variants.iter().find(|variant| variant.id.as_str() == id)
    }

    pub fn first_variant(&self) -> Option<&Variant> {
        self.variants.first()
    }

    /// Return on the purchase price in percent; zero when the item was free.
    pub fn roi_percent(&self) -> f64 {
        if self.purchase_price == 0 {
            return 0.0;
        }
        (self.current_value as f64 - self.purchase_price as f64) / self.purchase_price as f64
            * 100.0
    }

    /// Whole days between planting and `today`, floored at zero.
    pub fn age_days(&self, today: NaiveDate) -> i64 {
        (today - self.planted_date).num_days().max(0)
    }
}

/// Error raised while loading or validating catalog data.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read catalog from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("catalog item {0} is listed more than once")]
    DuplicateItem(ItemId),
    #[error("variant {variant} is listed more than once on item {item}")]
    DuplicateVariant { item: ItemId, variant: VariantId },
    #[error("variant {variant} on item {item} has match score {value} outside 0..=100")]
    MatchOutOfRange {
        item: ItemId,
        variant: VariantId,
        value: u8,
    },
    #[error("item {item} has growth percentage {value} outside 0..=100")]
    GrowthOutOfRange { item: ItemId, value: u8 },
    #[error("value history of item {0} is not in chronological order")]
    HistoryOutOfOrder(ItemId),
}

/// Immutable, ordered store of catalog items with an id index.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<ItemId, usize>,
}

impl Catalog {
    pub fn builtin() -> Arc<Self> {
        Arc::new(Self::from_json_str(BUILTIN_CATALOG).expect("builtin catalog should parse"))
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<CatalogItem> = serde_json::from_str(json)?;
        Self::from_items(items)
    }

    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn from_items(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            validate_item(item)?;
            if index.insert(item.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateItem(item.id.clone()));
            }
        }
        Ok(Self { items, index })
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Catalog position of `id`, used to order derived sequences.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn filter(
        &self,
        category: Option<Category>,
        stage: Option<GrowthStage>,
    ) -> FilteredCatalog<'_> {
        CatalogFilter { category, stage }.apply(self)
    }

    pub fn new_arrivals(&self) -> &[CatalogItem] {
        &self.items[..NEW_ARRIVALS_LEN.min(self.items.len())]
    }

    pub fn best_sellers(&self) -> &[CatalogItem] {
        let end = BEST_SELLERS_RANGE.end.min(self.items.len());
        let start = BEST_SELLERS_RANGE.start.min(end);
        &self.items[start..end]
    }
}

fn validate_item(item: &CatalogItem) -> Result<(), CatalogError> {
    if item.growth_percentage > 100 {
        return Err(CatalogError::GrowthOutOfRange {
            item: item.id.clone(),
            value: item.growth_percentage,
        });
    }

    if item
        .value_history
        .windows(2)
        .any(|pair| pair[1].date < pair[0].date)
    {
        return Err(CatalogError::HistoryOutOfOrder(item.id.clone()));
    }

    let mut seen = HashSet::with_capacity(item.variants.len());
    for variant in &item.variants {
        if variant.matches > 100 {
            return Err(CatalogError::MatchOutOfRange {
                item: item.id.clone(),
                variant: variant.id.clone(),
                value: variant.matches,
            });
        }
        if !seen.insert(variant.id.as_str()) {
            return Err(CatalogError::DuplicateVariant {
                item: item.id.clone(),
                variant: variant.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal item for unit tests; callers adjust the fields they care about.
    pub(crate) fn sample_item(id: &str, category: Category, stage: GrowthStage) -> CatalogItem {
        CatalogItem {
            id: ItemId::new(id),
            name: format!("Item {id}"),
            scientific_name: "Planta exempli".to_string(),
            description: String::new(),
            image: format!("images/{id}.jpg"),
            category,
            stage,
            health: HealthStatus::Healthy,
            planted_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
            height_cm: 10,
            max_height_cm: 40,
            growth_percentage: 25,
            purchase_price: 100,
            current_value: 100,
            expected_value_30_days: 110,
            value_history: Vec::new(),
            care: CareProfile {
                water_frequency: "Weekly".to_string(),
                sunlight_needs: "Bright".to_string(),
                soil_type: "Loam".to_string(),
                humidity_level: "Medium".to_string(),
            },
            variants: Vec::new(),
        }
    }

    pub(crate) fn sample_variant(id: &str, matches: u8) -> Variant {
        Variant {
            id: VariantId::new(id),
            sku: format!("SKU-{id}"),
            image: format!("images/{id}.jpg"),
            height_cm: 12,
            current_value: 140,
            health: HealthStatus::Excellent,
            traits: vec!["New Leaf".to_string()],
            matches,
        }
    }

    #[test]
    fn builtin_catalog_loads_in_order() {
        let catalog = Catalog::builtin();
        assert!(!catalog.is_empty());
        let ids: Vec<&str> = catalog.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6", "7", "8"]);
        assert_eq!(catalog.position("3"), Some(2));
        assert!(catalog.get("1").is_some_and(|item| item.variants.len() == 3));
    }

    #[test]
    fn lookup_misses_unknown_id() {
        let catalog = Catalog::builtin();
        assert!(catalog.get("nonexistent-id").is_none());
        assert!(!catalog.contains("nonexistent-id"));
    }

    #[test]
    fn duplicate_item_ids_are_rejected() {
        let items = vec![
            sample_item("a", Category::Plants, GrowthStage::Seedling),
            sample_item("a", Category::Pots, GrowthStage::Mature),
        ];
        match Catalog::from_items(items) {
            Err(CatalogError::DuplicateItem(id)) => assert_eq!(id.as_str(), "a"),
            other => panic!("expected duplicate item error, got {other:?}"),
        }
    }

    #[test]
    fn variant_validation_catches_bad_scores_and_duplicates() {
        let mut item = sample_item("a", Category::Plants, GrowthStage::Seedling);
        item.variants = vec![sample_variant("v1", 101)];
        assert!(matches!(
            Catalog::from_items(vec![item.clone()]),
            Err(CatalogError::MatchOutOfRange { value: 101, .. })
        ));

        item.variants = vec![sample_variant("v1", 90), sample_variant("v1", 80)];
        assert!(matches!(
            Catalog::from_items(vec![item]),
            Err(CatalogError::DuplicateVariant { .. })
        ));
    }

    #[test]
    fn history_must_be_chronological() {
        let mut item = sample_item("a", Category::Plants, GrowthStage::Seedling);
        item.value_history = vec![
            ValueSample {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
                value: 120,
            },
            ValueSample {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
                value: 100,
            },
        ];
        assert!(matches!(
            Catalog::from_items(vec![item]),
            Err(CatalogError::HistoryOutOfOrder(_))
        ));
    }

    #[test]
    fn roi_and_age_are_derived_from_item_fields() {
        let mut item = sample_item("a", Category::Plants, GrowthStage::Seedling);
        item.purchase_price = 200;
        item.current_value = 250;
        assert!((item.roi_percent() - 25.0).abs() < f64::EPSILON);

        item.purchase_price = 0;
        assert_eq!(item.roi_percent(), 0.0);

        let today = NaiveDate::from_ymd_opt(2024, 1, 31).expect("valid date");
        assert_eq!(item.age_days(today), 30);
        let before_planting = NaiveDate::from_ymd_opt(2023, 12, 1).expect("valid date");
        assert_eq!(item.age_days(before_planting), 0);
    }

    #[test]
    fn home_shelves_clamp_to_catalog_length() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.new_arrivals().len(), 4);
        let best: Vec<&str> = catalog
            .best_sellers()
            .iter()
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(best, vec!["3", "4", "5", "6"]);

        let small = Catalog::from_items(vec![
            sample_item("a", Category::Plants, GrowthStage::Seedling),
            sample_item("b", Category::Pots, GrowthStage::Mature),
        ])
        .expect("valid catalog");
        assert_eq!(small.new_arrivals().len(), 2);
        assert!(small.best_sellers().is_empty());
    }
}
