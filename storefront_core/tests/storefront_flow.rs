use std::sync::Arc;

use serde_json::json;
use storefront_core::{
    Catalog, Category, GrowthStage, ItemId, Storefront, StorefrontConfig, View,
};

fn item(id: &str, category: &str, stage: &str, purchase: u32, value: u32) -> serde_json::Value {
    json!({
        "id": id,
        "name": format!("Item {id}"),
        "scientific_name": "Planta exempli",
        "description": "",
        "image": format!("images/{id}.jpg"),
        "category": category,
        "stage": stage,
        "health": "Healthy",
        "planted_date": "2024-03-01",
        "height_cm": 20,
        "max_height_cm": 60,
        "growth_percentage": 33,
        "purchase_price": purchase,
        "current_value": value,
        "expected_value_30_days": value,
        "care": {
            "water_frequency": "Weekly",
            "sunlight_needs": "Bright indirect",
            "soil_type": "Loam",
            "humidity_level": "Medium"
        }
    })
}

fn two_item_storefront() -> Storefront {
    let catalog = json!([
        item("A", "Plants", "Seedling", 80, 100),
        item("B", "Pots", "Mature", 40, 50),
    ]);
    let catalog =
        Catalog::from_json_str(&catalog.to_string()).expect("two-item catalog should load");

    let mut config = StorefrontConfig::default();
    config.portfolio.default_owned = vec![ItemId::new("A")];
    config.telemetry.seed = Some(3);
    Storefront::new(Arc::new(catalog), Arc::new(config))
}

#[test]
fn buy_then_sell_recomputes_summary() {
    let mut store = two_item_storefront();
    assert_eq!(store.portfolio_summary().total_value, 100);

    store.buy("B");
    let owned: Vec<&str> = store.owned_items().iter().map(|item| item.id.as_str()).collect();
    assert_eq!(owned, vec!["A", "B"]);
    assert_eq!(store.portfolio_summary().total_value, 150);

    store.sell("A");
    let summary = store.portfolio_summary();
    let owned: Vec<&str> = store.owned_items().iter().map(|item| item.id.as_str()).collect();
    assert_eq!(owned, vec!["B"]);
    assert_eq!(summary.total_value, 50);
    assert_eq!(summary.total_invested, 40);
    assert_eq!(summary.absolute_gain, 10);
    assert!((summary.percent_gain - 25.0).abs() < f64::EPSILON);
}

#[test]
fn repeat_purchase_is_idempotent() {
    let mut store = two_item_storefront();
    store.buy("B");
    let once = store.portfolio_summary();
    store.buy("B");
    assert_eq!(store.portfolio_summary(), once);
    assert_eq!(once.owned_count, 2);
}

#[test]
fn selling_everything_zeroes_summary() {
    let mut store = two_item_storefront();
    store.sell("A");
    store.sell("A");
    let summary = store.portfolio_summary();
    assert_eq!(summary.owned_count, 0);
    assert_eq!(summary.total_value, 0);
    assert_eq!(summary.total_invested, 0);
    assert_eq!(summary.percent_gain, 0.0);
    assert_eq!(summary.environmental_offset_kg, 0.0);
}

#[test]
fn back_navigation_uses_category_of_item_left() {
    let mut store = two_item_storefront();
    store.navigate_to(View::Marketplace, Some(Category::Plants));
    store.view_item("B");
    assert_eq!(store.navigation().view, View::Detail);

    assert!(store.back_to_collection());
    assert_eq!(store.navigation().view, View::Marketplace);
    assert_eq!(store.navigation().active_category, Some(Category::Pots));
    let listed: Vec<String> = store.listing().ids().into_iter().map(|id| id.0).collect();
    assert_eq!(listed, vec!["B"]);
}

#[test]
fn unknown_detail_id_resolves_to_marketplace() {
    let mut store = two_item_storefront();
    assert!(!store.view_item("nonexistent-id"));
    assert_eq!(store.screen().view(), View::Marketplace);
    assert!(store.telemetry().is_none());
    assert!(store.navigation().selected_item.is_none());
}

#[test]
fn every_navigation_closes_menu_and_resets_scroll() {
    let mut store = two_item_storefront();
    for view in View::ALL {
        store.toggle_menu();
        assert!(store.menu_open());
        let before = store.scroll_resets();
        store.navigate_to(view, None);
        assert!(!store.menu_open());
        assert_eq!(store.scroll_resets(), before + 1);
    }
}

#[test]
fn empty_filter_result_is_distinct_from_unfiltered() {
    let mut store = two_item_storefront();
    store.navigate_to(View::Marketplace, Some(Category::Seeds));
    let listing = store.listing();
    assert!(listing.is_empty());
    assert!(!listing.is_unfiltered());

    store.set_category_filter(None);
    store.set_stage_filter(Some(GrowthStage::Mature));
    let listed: Vec<String> = store.listing().ids().into_iter().map(|id| id.0).collect();
    assert_eq!(listed, vec!["B"]);
}

#[test]
fn snapshot_serializes_for_renderers() {
    let mut store = two_item_storefront();
    store.navigate_to(View::Marketplace, Some(Category::Plants));
    let value: serde_json::Value =
        serde_json::from_str(&store.snapshot().to_json().expect("snapshot serializes"))
            .expect("snapshot is valid json");
    assert_eq!(value["screen"], "Marketplace");
    assert_eq!(value["listing"]["items"], json!(["A"]));
    assert_eq!(value["owned"], json!(["A"]));
    assert!(value.get("telemetry").is_none());
}

#[test]
fn fixture_config_loads_from_another_directory() {
    let config_path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("integration_tests")
        .join("tests")
        .join("fixtures")
        .join("test_storefront_config.json");
    let config = StorefrontConfig::from_file(&config_path).expect("fixture config loads");
    let store = Storefront::from_config(Arc::new(config)).expect("fixture catalog resolves");
    assert_eq!(store.catalog().len(), 2);
    assert!(store.owns("A"));
}
