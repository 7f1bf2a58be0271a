mod common;

use anyhow::{Context, Result};
use storefront_core::{build_storefront, Category, View};

#[test]
fn fixture_config_loads_two_item_catalog() -> Result<()> {
    common::ensure_test_config();
    let store = build_storefront().context("storefront should build from fixtures")?;
    assert_eq!(store.catalog().len(), 2);
    assert!(store.owns("A"));
    assert_eq!(store.config().telemetry.seed, Some(20240601));
    Ok(())
}

#[test]
fn buy_and_sell_recompute_portfolio() -> Result<()> {
    common::ensure_test_config();
    let mut store = build_storefront()?;

    store.buy("B");
    let owned: Vec<String> = store.snapshot().owned.into_iter().map(|id| id.0).collect();
    assert_eq!(owned, vec!["A", "B"]);
    assert_eq!(store.portfolio_summary().total_value, 150);
    assert_eq!(store.navigation().view, View::Garden);

    store.sell("A");
    let summary = store.portfolio_summary();
    assert_eq!(summary.owned_count, 1);
    assert_eq!(summary.total_value, 50);
    assert_eq!(summary.total_invested, 40);
    assert!((summary.percent_gain - 25.0).abs() < 1e-9);
    assert!((summary.environmental_offset_kg - 1.5).abs() < 1e-9);
    Ok(())
}

#[test]
fn browsing_round_trip_through_detail() -> Result<()> {
    common::ensure_test_config();
    let mut store = build_storefront()?;

    store.navigate_to(View::Marketplace, Some(Category::Plants));
    let listed: Vec<String> = store.listing().ids().into_iter().map(|id| id.0).collect();
    assert_eq!(listed, vec!["A"]);

    assert!(store.view_item("B"));
    let detail = store.detail().context("detail view for B")?;
    assert!(!detail.owned);
    assert_eq!(detail.display_value(), 50);
    assert!((detail.roi_percent() - 25.0).abs() < 1e-9);

    assert!(store.back_to_collection());
    assert_eq!(store.navigation().active_category, Some(Category::Pots));
    assert!(store.telemetry().is_none());

    assert!(!store.view_item("nonexistent-id"));
    assert_eq!(store.screen().view(), View::Marketplace);
    Ok(())
}

#[test]
fn snapshots_stream_to_subscribers() -> Result<()> {
    common::ensure_test_config();
    let mut store = build_storefront()?;
    let receiver = store.subscribe();

    store.toggle_menu();
    store.navigate_to(View::Offers, None);
    store.view_packaging();

    let screens: Vec<View> = receiver.try_iter().map(|snapshot| snapshot.screen).collect();
    assert_eq!(
        screens,
        vec![View::Home, View::Home, View::Offers, View::Packaging]
    );

    let json = store.snapshot().to_json()?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["navigation"]["view"], "Packaging");
    assert_eq!(value["menu_open"], false);
    Ok(())
}
