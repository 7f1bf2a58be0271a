use std::sync::Arc;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use storefront_core::{
    Catalog, CatalogFilter, Category, GrowthStage, ItemId, Storefront, StorefrontConfig,
};

fn scaled_catalog(copies: usize) -> Catalog {
    let builtin = Catalog::builtin();
    let items = (0..copies)
        .flat_map(|copy| {
            builtin.iter().map(move |item| {
                let mut item = item.clone();
                item.id = ItemId::new(format!("{}-{copy}", item.id));
                item
            })
        })
        .collect();
    Catalog::from_items(items).expect("scaled catalog should validate")
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_filter");
    let filter = CatalogFilter::new(Some(Category::Plants), Some(GrowthStage::Mature));

    for copies in [1usize, 16, 128, 1024] {
        let catalog = scaled_catalog(copies);
        group.bench_with_input(
            BenchmarkId::new("plants_mature", catalog.len()),
            &catalog,
            |b, catalog| b.iter(|| filter.apply(catalog).len()),
        );
    }

    group.finish();
}

fn bench_telemetry(c: &mut Criterion) {
    let mut group = c.benchmark_group("telemetry_advance");
    let mut config = StorefrontConfig::default();
    config.telemetry.seed = Some(42);
    let config = Arc::new(config);

    for minutes in [1u64, 10, 60] {
        group.bench_with_input(BenchmarkId::new("minutes", minutes), &minutes, |b, &minutes| {
            b.iter_batched(
                || {
                    let mut store = Storefront::new(Catalog::builtin(), Arc::clone(&config));
                    store.view_item("1");
                    store
                },
                |mut store| store.advance(Duration::from_secs(minutes * 60)),
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(storefront_benches, bench_filter, bench_telemetry);
criterion_main!(storefront_benches);
