use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use storefront_catalog::{
    combinations, materialize_variant, PhysicalAttributes, ProductDetails, ProductOption,
    ProductOptionValue,
};
use storefront_core::{ProductOptionId, ProductOptionValueId, ProductRootId};

/// `axes` options with `values_per_axis` values each.
fn build_options(axes: usize, values_per_axis: usize) -> Vec<ProductOption> {
    let now = Utc::now();
    let mut next_value_id = 1;
    (0..axes)
        .map(|axis| {
            let option_id = ProductOptionId::new(axis as i64 + 1);
            let values = (0..values_per_axis)
                .map(|v| {
                    let value = ProductOptionValue {
                        id: ProductOptionValueId::new(next_value_id),
                        product_option_id: option_id,
                        value: format!("Value-{axis}-{v}"),
                        created_on: now,
                        updated_on: None,
                        archived_on: None,
                    };
                    next_value_id += 1;
                    value
                })
                .collect();
            ProductOption {
                id: option_id,
                name: format!("Axis{axis}"),
                product_root_id: ProductRootId::new(1),
                values,
                created_on: now,
                updated_on: None,
                archived_on: None,
            }
        })
        .collect()
}

fn template() -> ProductDetails {
    ProductDetails {
        name: "Bench".to_string(),
        subtitle: String::new(),
        description: String::new(),
        manufacturer: String::new(),
        brand: String::new(),
        upc: String::new(),
        quantity: 1,
        taxable: false,
        price: 10.0,
        on_sale: false,
        sale_price: 0.0,
        cost: 1.0,
        physical: PhysicalAttributes::default(),
        quantity_per_package: 1,
        available_on: Utc::now(),
    }
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("combination_generation");

    for (axes, per_axis) in [(1, 10), (2, 5), (3, 5), (4, 6)] {
        let options = build_options(axes, per_axis);
        let total = per_axis.pow(axes as u32);
        group.throughput(Throughput::Elements(total as u64));
        group.bench_with_input(
            BenchmarkId::new("suffix_and_summary", format!("{axes}x{per_axis}")),
            &options,
            |b, options| {
                b.iter(|| {
                    for combination in combinations(black_box(options)) {
                        black_box(combination.sku_suffix());
                        black_box(combination.summary());
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_materialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("variant_materialization");
    let template = template();

    for per_axis in [3, 6, 10] {
        let options = build_options(3, per_axis);
        group.throughput(Throughput::Elements((per_axis * per_axis * per_axis) as u64));
        group.bench_with_input(BenchmarkId::new("three_axes", per_axis), &options, |b, options| {
            b.iter(|| {
                let variants: Vec<_> = combinations(options)
                    .map(|c| materialize_variant(&template, ProductRootId::new(1), "bench", &c))
                    .collect();
                black_box(variants)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generation, bench_materialization);
criterion_main!(benches);
