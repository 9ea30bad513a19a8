use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use chrono::Utc;
use storefront_auth::{Role, User};
use storefront_catalog::{Category, Product};
use storefront_core::{CategoryId, ProductId, UserId};
use storefront_infra::InMemoryStore;
use storefront_sales::OrderWorkflow;

fn seeded(stock: i64) -> (tokio::runtime::Runtime, Arc<InMemoryStore>, UserId, ProductId) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build runtime");

    let store = Arc::new(InMemoryStore::new());
    let (user_id, product_id) = rt.block_on(async {
        let user = User::new(
            UserId::new(),
            "bench",
            "bench@example.com",
            Role::Customer,
            "$argon2id$v=19$m=19456,t=2,p=1$c3R1YnNhbHQ$c3R1Ymhhc2g",
            Utc::now(),
        )
        .unwrap();
        let user_id = user.id;
        store.insert_user(user).await.unwrap();

        let category = Category::new(CategoryId::new(), "Bench", None).unwrap();
        let category_id = category.id;
        store.insert_category(category).await.unwrap();

        let product = Product::new(
            ProductId::new(),
            "Bench Widget",
            "benchmark product",
            "10.00".parse().unwrap(),
            stock,
            category_id,
            Utc::now(),
        )
        .unwrap();
        let product_id = product.id;
        store.insert_product(product).await.unwrap();
        (user_id, product_id)
    });

    (rt, store, user_id, product_id)
}

fn bench_reduce_stock(c: &mut Criterion) {
    let (rt, store, _, product_id) = seeded(i64::MAX / 2);
    let workflow = OrderWorkflow::new(store);

    let mut group = c.benchmark_group("reduce_stock");
    group.throughput(Throughput::Elements(1));
    group.bench_function("single_unit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let applied = workflow
                    .reduce_stock(black_box(product_id), black_box(1))
                    .await
                    .unwrap();
                assert!(applied);
            })
        })
    });
    group.finish();
}

fn bench_place_order_contended(c: &mut Criterion) {
    let (rt, store, user_id, product_id) = seeded(i64::MAX / 2);
    let workflow = OrderWorkflow::new(store);

    let mut group = c.benchmark_group("place_order");
    group.throughput(Throughput::Elements(8));
    group.bench_function("eight_way_contention", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut handles = Vec::new();
                for _ in 0..8 {
                    let workflow = workflow.clone();
                    handles.push(tokio::spawn(async move {
                        workflow.place_order(user_id, product_id, 1).await
                    }));
                }
                for handle in handles {
                    handle.await.unwrap().unwrap();
                }
            })
        })
    });
    group.finish();
}

criterion_group!(benches, bench_reduce_stock, bench_place_order_contended);
criterion_main!(benches);
