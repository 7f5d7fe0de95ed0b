use std::sync::Arc;

use common::{Money, OrderId, ProductId, UserId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{FulfillmentJob, LineItem, ProductSnapshot, ShippingInfo};
use fulfillment::{
    FulfillmentWorker, InMemoryEmailSender, SimulatedPaymentGateway, WorkerConfig,
};
use fulfillment::invoice::{invoice_document, render_invoice};
use store::{InMemoryCartStore, InMemoryDocumentStore, InMemoryOrderStore, OrderStore};

fn make_job(item_count: usize) -> FulfillmentJob {
    let items: Vec<LineItem> = (0..item_count)
        .map(|i| LineItem {
            product_id: ProductId::new(format!("prod-{i}")),
            quantity: 2,
            product: ProductSnapshot {
                name: format!("Product {i}"),
                price: Money::from_cents(1999),
                category: Some("benchmarks".to_string()),
            },
        })
        .collect();
    let total = items.iter().map(LineItem::line_total).sum();

    FulfillmentJob {
        order_id: OrderId::new(),
        user_id: UserId::new("bench-user"),
        total,
        items,
        shipping_info: ShippingInfo {
            name: "Bench User".to_string(),
            email: "bench@example.com".to_string(),
            address: "1 Bench Way".to_string(),
            city: "Benchville".to_string(),
            zip_code: "00001".to_string(),
        },
    }
}

fn make_worker(orders: Arc<InMemoryOrderStore>) -> FulfillmentWorker {
    let email = Arc::new(InMemoryEmailSender::new());
    email.verify_address("bench@example.com");
    FulfillmentWorker::new(
        orders,
        Arc::new(InMemoryCartStore::new()),
        Arc::new(InMemoryDocumentStore::new()),
        email,
        Arc::new(SimulatedPaymentGateway::new()),
        WorkerConfig {
            sender_email: Some("shop@cloudshop.example".to_string()),
        },
    )
}

fn bench_render_invoice(c: &mut Criterion) {
    let job = make_job(10);
    let now = chrono::Utc::now();

    c.bench_function("fulfillment/render_invoice_10_items", |b| {
        b.iter(|| render_invoice(&job, now));
    });
}

fn bench_invoice_document(c: &mut Criterion) {
    let job = make_job(10);
    let now = chrono::Utc::now();

    c.bench_function("fulfillment/invoice_document_10_items", |b| {
        b.iter(|| invoice_document(&job, now));
    });
}

fn bench_process_job_single_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let orders = Arc::new(InMemoryOrderStore::new());
    let worker = make_worker(orders.clone());
    let job = make_job(1);

    // Pre-seed the order so the status update succeeds
    rt.block_on(async {
        let order = seed_order(&job);
        orders.put(&order).await.unwrap();
    });

    c.bench_function("fulfillment/process_job_1_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                worker.process_job(&job).await.unwrap();
            });
        });
    });
}

fn bench_process_job_batch_items(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let orders = Arc::new(InMemoryOrderStore::new());
    let worker = make_worker(orders.clone());
    let job = make_job(25);

    rt.block_on(async {
        let order = seed_order(&job);
        orders.put(&order).await.unwrap();
    });

    c.bench_function("fulfillment/process_job_25_items", |b| {
        b.iter(|| {
            rt.block_on(async {
                worker.process_job(&job).await.unwrap();
            });
        });
    });
}

fn seed_order(job: &FulfillmentJob) -> domain::Order {
    domain::Order {
        order_id: job.order_id,
        user_id: job.user_id.clone(),
        items: job.items.clone(),
        total: job.total,
        status: domain::OrderStatus::Pending,
        created_at: chrono::Utc::now(),
        processed_at: None,
        shipping_info: job.shipping_info.clone(),
    }
}

criterion_group!(
    benches,
    bench_render_invoice,
    bench_invoice_document,
    bench_process_job_single_item,
    bench_process_job_batch_items,
);
criterion_main!(benches);
