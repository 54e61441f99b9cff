//! Config resolution and payload building benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meshproxy::config::MeshConfig;
use meshproxy::services::payload::*;
use meshproxy::services::router::normalize_path;
use meshproxy::utils::logging::redact_sensitive;
use meshproxy::RawSecret;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Create a fully populated secret
fn create_test_secret() -> RawSecret {
    json!({
        "MESH_BASE_URL": "https://integration-api.example.com",
        "MESH_API_KEY": "test_key",
        "MESH_CLIENT_ID": "client-1",
        "MESH_CUSTOMER_ID": "cust-1",
        "MESH_DEFAULT_USER_ID": "user-1",
        "MESH_COINBASE_INTEGRATION_ID": "int-1",
        "MESH_ETHEREUM_NETWORK_ID": "net-1",
        "MESH_PAY_TO_ADDRESS": "0xpay",
        "MESH_TRANSFER_PATH": "https://transfers.example.com/execute",
    })
    .as_object()
    .cloned()
    .unwrap_or_default()
}

fn create_body(value: Value) -> Payload {
    value.as_object().cloned().unwrap_or_default()
}

fn bench_config_resolution(c: &mut Criterion) {
    let secret = create_test_secret();

    c.bench_function("resolve_config", |b| {
        b.iter(|| MeshConfig::resolve(black_box(&secret)))
    });
}

fn bench_payload_builders(c: &mut Criterion) {
    let config = MeshConfig::resolve(&create_test_secret()).unwrap();
    let empty = Payload::new();
    let pay = create_body(json!({"amount": 25, "symbol": "USDC", "transactionId": "tx-1"}));
    let legacy = create_body(json!({"accessToken": "tok", "amount": 10}));
    let query = HashMap::new();

    let mut group = c.benchmark_group("payload_builders");

    group.bench_function("link_token", |b| {
        b.iter(|| build_link_token_payload(black_box(&empty), black_box(&config)))
    });

    group.bench_function("pay_link_token", |b| {
        b.iter(|| build_pay_link_token_payload(black_box(&pay), black_box(&config)))
    });

    group.bench_function("legacy_transfer", |b| {
        b.iter(|| build_transfer_payload(black_box(&legacy), black_box(&config)))
    });

    group.bench_function("portfolio", |b| {
        b.iter(|| build_portfolio_payload(black_box(&empty), "tok", black_box(&query)))
    });

    group.finish();
}

fn bench_body_sizes(c: &mut Criterion) {
    let config = MeshConfig::resolve(&create_test_secret()).unwrap();
    let mut group = c.benchmark_group("body_sizes");

    for size in [1, 10, 100, 1000].iter() {
        let mut body = Payload::new();
        for i in 0..*size {
            body.insert(format!("field{}", i), json!(format!("value{}", i)));
        }

        group.bench_with_input(BenchmarkId::new("link_token", size), size, |b, _| {
            b.iter(|| build_link_token_payload(black_box(&body), black_box(&config)))
        });
    }

    group.finish();
}

fn bench_redaction(c: &mut Criterion) {
    let payload = json!({
        "accessToken": "tok",
        "fromAuthToken": "tok",
        "mfaCode": "123456",
        "transferOptions": {
            "toAddresses": [{"networkId": "net-1", "symbol": "USDC", "address": "0xpay"}],
            "amountInFiat": 25,
        },
    });

    c.bench_function("redact_payload", |b| b.iter(|| redact_sensitive(black_box(&payload))));
}

fn bench_path_normalization(c: &mut Criterion) {
    c.bench_function("normalize_path", |b| {
        b.iter(|| normalize_path(black_box("/prod/mesh/link-token/pay/"), black_box(Some("prod"))))
    });
}

criterion_group!(
    benches,
    bench_config_resolution,
    bench_payload_builders,
    bench_body_sizes,
    bench_redaction,
    bench_path_normalization
);

criterion_main!(benches);
