//! Dispatch throughput benchmark.
//!
//! Measures envelope serialization and the full dispatch path (lock + line
//! framing) using Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hass_dispatch::envelope::ServiceData;
use hass_dispatch::services::Light;
use hass_dispatch::transport::LineTransport;
use hass_dispatch::types::IdGenerator;
use hass_dispatch::{build, dispatch, CallContext, Connection, ServiceRequest};

fn service_data(keys: usize) -> ServiceData {
    (0..keys).fold(ServiceData::new(), |data, i| data.insert(format!("key_{}", i), i as u64))
}

fn bench_serialize(c: &mut Criterion) {
    let ids = IdGenerator::new();
    let key_counts: &[usize] = &[0, 1, 8, 64];

    let mut group = c.benchmark_group("serialize_envelope");
    for &keys in key_counts {
        let request = ServiceRequest::new(&ids, "light.kitchen")
            .with_domain("light")
            .with_service("turn_on")
            .with_service_data(service_data(keys));
        group.bench_with_input(BenchmarkId::from_parameter(keys), &request, |b, r| {
            b.iter(|| black_box(r).to_json().unwrap());
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let conn = Connection::new(LineTransport::new(tokio::io::sink()));
    let ctx = CallContext::new();

    c.bench_function("dispatch_sink", |b| {
        b.iter(|| {
            rt.block_on(async {
                let request = conn
                    .request("light.kitchen")
                    .with_domain("light")
                    .with_service("toggle");
                dispatch(black_box(&request), &conn, &ctx).await.unwrap()
            })
        });
    });

    let light = build::<Light>(&conn, &ctx);
    c.bench_function("builder_turn_on", |b| {
        b.iter(|| {
            rt.block_on(async {
                light
                    .turn_on("light.kitchen", Some(service_data(2)))
                    .await
                    .unwrap()
            })
        });
    });
}

criterion_group!(benches, bench_serialize, bench_dispatch);
criterion_main!(benches);
