//! Benchmarks for `{name}` placeholder substitution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use request_mold::template::{apply_variables, placeholders, substitute};
use std::collections::BTreeMap;

/// Generate a variable set with a specified number of entries.
fn generate_variables(num_vars: usize) -> BTreeMap<String, String> {
    let mut variables = BTreeMap::new();

    for i in 0..num_vars {
        variables.insert(format!("var_{}", i), format!("value_{}", i));
    }

    variables.insert("base_url".to_string(), "https://api.example.com".to_string());
    variables.insert("token".to_string(), "token_12345".to_string());
    variables.insert("user_id".to_string(), "user_123".to_string());

    variables
}

/// Generate a YAML mold with a specified number of placeholder references.
fn generate_mold(num_refs: usize) -> String {
    let mut mold = String::from("url: \"{base_url}/api/v1/users/{user_id}\"\nmethod: GET\n");
    mold.push_str("auth:\n  bearer_token: \"{token}\"\nheaders:\n");

    for i in 0..num_refs {
        mold.push_str(&format!("  X-Custom-{}: \"{{var_{}}}\"\n", i, i % 100));
    }

    mold
}

fn bench_substitute_single(c: &mut Criterion) {
    let text = "{base_url}/users/{user_id}?q={base_url}";

    c.bench_function("substitute_single", |b| {
        b.iter(|| substitute(black_box(text), black_box("base_url"), black_box("https://x")))
    });
}

fn bench_apply_large_profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_large_profile");
    let mold = generate_mold(10);

    for size in [10, 100, 500].iter() {
        let variables = generate_variables(*size);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_vars", size)),
            size,
            |b, _| b.iter(|| apply_variables(black_box(&mold), black_box(&variables))),
        );
    }

    group.finish();
}

fn bench_apply_many_references(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_many_references");
    let variables = generate_variables(100);

    for refs in [1, 10, 50, 100].iter() {
        let mold = generate_mold(*refs);
        group.throughput(Throughput::Bytes(mold.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(refs), refs, |b, _| {
            b.iter(|| apply_variables(black_box(&mold), black_box(&variables)))
        });
    }

    group.finish();
}

fn bench_placeholders(c: &mut Criterion) {
    let mold = generate_mold(50);

    c.bench_function("placeholders_scan", |b| {
        b.iter(|| placeholders(black_box(&mold)))
    });
}

criterion_group!(
    benches,
    bench_substitute_single,
    bench_apply_large_profile,
    bench_apply_many_references,
    bench_placeholders
);
criterion_main!(benches);
