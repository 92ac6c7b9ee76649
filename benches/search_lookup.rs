use criterion::{black_box, criterion_group, criterion_main, Criterion};
use doxy_search_index::{SearchIndex, parse_search_data, write_search_data};

const SHARD: &str = include_str!("../tests/fixtures/all_a.js");

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_all_a", |b| {
        b.iter(|| parse_search_data(black_box(SHARD)).unwrap())
    });
}

fn bench_write(c: &mut Criterion) {
    let entries = parse_search_data(SHARD).unwrap();
    c.bench_function("write_all_a", |b| {
        b.iter(|| write_search_data(black_box(&entries)))
    });
}

fn bench_search(c: &mut Criterion) {
    let index = SearchIndex::parse(SHARD).unwrap();

    c.bench_function("search_substring", |b| {
        b.iter(|| index.search(black_box("pool")))
    });
    c.bench_function("search_prefix", |b| {
        b.iter(|| index.search_prefix(black_box("max_"), 20))
    });
    c.bench_function("get_exact", |b| {
        b.iter(|| index.get(black_box("make_5fdev")))
    });
}

criterion_group!(benches, bench_parse, bench_write, bench_search);
criterion_main!(benches);
