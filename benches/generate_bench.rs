//! Benchmarks for dataset generation and rendering.
//!
//! Tests:
//! - Full dataset assembly for a three-level schema at several root sizes
//! - INSERT rendering of a generated dataset

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sql_seeder::config::{parse_foreign_map, GenerateConfig};
use sql_seeder::generate::seeded_assembler;
use sql_seeder::schema::{parse_tables, RelationshipGraph};
use sql_seeder::writer::{sql, Dialect};
use std::hint::black_box;

const SCHEMA: &str = r#"
CREATE TABLE customers (id INT PRIMARY KEY, email VARCHAR(60), name VARCHAR(40), joined DATE);
CREATE TABLE orders (order_id BIGINT PRIMARY KEY, customer_id INT, placed TIMESTAMP, total DECIMAL(10,2));
CREATE TABLE order_items (order_ref BIGINT, line_no SMALLINT, sku CHAR(8), note TEXT, PRIMARY KEY (order_ref, line_no));
"#;

fn setup(num_rows: usize) -> (GenerateConfig, RelationshipGraph) {
    let config = GenerateConfig {
        key_fields: vec!["id".to_string()],
        num_rows,
        multipliers: vec![("orders".to_string(), 3), ("order_items".to_string(), 2)],
        foreign_map: parse_foreign_map("customer_id=id,order_ref=order_id").unwrap(),
        ..Default::default()
    };
    let graph = RelationshipGraph::build(
        parse_tables(SCHEMA).unwrap(),
        &config.key_fields,
        &config.foreign_map,
    )
    .unwrap();
    (config, graph)
}

/// Benchmark dataset assembly with varying root row counts
fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");

    for num_rows in [10usize, 100, 1_000] {
        let (config, graph) = setup(num_rows);
        // customers + 3 orders + 6 items per customer
        group.throughput(Throughput::Elements((num_rows * 10) as u64));
        group.bench_with_input(
            BenchmarkId::new("rows", num_rows),
            &num_rows,
            |b, _| {
                b.iter(|| {
                    let dataset = seeded_assembler(&config, 42).assemble(&graph).unwrap();
                    black_box(dataset.total_rows())
                })
            },
        );
    }

    group.finish();
}

/// Benchmark INSERT rendering
fn bench_render_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_sql");
    let (config, graph) = setup(500);
    let dataset = seeded_assembler(&config, 42).assemble(&graph).unwrap();
    group.throughput(Throughput::Elements(dataset.total_rows() as u64));

    for dialect in [Dialect::MySql, Dialect::Postgres] {
        group.bench_function(dialect.to_string(), |b| {
            b.iter(|| {
                let mut out = Vec::with_capacity(1024 * 1024);
                sql::write_dataset(&mut out, &dataset, dialect).unwrap();
                black_box(out.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_assemble, bench_render_sql);
criterion_main!(benches);
