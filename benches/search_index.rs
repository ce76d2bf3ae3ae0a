use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hugelist::data::datatable::{DataRow, DataValue};
use hugelist::data::field::Field;
use hugelist::search::{FieldScope, Query, SearchIndex};
use hugelist::source::Payload;
use hugelist::HugeList;

fn create_test_rows(rows: usize) -> Vec<DataRow> {
    let cities = [
        "Madrid", "Sevilla", "Málaga", "Bilbao", "Córdoba", "Zaragoza", "Valencia", "León",
    ];
    let names = ["José", "María", "Ángel", "Lucía", "Íñigo", "Pedro"];

    (0..rows)
        .map(|i| {
            DataRow::new(vec![
                DataValue::Integer(i as i64),
                DataValue::String(names[i % names.len()].to_string()),
                DataValue::String(cities[i % cities.len()].to_string()),
                DataValue::String(format!("{:02}/{:02}/20{:02}", i % 28 + 1, i % 12 + 1, i % 25)),
                DataValue::Float((i % 1000) as f64 * 1.5),
            ])
        })
        .collect()
}

fn fields() -> Vec<Field> {
    ["id", "nombre", "ciudad", "fecha", "saldo"]
        .into_iter()
        .map(Field::new)
        .collect()
}

fn benchmark_index_build(c: &mut Criterion) {
    let rows_10k = create_test_rows(10_000);
    let rows_100k = create_test_rows(100_000);

    let mut group = c.benchmark_group("index_build");
    group.sample_size(10);

    group.bench_function("10k_rows", |b| {
        b.iter(|| SearchIndex::build(black_box(&rows_10k)));
    });

    group.bench_function("100k_rows", |b| {
        b.iter(|| SearchIndex::build(black_box(&rows_100k)));
    });

    group.finish();
}

fn benchmark_queries(c: &mut Criterion) {
    let index = SearchIndex::build(&create_test_rows(100_000));
    let mut group = c.benchmark_group("query_100k");

    for (name, text) in [
        ("any_term", "jose malaga"),
        ("all_groups", "maria + sevilla"),
        ("all_in_field", "&ang"),
        ("date", "2010-03-05"),
    ] {
        let query = Query::parse(text).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                let matches = query.filter(black_box(&index), &FieldScope::All);
                black_box(matches.len())
            });
        });
    }

    let restricted = Query::parse("leon").unwrap();
    group.bench_function("restricted_field", |b| {
        b.iter(|| restricted.filter(black_box(&index), &FieldScope::Only(&[2])));
    });

    group.finish();
}

fn benchmark_grid_find_and_sort(c: &mut Criterion) {
    let mut grid = HugeList::default();
    grid.load(Payload::new(fields(), create_test_rows(100_000)));
    grid.ensure_index();

    let mut group = c.benchmark_group("grid_100k");
    group.sample_size(10);

    group.bench_function("find_then_reset", |b| {
        b.iter(|| {
            let found = grid.find(black_box("madrid"), &["ciudad"]);
            grid.find_reset();
            found
        });
    });

    group.bench_function("sort_two_keys", |b| {
        b.iter(|| {
            grid.set_order(black_box(&[3, -5]));
            grid.working_len()
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_index_build,
    benchmark_queries,
    benchmark_grid_find_and_sort
);
criterion_main!(benches);
