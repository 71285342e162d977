//! Criterion benchmarks for rust_database_layer

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_database_layer::grammar::{
    GenericQueryGrammar, GenericSchemaGrammar, Grammar, MysqlQueryGrammar, MysqlSchemaGrammar,
};
use rust_database_layer::prelude::*;

// ============================================================================
// Query Compilation Benchmarks
// ============================================================================

fn select_query() -> Query<'static> {
    Query::new()
        .table("users u")
        .select("u.id, u.name AS name, p.title")
        .left_join("posts p", "p.user_id", "=", "u.id")
        .r#where("u.active", "=", true)
        .or_where("u.role", "=", "admin")
        .where_in("u.id", [1, 2, 3, 4, 5])
        .group("u.id")
        .having("COUNT(p.id)", ">", 2)
        .order_desc("u.id")
        .limit(20)
        .offset(40)
}

fn bench_select_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_compilation");
    group.throughput(Throughput::Elements(1));

    let query = select_query();
    let statement = query.to_select();

    group.bench_function("generic", |b| {
        b.iter(|| black_box(GenericQueryGrammar.compile(black_box(&statement))));
    });

    group.bench_function("mysql", |b| {
        b.iter(|| black_box(MysqlQueryGrammar.compile(black_box(&statement))));
    });

    group.bench_function("parameters", |b| {
        b.iter(|| black_box(statement.parameters()));
    });

    group.finish();
}

fn bench_builder(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder");

    group.bench_function("select_chain", |b| {
        b.iter(|| black_box(select_query()));
    });

    group.finish();
}

// ============================================================================
// Insert Compilation Benchmarks
// ============================================================================

fn bench_insert_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_compilation");

    for rows in [1usize, 10, 100, 1000].iter() {
        let mut query = Query::new().table("events").select("kind,payload,created");
        for i in 0..*rows {
            query = query.row(values([
                DatabaseValue::from("click"),
                DatabaseValue::from(format!("payload {}", i)),
                DatabaseValue::from(i as i64),
            ]));
        }

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &query, |b, query| {
            b.iter(|| black_box(GenericQueryGrammar.compile(&query.to_insert())));
        });
    }

    group.finish();
}

// ============================================================================
// Schema Compilation Benchmarks
// ============================================================================

fn bench_schema_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_compilation");

    let mut blueprint = Blueprint::new("accounts");
    blueprint.big_integer("id").unsigned().incremented();
    blueprint.string("email", 255);
    blueprint.decimal("balance", 12, 2).default(0);
    blueprint.boolean("active").default(true);
    blueprint.date_time("created_at").nullable();
    blueprint.primary("id");
    blueprint.unique("email");
    blueprint.foreign("id", "users", "id", "CASCADE", "CASCADE");

    group.bench_function("create_generic", |b| {
        b.iter(|| black_box(GenericSchemaGrammar.compile(black_box(&blueprint.to_create()))));
    });

    group.bench_function("create_mysql", |b| {
        b.iter(|| black_box(MysqlSchemaGrammar.compile(black_box(&blueprint.to_create()))));
    });

    let mut alter = Blueprint::new("accounts");
    alter.drop_unique("email_uq");
    alter.drop_column("legacy");
    alter.modify(|t| {
        t.string("email", 320);
    });
    alter.index("created_at");

    group.bench_function("alter_generic", |b| {
        b.iter(|| black_box(GenericSchemaGrammar.compile(black_box(&alter.to_alter()))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_select_compilation,
    bench_builder,
    bench_insert_compilation,
    bench_schema_compilation
);

criterion_main!(benches);
