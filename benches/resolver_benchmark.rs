use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hoopstats_engine::PlayerDirectory;

fn bench_resolve(c: &mut Criterion) {
    let directory = PlayerDirectory::known_players();

    c.bench_function("resolve_exact", |b| {
        b.iter(|| black_box(directory.resolve("Joel Embiid").unwrap()));
    });

    c.bench_function("resolve_substring", |b| {
        b.iter(|| black_box(directory.resolve("wembanyama").unwrap()));
    });

    c.bench_function("resolve_not_found_with_suggestions", |b| {
        b.iter(|| black_box(directory.resolve("Stephan Cury").is_err()));
    });
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
