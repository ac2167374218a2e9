use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use wpflow::analysis::ScanCache;
use wpflow::diagnostics::NoSuppressions;
use wpflow::{Engine, SourceFile};

/// One long handler with superglobal reads spread through it and the nonce
/// check near the end, so every read before it scans further into the scope.
fn create_handler(statements: usize) -> SourceFile {
    let mut body = String::new();
    for i in 0..statements {
        body.push_str(&format!(
            "    $value_{i} = sanitize_text_field( $_POST['field_{i}'] );\n    do_something( $value_{i}, {i} );\n"
        ));
        if i == statements * 9 / 10 {
            body.push_str("    check_admin_referer( 'save' );\n");
        }
    }
    let source = format!("<?php\nfunction handle_request() {{\n{body}}}\n");
    SourceFile::from_source("bench.php", &source).unwrap()
}

fn bench_engine_scope_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("nonce_scan");
    let engine = Engine::default();

    for statements in [100, 1_000, 5_000] {
        let file = create_handler(statements);
        group.bench_with_input(
            BenchmarkId::new("analyze_file", statements),
            &file,
            |b, file| b.iter(|| black_box(engine.analyze_file(file, &NoSuppressions))),
        );
    }

    group.finish();
}

fn bench_cache_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_cache_capacity");
    let engine = Engine::default();
    let file = create_handler(2_000);

    for capacity in [1, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let mut cache = ScanCache::new(capacity);
                black_box(engine.analyze_with_cache(&file, &NoSuppressions, &mut cache))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_engine_scope_sizes, bench_cache_capacity);
criterion_main!(benches);
