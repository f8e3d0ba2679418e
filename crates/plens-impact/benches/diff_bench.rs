use std::time::Duration;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use plens_impact::{ImpactAnalyzer, diff_rules, structural_report};
use plens_policy::{Rule, extract_rules, load};

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(
        std::env::var(name)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(default_ms),
    )
}

fn benchmark_config() -> Criterion {
    Criterion::default()
        .sample_size(env_usize("PLENS_BENCH_SAMPLE_SIZE", 100))
        .warm_up_time(env_duration_ms("PLENS_BENCH_WARMUP_MS", 100))
        .measurement_time(env_duration_ms("PLENS_BENCH_MEASURE_MS", 500))
}

/// 生成含 `size` 条规则的配置；`widen` 之前的规则谓词改为 1=1
fn generate_policy(size: usize, widen: usize) -> String {
    let mut yaml = String::from("name: bench\nactions:\n  - rules:\n");
    for idx in 0..size {
        let predicate = if idx < widen {
            "1=1".to_string()
        } else {
            format!("Region in ('R{idx}', 'S{idx}')")
        };
        yaml.push_str(&format!(
            "      - type: Row Restriction by Custom Where Clause\n\
             \x20       inclusions:\n\
             \x20         groups: [team.g{idx}, team.shared]\n\
             \x20       config:\n\
             \x20         predicate: \"{predicate}\"\n"
        ));
    }
    yaml
}

fn rules_of(source: &str) -> Vec<Rule> {
    let config = load(source)
        .expect("bench policy should load")
        .or_empty_configuration();
    extract_rules(&config)
}

fn bench_diff_rules(c: &mut Criterion) {
    let sizes = [10usize, 100, 1_000];
    let mut group = c.benchmark_group("diff_rules");

    for size in sizes {
        let old = rules_of(&generate_policy(size, 0));
        let new = rules_of(&generate_policy(size, size / 4));
        group.bench_with_input(BenchmarkId::from_parameter(size), &(old, new), |b, (o, n)| {
            b.iter(|| diff_rules(black_box(o), black_box(n)));
        });
    }

    group.finish();
}

fn bench_structural_report(c: &mut Criterion) {
    let old = rules_of(&generate_policy(200, 0));
    let new = rules_of(&generate_policy(210, 50));

    c.bench_function("structural_report_200", move |b| {
        b.iter(|| black_box(structural_report(black_box(&old), black_box(&new))));
    });
}

fn bench_analyze_text(c: &mut Criterion) {
    let old = generate_policy(100, 0);
    let new = generate_policy(100, 10);
    let analyzer = ImpactAnalyzer::default();

    c.bench_function("analyze_text_100", move |b| {
        b.iter(|| {
            let report = analyzer
                .analyze(black_box(&old), black_box(&new))
                .expect("bench policy should analyze");
            black_box(report);
        });
    });
}

criterion_group! {
    name = benches;
    config = benchmark_config();
    targets =
        bench_diff_rules,
        bench_structural_report,
        bench_analyze_text
}
criterion_main!(benches);
