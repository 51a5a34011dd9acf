use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tablekit::WhereClause;

/// Build a clause with `n` ANDed predicates followed by an `n`-element IN-list:
/// WHERE (col0 = ? AND col1 = ? ...) AND id IN (?,?,...)
fn build_clause(n: usize) -> WhereClause {
    let mut wc = WhereClause::new();
    wc.add("(");
    for i in 0..n {
        if i > 0 {
            wc.add("and");
        }
        wc.add_value(format!("col{i} = ?"), i as i64);
    }
    wc.add(")").add("and");
    for i in 0..n {
        let text = if i == 0 { "id IN (?" } else { ",?" };
        wc.add_unpadded_value(text, i as i64);
    }
    wc.add(")");
    wc
}

fn bench_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("where_clause/text");

    for n in [1, 5, 10, 50, 100] {
        let wc = build_clause(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &wc, |b, wc| {
            b.iter(|| black_box(wc.text()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("where_clause/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let wc = build_clause(n);
                black_box((wc.text(), wc.question_mark_values()));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_text, bench_build_and_render);
criterion_main!(benches);
