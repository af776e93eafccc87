//! cargo bench --bench analyze
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use regexlint::{
    analysis::{
        is_covered_node, is_equal_nodes,
        reach::{first_char_after, Direction},
        CoverOptions, Normalizer,
    },
    rules::Linter,
    syntax::parse_literal,
};

pub fn criterion_benchmark(c: &mut Criterion) {
    let literal = r"/^(?:[a-z0-9._%+-]+)@(?:[a-z0-9-]+\.)+[a-z]{2,}$|^\d{3}-\d{4}$|^(?<year>\d{4})-\k<year>$/iu";

    c.bench_function("parse", |b| b.iter(|| parse_literal(black_box(literal)).unwrap()));

    {
        let ast = parse_literal(literal).unwrap();
        c.bench_function("equal_self", |b| {
            b.iter(|| is_equal_nodes(black_box(ast.root()), ast.root(), ast.flags(), None))
        });
    }

    {
        let wide = parse_literal("/[a-z]+(?:-[a-z]+)*@[a-z]+/").unwrap();
        let narrow = parse_literal("/foo(?:-bar)?-baz@(?:example|test)/").unwrap();
        c.bench_function("cover", |b| {
            b.iter(|| {
                // Fresh normalizer, so the canonical forms are rebuilt every time
                let normalizer = Normalizer::new(wide.flags());
                is_covered_node(&normalizer, wide.root(), narrow.root(), CoverOptions::default())
            })
        });

        let left = parse_literal(&format!("/{}b/", "a?".repeat(20))).unwrap();
        let right = parse_literal(&format!("/{}c/", "a?".repeat(20))).unwrap();
        c.bench_function("cover_budget", |b| {
            b.iter(|| {
                let normalizer = Normalizer::new(left.flags());
                is_covered_node(&normalizer, left.root(), right.root(), CoverOptions::default())
            })
        });
    }

    {
        let ast = parse_literal(r"/(?:ab|c?d)+\b(?=x|y)(?:e|f)*g/").unwrap();
        let b_node = ast
            .walk()
            .into_iter()
            .find(|n| n.raw() == r"\b")
            .unwrap();
        c.bench_function("first_char_after", |b| {
            b.iter(|| {
                (
                    first_char_after(black_box(b_node), Direction::Ltr, ast.flags()),
                    first_char_after(b_node, Direction::Rtl, ast.flags()),
                )
            })
        });
    }

    {
        let linter = Linter::all();
        c.bench_function("lint", |b| b.iter(|| linter.lint(black_box(literal)).unwrap()));
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
