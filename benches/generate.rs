use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ebnf_fuzz::{FuzzyGenerator, Syntax};

const NUMBERS: &str = "syntax = 2 * digit, { '.', digit } ;
digit = '0' | '1' | '2' | '3' | '4' | '5' | '6' | '7' | '8' | '9' ;";

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse numbers grammar", |b| {
        b.iter(|| black_box(NUMBERS).parse::<Syntax>().unwrap())
    });
}

fn bench_generate(c: &mut Criterion) {
    let syntax: Syntax = NUMBERS.parse().unwrap();
    let generator = FuzzyGenerator::new();

    c.bench_function("generate numbers", |b| {
        b.iter(|| generator.generate(black_box(&syntax)).unwrap())
    });
}

criterion_group!(benches, bench_parse, bench_generate);
criterion_main!(benches);
