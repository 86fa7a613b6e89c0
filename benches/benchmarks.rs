use criterion::{black_box, criterion_group, criterion_main, Criterion};

const CALC: &str = include_str!("../tests/calc.grammar");

fn compile_bench(c: &mut Criterion) {
    c.bench_function("compile", |b| {
        b.iter(|| llgen::compile(black_box(CALC.as_bytes())).unwrap())
    });
}

fn recognize_bench(c: &mut Criterion) {
    let artifact = llgen::compile(CALC.as_bytes()).unwrap();
    let mut words = vec!["integer"];
    for _ in 0..1000 {
        words.extend_from_slice(&["*", "floating", "+", "integer"]);
    }
    c.bench_function("recognize", |b| {
        b.iter(|| llgen::recognize(&artifact, black_box(&words)).unwrap())
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = compile_bench, recognize_bench
}
criterion_main!(benches);
