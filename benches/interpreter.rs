use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mython::lexer::{Lexer, tokenize};
use mython::parser;

const WORKLOAD: &str = "tests/programs/counter_fields/program.my";

fn bench_pipeline(c: &mut Criterion) {
    let source = std::fs::read_to_string(WORKLOAD).expect("read workload");

    c.bench_function("frontend_tokenize", |b| {
        b.iter(|| {
            let tokens = tokenize(black_box(&source)).expect("tokenize");
            black_box(tokens);
        })
    });

    c.bench_function("frontend_tokenize_parse", |b| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(&source)).expect("lexer");
            let program = parser::parse_program(&mut lexer).expect("parse");
            black_box(program);
        })
    });

    c.bench_function("full_pipeline_run", |b| {
        b.iter(|| {
            let mut output = Vec::new();
            mython::interpreter::run(black_box(&source), &mut output).expect("run");
            black_box(output);
        })
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
