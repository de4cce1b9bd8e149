//! Benchmarks for the generic and legacy virtual machines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use relic::bytecode::{assemble, disassemble_chunk, Chunk, Compiler, Vm};
use relic::legacy::{EngineVersion, LegacyCompiler, LegacyVm};
use relic::lexer::Scanner;
use relic::parser::Parser;

/// Parse source into an AST.
fn parse(source: &str) -> relic::ast::Program {
    let tokens = Scanner::new(source).scan_tokens().expect("lexer error");
    Parser::new(tokens)
        .parse()
        .into_result()
        .expect("parser error")
}

fn arithmetic_program(n: usize) -> String {
    let mut source = String::from("var acc = 1;\n");
    for i in 0..n {
        source.push_str(&format!(
            "acc = (acc * 3 + {}) / 4 + 1; {{ var t = acc > 10 && acc < 100000; }}\n",
            i % 50
        ));
    }
    source
}

fn legacy_program(n: usize) -> String {
    (0..n)
        .map(|i| format!("var v{} = ({} + 20) * 3 - -4 / 2;\n", i, i % 1000))
        .collect()
}

fn compile_generic(source: &str) -> Chunk {
    Compiler::new().compile(&parse(source)).expect("compile error")
}

fn execution_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("vm_execute");

    for n in [10, 100, 1000].iter() {
        let chunk = compile_generic(&arithmetic_program(*n));
        group.bench_with_input(BenchmarkId::new("generic", n), &chunk, |b, chunk| {
            b.iter(|| {
                let mut vm = Vm::new().with_output(std::io::sink());
                vm.interpret(black_box(chunk.clone())).expect("vm runtime error")
            })
        });

        let legacy = LegacyCompiler::new(EngineVersion::V5)
            .compile(&parse(&legacy_program(*n)))
            .expect("compile error");
        group.bench_with_input(BenchmarkId::new("legacy", n), &legacy, |b, chunk| {
            b.iter(|| {
                let mut vm = LegacyVm::new(EngineVersion::V5);
                vm.interpret(black_box(chunk.clone())).expect("vm runtime error")
            })
        });
    }

    group.finish();
}

fn compile_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    let program = parse(&arithmetic_program(500));
    group.bench_function("generic_500", |b| {
        b.iter(|| Compiler::new().compile(black_box(&program)).unwrap())
    });

    let program = parse(&legacy_program(500));
    group.bench_function("legacy_500", |b| {
        b.iter(|| {
            LegacyCompiler::new(EngineVersion::V5)
                .compile(black_box(&program))
                .unwrap()
        })
    });

    group.finish();
}

fn listing_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("listing");

    let chunk = compile_generic(&arithmetic_program(200));
    let listing = disassemble_chunk(&chunk, "bench");

    group.bench_function("disassemble_200", |b| {
        b.iter(|| disassemble_chunk(black_box(&chunk), "bench"))
    });
    group.bench_function("assemble_200", |b| {
        b.iter(|| assemble(black_box(&listing)).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    execution_benchmarks,
    compile_benchmarks,
    listing_benchmarks,
);

criterion_main!(benches);
