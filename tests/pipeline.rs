//! End-to-end checks across scanner, parser, all three engines and the
//! listing tools.

use pretty_assertions::assert_eq;

use relic::ast::printer::print_expr;
use relic::bytecode::{self, Chunk, Compiler, OpCode, Vm, VmConfig};
use relic::error::{CompileError, InterpreterError, ParseError, RelicError, VmError};
use relic::parser::MAX_NESTING;
use relic::legacy::{self, EngineVersion, LegacyCompiler, LegacyVm};
use relic::value::Value;
use relic::{evaluate, parse, parse_expression, run_with_output, ExecutionMode};

fn run(source: &str, mode: ExecutionMode) -> Result<String, RelicError> {
    let output = run_with_output(source, mode, Vec::new())?;
    Ok(String::from_utf8(output).unwrap())
}

/// Net stack effect of straight-line generic bytecode.
fn stack_effect(chunk: &Chunk) -> isize {
    let mut offset = 0;
    let mut depth = 0;
    while offset < chunk.code.len() {
        let op = chunk.read_op(offset).unwrap();
        depth += match op {
            OpCode::Constant | OpCode::Nil | OpCode::True | OpCode::False => 1,
            OpCode::GetGlobal | OpCode::GetLocal => 1,
            OpCode::Pop | OpCode::DefineGlobal | OpCode::Print => -1,
            OpCode::SetGlobal | OpCode::SetLocal | OpCode::Not | OpCode::Negate => 0,
            OpCode::Equal
            | OpCode::NotEqual
            | OpCode::Less
            | OpCode::LessEqual
            | OpCode::Greater
            | OpCode::GreaterEqual
            | OpCode::Add
            | OpCode::Subtract
            | OpCode::Multiply
            | OpCode::Divide => -1,
            other => panic!("{} is not straight-line", other),
        };
        offset += 1 + op.operand_len();
    }
    depth
}

#[test]
fn precedence_shapes_the_tree() {
    let expr = parse_expression("1 + 2 * 3").unwrap();
    assert_eq!(print_expr(&expr), "(+ 1 (* 2 3))");
}

#[test]
fn unary_and_grouping_evaluate_in_every_engine() {
    for mode in [ExecutionMode::TreeWalk, ExecutionMode::Bytecode, ExecutionMode::Legacy] {
        assert_eq!(evaluate("(-1 + 2) * 3 - -4", mode).unwrap(), Value::Int(7), "{:?}", mode);
    }
}

#[test]
fn division_by_zero_reports_the_operator_line() {
    let err = evaluate("10 /\n0", ExecutionMode::TreeWalk).unwrap_err();
    assert!(matches!(
        err,
        RelicError::Interpreter(InterpreterError::DivisionByZero(span)) if span.line == 1
    ));

    let err = evaluate("10 /\n0", ExecutionMode::Bytecode).unwrap_err();
    assert!(matches!(err, RelicError::Vm(VmError::DivisionByZero { line: 1 })));

    let err = evaluate("10 / 0", ExecutionMode::Legacy).unwrap_err();
    assert!(matches!(err, RelicError::Vm(VmError::DivisionByZero { .. })));
}

#[test]
fn generic_statement_layout() {
    let chunk = relic::compile("10 + 20;").unwrap();
    assert_eq!(
        chunk.code,
        vec![
            OpCode::Constant as u8,
            0,
            OpCode::Constant as u8,
            1,
            OpCode::Add as u8,
            OpCode::Pop as u8,
        ]
    );
    assert_eq!(chunk.constants, vec![Value::Int(10), Value::Int(20)]);
}

#[test]
fn legacy_expression_layout() {
    let expr = parse_expression("10 + 20").unwrap();
    let chunk = LegacyCompiler::new(EngineVersion::V5)
        .compile_expression(&expr, 3)
        .unwrap();
    assert_eq!(
        chunk.code,
        vec![0xAC, 0x03, 0x00, 0x01, 0x0A, 0x00, 0x01, 0x14, 0x00, 0x02, 0xFF]
    );

    let mut vm = LegacyVm::new(EngineVersion::V5);
    vm.interpret(chunk).unwrap();
    assert_eq!(vm.variable(3), 30);
}

#[test]
fn lines_track_every_byte() {
    let sources = [
        "print 1;",
        "var a = 1;\nvar b = a +\n  2;\n{ var c = a * b; print c > 3 || false; }",
        "\"x\" + \"y\";\nnil;\ntrue && !false;",
    ];
    for source in sources {
        let chunk = relic::compile(source).unwrap();
        assert_eq!(chunk.code.len(), chunk.lines.len(), "{}", source);
    }

    let chunk = relic::compile_legacy("var a = 1 +\n2;\na = (3);", EngineVersion::V3).unwrap();
    assert_eq!(chunk.code.len(), chunk.lines.len());
}

#[test]
fn generic_listing_round_trips() {
    let source = "var greeting = \"hi\\n\";\n{ var n = 2.5 * -2.0; print n; }\nprint greeting == \"x\" || 1 <= 2;";
    let chunk = relic::compile(source).unwrap();
    let listing = bytecode::disassemble_chunk(&chunk, "round trip");
    assert_eq!(bytecode::assemble(&listing).unwrap(), chunk);
}

#[test]
fn legacy_listing_round_trips() {
    for version in EngineVersion::ALL {
        let chunk = relic::compile_legacy(
            "var a = (8 - 2) / -3;\nvar b = 32767 * 2;\na = 1 + 2 + 3 + 4;",
            version,
        )
        .unwrap();
        let table = version.opcode_table();
        let listing = legacy::disassemble(&chunk, &table, "round trip");
        assert_eq!(legacy::assemble(&listing, &table).unwrap(), chunk);
    }
}

#[test]
fn expressions_leave_exactly_one_value() {
    for source in ["1 + 2 * 3", "-(4 / 2) == -2", "\"a\" + \"b\" != \"c\"", "!(1 < 2)"] {
        let expr = parse_expression(source).unwrap();
        let chunk = Compiler::new().compile_expression(&expr).unwrap();
        assert_eq!(stack_effect(&chunk), 1, "{}", source);
    }

    let program = parse("1 + 2; var a = 3; a = a * 2; print a;").unwrap();
    let chunk = Compiler::new().compile(&program).unwrap();
    assert_eq!(stack_effect(&chunk), 0);

    let mut vm = Vm::new().with_output(Vec::new());
    vm.interpret(chunk).unwrap();
    assert_eq!(vm.stack_len(), 0);
}

#[test]
fn unknown_opcode_stops_execution() {
    let mut chunk = Chunk::new();
    chunk.write_byte(0xFE, 1);
    chunk.write_op(OpCode::True, 1);
    chunk.write_op(OpCode::Print, 1);

    let mut vm = Vm::new().with_output(Vec::new());
    let err = vm.interpret(chunk).unwrap_err();
    assert!(matches!(err, VmError::UnknownOpcode { byte: 0xFE, offset: 0 }));
    assert!(vm.into_output().is_empty());
}

#[test]
fn parser_recovers_after_invalid_assignment() {
    let tokens = relic::lexer::Scanner::new("10 = x; print \"synced\";")
        .scan_tokens()
        .unwrap();
    let output = relic::parser::Parser::new(tokens).parse();

    assert_eq!(output.program.statements.len(), 1);
    assert_eq!(output.errors.len(), 1);
    assert!(matches!(output.errors[0], ParseError::InvalidAssignment(_)));
}

#[test]
fn logic_short_circuits_the_same_everywhere() {
    let source = "\
var calls = 0;
print nil && missing;
print 0 || missing;
print false || \"right\";
print 1 && 2;
print (false && missing) || (true && \"both\");";
    let expected = "nil\n0\nright\n2\nboth\n";

    assert_eq!(run(source, ExecutionMode::TreeWalk).unwrap(), expected);
    assert_eq!(run(source, ExecutionMode::Bytecode).unwrap(), expected);
}

#[test]
fn blocks_shadow_and_restore_everywhere() {
    let source = "var a = \"outer\"; { var a = \"inner\"; print a; a = \"changed\"; print a; } print a;";
    let expected = "inner\nchanged\nouter\n";

    assert_eq!(run(source, ExecutionMode::TreeWalk).unwrap(), expected);
    assert_eq!(run(source, ExecutionMode::Bytecode).unwrap(), expected);
}

#[test]
fn legacy_rejects_what_it_cannot_encode() {
    let err = relic::compile_legacy("print 1;", EngineVersion::V5).unwrap_err();
    assert!(matches!(
        err,
        RelicError::Compile(CompileError::UnsupportedInLegacy { .. })
    ));

    let err = relic::compile_legacy("var a = 70000;", EngineVersion::V5).unwrap_err();
    assert!(matches!(
        err,
        RelicError::Compile(CompileError::LiteralOutOfRange { value: 70000, .. })
    ));
}

#[test]
fn tracing_captures_vm_instructions() {
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let chunk = relic::compile("print 1 + 2;").unwrap();
    let config = VmConfig {
        trace: true,
        ..VmConfig::default()
    };
    tracing::subscriber::with_default(subscriber, || {
        let mut vm = Vm::with_config(config).with_output(Vec::new());
        vm.interpret(chunk).unwrap();
    });

    let logs = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("CONSTANT 0 ; 1"), "{}", logs);
    assert!(logs.contains("ADD"));
    assert!(logs.contains("vm halted"));
}

#[test]
fn deep_nesting_is_an_error_not_a_crash() {
    let source = format!("{}1", "-".repeat(20_000));
    for mode in [ExecutionMode::TreeWalk, ExecutionMode::Bytecode, ExecutionMode::Legacy] {
        let err = evaluate(&source, mode).unwrap_err();
        assert!(
            matches!(&err, RelicError::Parse(errors) if matches!(errors.as_slice(), [ParseError::TooDeep(_)])),
            "{:?}",
            err
        );
    }

    let source = format!("{}1", "-".repeat(MAX_NESTING / 2));
    assert_eq!(evaluate(&source, ExecutionMode::TreeWalk).unwrap(), Value::Int(1));
}

#[test]
fn full_local_slots_run_in_every_generic_engine() {
    let locals: String = (0..256).map(|i| format!("var v{}; ", i)).collect();
    let source = format!("{{ {}v7 = 3; print v7 * 2; }} print 1;", locals);

    assert_eq!(run(&source, ExecutionMode::TreeWalk).unwrap(), "6\n1\n");
    assert_eq!(run(&source, ExecutionMode::Bytecode).unwrap(), "6\n1\n");

    let too_many = format!("{{ {}var extra; }}", locals);
    let err = relic::compile(&too_many).unwrap_err();
    assert!(matches!(err, RelicError::Compile(CompileError::TooManyLocals(_))));
}
