use indoc::indoc;
use spyc::codegen::{CodegenError, CodegenOptions, ErrorKind, TypeCatalog};
use spyc::ir::{BlockId, Function, Instruction, Module, Terminator, Type, Value};
use spyc::{CompileError, Compiler};

fn compile(source: &str) -> Module {
    Compiler::new()
        .compile_source(source, "test")
        .expect("compile should succeed")
}

fn compile_err(source: &str) -> CodegenError {
    compile_err_with(Compiler::new(), source)
}

fn compile_err_with(compiler: Compiler, source: &str) -> CodegenError {
    match compiler.compile_source(source, "test") {
        Err(CompileError::Codegen(err)) => err,
        Err(other) => panic!("expected codegen error, got {:?}", other),
        Ok(_) => panic!("expected codegen error, compile succeeded"),
    }
}

fn function<'m>(module: &'m Module, name: &str) -> &'m Function {
    module
        .function(name)
        .unwrap_or_else(|| panic!("expected function '{}'", name))
}

fn block_id(function: &Function, label: &str) -> BlockId {
    function
        .blocks
        .iter()
        .position(|block| block.label == label)
        .map(BlockId)
        .unwrap_or_else(|| panic!("expected block '{}'", label))
}

fn terminator<'f>(function: &'f Function, label: &str) -> &'f Terminator {
    function
        .block(label)
        .and_then(|block| block.terminator.as_ref())
        .unwrap_or_else(|| panic!("expected terminated block '{}'", label))
}

fn count_stores(function: &Function, label: &str) -> usize {
    function
        .block(label)
        .map(|block| {
            block
                .instructions
                .iter()
                .filter(|inst| matches!(inst, Instruction::Store { .. }))
                .count()
        })
        .unwrap_or_default()
}

#[test]
fn if_else_feeds_a_shared_join_block() {
    let source = indoc! {"
        a = 5
        if a == 5:
        \ta = 0
        else:
        \ta = 1
    "};
    let module = compile(source);
    let main = function(&module, "main");

    let cond_branches = main
        .blocks
        .iter()
        .filter(|block| matches!(block.terminator, Some(Terminator::CondBranch { .. })))
        .count();
    assert_eq!(cond_branches, 1);

    let end = block_id(main, "end0");
    assert_eq!(terminator(main, "then0"), &Terminator::Branch(end));
    assert_eq!(terminator(main, "else0"), &Terminator::Branch(end));
    assert_eq!(count_stores(main, "then0"), 1);
    assert_eq!(count_stores(main, "else0"), 1);
    assert_eq!(
        main.predecessors(end),
        vec![block_id(main, "then0"), block_id(main, "else0")]
    );
}

#[test]
fn if_without_else_branches_straight_to_join() {
    let module = compile("a = 1\nif a > 0:\n\ta = 2\n");
    let main = function(&module, "main");
    match terminator(main, "entry") {
        Terminator::CondBranch {
            then_block,
            else_block,
            ..
        } => {
            assert_eq!(*then_block, block_id(main, "then0"));
            assert_eq!(*else_block, block_id(main, "end0"));
        }
        other => panic!("expected conditional branch, got {:?}", other),
    }
    assert!(main.block("else0").is_none());
}

#[test]
fn reassigning_with_another_type_fails() {
    let err = compile_err("a = 1\na = 0.6");
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.message, "can not assign type float into a");
    assert_eq!(err.span.line, 2);
}

#[test]
fn unbound_variable_fails() {
    let err = compile_err("a = b");
    assert_eq!(err.kind, ErrorKind::Name);
    assert_eq!(err.message, "variable b is not defined");
    assert_eq!((err.span.line, err.span.column), (1, 5));
}

#[test]
fn recursive_function_compiles() {
    let source = indoc! {"
        def fib(n: int) -> int:
        \tif n < 1:
        \t\treturn 1
        \treturn fib(n - 1) + fib(n - 2)
        a = fib(10)
    "};
    let module = compile(source);
    let fib = function(&module, "fib");
    assert_eq!(fib.return_type, Type::Int);
    assert_eq!(fib.params.len(), 1);

    let recursive_calls = fib
        .blocks
        .iter()
        .flat_map(|block| &block.instructions)
        .filter(|inst| matches!(inst, Instruction::Call { callee, .. } if callee == "fib"))
        .count();
    assert_eq!(recursive_calls, 2);
    assert!(matches!(
        terminator(fib, "then0"),
        Terminator::Return(Some(Value::Int(1)))
    ));
}

#[test]
fn forward_calls_resolve_through_predeclaration() {
    let source = indoc! {"
        def f() -> int:
        \treturn g()
        def g() -> int:
        \treturn 1
        f()
    "};
    let module = compile(source);
    let names = module
        .functions
        .iter()
        .map(|func| func.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["f", "g", "main"]);
}

#[test]
fn forward_calls_fail_without_predeclaration() {
    let source = indoc! {"
        def f() -> int:
        \treturn g()
        def g() -> int:
        \treturn 1
    "};
    let compiler = Compiler::new().with_options(CodegenOptions {
        predeclare_functions: false,
        ..CodegenOptions::default()
    });
    let err = compile_err_with(compiler, source);
    assert_eq!(err.kind, ErrorKind::Name);
    assert_eq!(err.message, "function 'g' was not found");
}

#[test]
fn while_loop_lowers_to_three_blocks() {
    let source = indoc! {"
        i = 0
        while i < 10:
        \ti = i + 1
    "};
    let module = compile(source);
    let main = function(&module, "main");
    let labels = main
        .blocks
        .iter()
        .map(|block| block.label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(labels, vec!["entry", "cond0", "loop0", "end0"]);

    let cond = block_id(main, "cond0");
    let body = block_id(main, "loop0");
    let end = block_id(main, "end0");
    assert_eq!(terminator(main, "entry"), &Terminator::Branch(cond));
    match terminator(main, "cond0") {
        Terminator::CondBranch {
            then_block,
            else_block,
            ..
        } => {
            assert_eq!(*then_block, body);
            assert_eq!(*else_block, end);
        }
        other => panic!("expected conditional branch, got {:?}", other),
    }
    assert_eq!(terminator(main, "loop0"), &Terminator::Branch(cond));
    assert_eq!(
        main.predecessors(cond),
        vec![BlockId(0), body],
    );
}

#[test]
fn return_type_mismatch_names_the_function() {
    let err = compile_err("def f() -> int:\n\treturn 1.5\n");
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(
        err.message,
        "function 'f' declared return type 'int' does not match actual return type 'float'"
    );
}

#[test]
fn missing_return_is_rejected() {
    let err = compile_err("def f(a: int) -> int:\n\ta + 1\n");
    assert_eq!(err.message, "function 'f' must return a value of type int");
}

#[test]
fn returns_on_both_branches_leave_join_unreachable() {
    let source = indoc! {"
        def sign(a: int) -> int:
        \tif a < 0:
        \t\treturn 0 - 1
        \telse:
        \t\treturn 1
    "};
    let module = compile(source);
    let sign = function(&module, "sign");
    assert_eq!(terminator(sign, "end0"), &Terminator::Unreachable);
}

#[test]
fn nested_returns_on_every_path_are_accepted() {
    let source = indoc! {"
        def f(x: int) -> int:
        \tif x > 0:
        \t\tif x > 1:
        \t\t\treturn 1
        \t\telse:
        \t\t\treturn 2
        \telse:
        \t\treturn 3
        f(1)
    "};
    let module = compile(source);
    let f = function(&module, "f");
    assert_eq!(terminator(f, "end1"), &Terminator::Unreachable);
    assert_eq!(terminator(f, "end0"), &Terminator::Unreachable);
    assert!(f.predecessors(block_id(f, "end0")).is_empty());
}

#[test]
fn code_after_return_is_still_checked() {
    let err = compile_err("def f() -> int:\n\treturn 1\n\tb = c\nf()\n");
    assert_eq!(err.kind, ErrorKind::Name);
    assert_eq!(err.message, "variable c is not defined");

    let err = compile_err("return 0\na = b\n");
    assert_eq!(err.message, "variable b is not defined");
}

#[test]
fn code_after_return_lands_in_an_unreachable_block() {
    let module = compile("def f() -> int:\n\treturn 1\n\tb = 2\nf()\n");
    let f = function(&module, "f");
    assert_eq!(terminator(f, "entry"), &Terminator::Return(Some(Value::Int(1))));
    assert_eq!(count_stores(f, "dead0"), 1);
    assert_eq!(terminator(f, "dead0"), &Terminator::Unreachable);
}

#[test]
fn chained_assignment_targets_an_assignment() {
    let err = compile_err("b = 1\na = b = 2\n");
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.message, "can assign only into identifier");
}

#[test]
fn none_function_returns_void() {
    let module = compile("def f(a: int):\n\tb = a\nf(1)\n");
    let f = function(&module, "f");
    assert_eq!(f.return_type, Type::Void);
    assert_eq!(terminator(f, "entry"), &Terminator::Return(None));

    let main = function(&module, "main");
    assert!(matches!(
        main.blocks[0].instructions.last(),
        Some(Instruction::Call { dest: None, .. })
    ));
}

#[test]
fn unknown_return_type_is_rejected() {
    let err = compile_err("def f() -> str:\n\treturn 1\n");
    assert_eq!(err.kind, ErrorKind::Name);
    assert_eq!(err.message, "return type for function 'f' is not a valid type");
}

#[test]
fn catalog_aliases_extend_annotations() {
    let compiler = Compiler::new().with_catalog(TypeCatalog::new().with_alias("i64", Type::Int));
    let module = compiler
        .compile_source("def f(a: i64) -> i64:\n\treturn a\n", "test")
        .expect("compile should succeed");
    assert_eq!(function(&module, "f").params[0].ty, Type::Int);
}

#[test]
fn arithmetic_on_bool_is_unsupported() {
    let err = compile_err("a = true + false");
    assert_eq!(err.kind, ErrorKind::Unsupported);
    assert_eq!(err.message, "operator '+' is not supported for type bool");
}

#[test]
fn mixed_operand_types_are_rejected() {
    let err = compile_err("a = 1 + 2.0");
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.message, "mismatched types int and float for operator '+'");
}

#[test]
fn float_operations_use_float_instructions() {
    let module = compile("a = 1.5\nb = -a * 2.0\nc = b < a\n");
    let main = function(&module, "main");
    let instructions = &main.blocks[0].instructions;
    assert!(instructions
        .iter()
        .any(|inst| matches!(inst, Instruction::FNeg { .. })));
    assert!(instructions.iter().any(|inst| matches!(
        inst,
        Instruction::Binary {
            op: spyc::ir::BinOp::FMul,
            ..
        }
    )));
    assert!(instructions.iter().any(|inst| matches!(
        inst,
        Instruction::FCmp {
            pred: spyc::ir::FloatPredicate::Olt,
            ..
        }
    )));
}

#[test]
fn if_condition_must_be_bool() {
    let err = compile_err("a = 1\nif a:\n\ta = 2\n");
    assert_eq!(err.kind, ErrorKind::Type);
    assert_eq!(err.message, "if condition must be bool, got int");
}

#[test]
fn assignment_target_must_be_identifier() {
    let err = compile_err("1 = 2");
    assert_eq!(err.message, "can assign only into identifier");
}

#[test]
fn defaults_fill_missing_trailing_arguments() {
    let source = indoc! {"
        def add(a: int, b: int = 10) -> int:
        \treturn a + b
        add(1)
    "};
    let module = compile(source);
    let main = function(&module, "main");
    let call = main.blocks[0]
        .instructions
        .iter()
        .find_map(|inst| match inst {
            Instruction::Call { callee, args, .. } if callee == "add" => Some(args.clone()),
            _ => None,
        })
        .expect("expected call to add");
    assert_eq!(call, vec![Value::Int(1), Value::Int(10)]);
}

#[test]
fn missing_argument_without_default_fails() {
    let err = compile_err("def f(a: int, b: int) -> int:\n\treturn a\nf(1)\n");
    assert_eq!(err.message, "missing argument 'b' in call to 'f'");
}

#[test]
fn too_many_arguments_fail() {
    let err = compile_err("def f(a: int) -> int:\n\treturn a\nf(1, 2)\n");
    assert_eq!(err.message, "function 'f' takes 1 arguments but 2 were given");
}

#[test]
fn argument_types_are_checked() {
    let err = compile_err("def f(a: int) -> int:\n\treturn a\nf(1.0)\n");
    assert_eq!(
        err.message,
        "argument 'a' of function 'f' expects type int, got float"
    );
}

#[test]
fn duplicate_functions_are_rejected() {
    let err = compile_err("def f():\n\treturn\ndef f():\n\treturn\n");
    assert_eq!(err.kind, ErrorKind::Name);
    assert_eq!(err.message, "function 'f' is already defined");
}

#[test]
fn nested_def_clashing_with_later_top_level_def_is_reported_where_nested() {
    let source = indoc! {"
        def g():
        \tdef f():
        \t\treturn
        \treturn
        def f():
        \treturn
    "};
    let err = compile_err(source);
    assert_eq!(err.message, "function 'f' is already defined");
    assert_eq!(err.span.line, 2);
}

#[test]
fn entry_name_is_reserved() {
    let err = compile_err("def main() -> int:\n\treturn 1\n");
    assert_eq!(err.message, "function 'main' is already defined");
}

#[test]
fn assigned_parameters_are_spilled_to_slots() {
    let module = compile("def f(n: int) -> int:\n\tn = n + 1\n\treturn n\n");
    let f = function(&module, "f");
    let entry = &f.blocks[0].instructions;
    assert!(matches!(entry[0], Instruction::Alloca { ty: Type::Int, .. }));
    assert!(matches!(
        &entry[1],
        Instruction::Store {
            value: Value::Param { name, .. },
            ..
        } if name == "n"
    ));
}

#[test]
fn read_only_parameters_are_used_directly() {
    let module = compile("def id(n: int) -> int:\n\treturn n\n");
    let id = function(&module, "id");
    assert!(id.blocks[0].instructions.is_empty());
    assert!(matches!(
        terminator(id, "entry"),
        Terminator::Return(Some(Value::Param { .. }))
    ));
}

#[test]
fn block_locals_do_not_leak_out() {
    let source = indoc! {"
        a = 1
        if a == 1:
        \tb = 2
        c = b
    "};
    let err = compile_err(source);
    assert_eq!(err.message, "variable b is not defined");
}

#[test]
fn main_returns_last_int_expression() {
    let module = compile("a = 2\na * 3\n");
    let main = function(&module, "main");
    match terminator(main, "entry") {
        Terminator::Return(Some(Value::Register(reg))) => assert_eq!(reg.ty, Type::Int),
        other => panic!("expected register return, got {:?}", other),
    }

    let empty = compile("a = 2\n");
    assert_eq!(
        terminator(function(&empty, "main"), "entry"),
        &Terminator::Return(Some(Value::Int(0)))
    );
}

#[test]
fn string_values_are_unsupported() {
    let err = compile_err("s = \"hi\"");
    assert_eq!(err.kind, ErrorKind::Unsupported);
    assert_eq!(err.message, "string values are not supported by the code generator");
}

#[test]
fn logic_operators_combine_bools() {
    let module = compile("a = 1\nb = a > 0 and !(a == 2)\n");
    let main = function(&module, "main");
    let ops = main.blocks[0]
        .instructions
        .iter()
        .filter_map(|inst| match inst {
            Instruction::Binary { op, .. } => Some(*op),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(ops, vec![spyc::ir::BinOp::Xor, spyc::ir::BinOp::And]);
}
