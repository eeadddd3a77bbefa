use indoc::indoc;
use spyc::ir::builder::{FunctionBuilder, ModuleBuilder};
use spyc::ir::{printer, BinOp, Instruction, Parameter, Terminator, Type, Value};
use spyc::Compiler;

fn render(source: &str) -> String {
    let module = Compiler::new()
        .compile_source(source, "test")
        .expect("compile should succeed");
    printer::render(&module)
}

#[test]
fn prints_if_else_module() {
    let source = indoc! {"
        a = 5
        if a == 5:
        \ta = 0
        else:
        \ta = 1
    "};
    let expected = indoc! {"
        ; ModuleID = 'test'

        define i64 @main() {
        entry:
          %t0 = alloca i64
          store i64 5, ptr %t0
          %t1 = load i64, ptr %t0
          %t2 = icmp eq i64 %t1, 5
          br i1 %t2, label %then0, label %else0

        then0:
          store i64 0, ptr %t0
          br label %end0

        else0:
          store i64 1, ptr %t0
          br label %end0

        end0:
          ret i64 0
        }
    "};
    assert_eq!(render(source), expected);
}

#[test]
fn prints_while_loop_with_back_edge() {
    let source = indoc! {"
        i = 0
        while i < 3:
        \ti = i + 1
        i
    "};
    let expected = indoc! {"
        ; ModuleID = 'test'

        define i64 @main() {
        entry:
          %t0 = alloca i64
          store i64 0, ptr %t0
          br label %cond0

        cond0:
          %t1 = load i64, ptr %t0
          %t2 = icmp slt i64 %t1, 3
          br i1 %t2, label %loop0, label %end0

        loop0:
          %t3 = load i64, ptr %t0
          %t4 = add i64 %t3, 1
          store i64 %t4, ptr %t0
          br label %cond0

        end0:
          %t5 = load i64, ptr %t0
          ret i64 %t5
        }
    "};
    assert_eq!(render(source), expected);
}

#[test]
fn prints_function_parameters_and_calls() {
    let source = indoc! {"
        def twice(x: float) -> float:
        \treturn x * 2.0
        twice(1.0)
    "};
    let expected = indoc! {"
        ; ModuleID = 'test'

        define double @twice(double %arg.x) {
        entry:
          %t0 = fmul double %arg.x, 0x4000000000000000
          ret double %t0
        }

        define i64 @main() {
        entry:
          %t0 = call double @twice(double 0x3FF0000000000000)
          ret i64 0
        }
    "};
    assert_eq!(render(source), expected);
}

#[test]
fn prints_void_function() {
    let output = render("def noop(flag: bool):\n\treturn\nnoop(true)\n");
    assert!(output.contains("define void @noop(i1 %arg.flag) {"));
    assert!(output.contains("  ret void\n"));
    assert!(output.contains("  call void @noop(i1 true)\n"));
}

#[test]
fn prints_hand_built_function() {
    let mut builder = FunctionBuilder::new(
        "inc".to_string(),
        vec![Parameter {
            name: "n".to_string(),
            ty: Type::Int,
        }],
        Type::Int,
    );
    let entry = builder.create_block("entry".to_string());
    builder.switch_to_block(entry);
    let sum = builder.fresh_register(Type::Int);
    builder
        .add_instruction(Instruction::Binary {
            dest: sum.clone(),
            op: BinOp::Add,
            lhs: Value::Param {
                name: "n".to_string(),
                ty: Type::Int,
            },
            rhs: Value::Int(1),
        })
        .expect("instruction should be accepted");
    builder
        .set_terminator(Terminator::Return(Some(sum.into())))
        .expect("terminator should be accepted");

    let mut module = ModuleBuilder::new("hand".to_string());
    module.add_function(builder.build());
    assert!(module.has_function("inc"));

    let expected = indoc! {"
        ; ModuleID = 'hand'

        define i64 @inc(i64 %arg.n) {
        entry:
          %t0 = add i64 %arg.n, 1
          ret i64 %t0
        }
    "};
    assert_eq!(printer::render(&module.build()), expected);
}

#[test]
fn labels_share_a_suffix_per_construct() {
    let source = indoc! {"
        i = 0
        while i < 3:
        \tif i == 1:
        \t\ti = 5
        \ti = i + 1
    "};
    let module = Compiler::new()
        .compile_source(source, "test")
        .expect("compile should succeed");
    let labels = module
        .function("main")
        .expect("main should exist")
        .blocks
        .iter()
        .map(|block| block.label.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        labels,
        vec!["entry", "cond0", "loop0", "end0", "then1", "end1"]
    );
}
