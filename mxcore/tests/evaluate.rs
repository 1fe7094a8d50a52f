use mxcore::{CalcError, Calculator, EvaluationOptions, ParseOptions, PrintOptions};
use mxexpr::node::{Node, NodeKind};
use mxexpr::number::Number;

fn eval_text(calc: &Calculator, text: &str) -> String {
    let parsed = calc.parse(text, &ParseOptions::default());
    assert!(calc.take_messages().is_empty());
    let result = calc
        .calculate(&parsed, &EvaluationOptions::default(), None)
        .unwrap();
    format!("{result:?}")
}

#[test]
fn numeric_folding() {
    let calc = Calculator::new();
    assert_eq!(eval_text(&calc, "2 ^ 10"), "Number(1024)");
    assert_eq!(eval_text(&calc, "1 + 2 + 3"), "Number(6)");
    assert_eq!(eval_text(&calc, "23 xor 12"), "Number(27)");
    assert_eq!(eval_text(&calc, "23 - 12"), "Number(11)");
    assert_eq!(eval_text(&calc, "3 / 2"), "Number(1.5)");
    assert_eq!(eval_text(&calc, "not 0"), "Number(-1)");
}

#[test]
#[should_panic(expected = "cyclic")]
fn self_referential_tree_fails_loudly() {
    let calc = Calculator::new();
    let node = Node::addition([Node::number(1)]);
    node.append(node.clone()).unwrap();
    let _ = calc.calculate(&node, &EvaluationOptions::default(), None);
}

#[test]
fn comparison_folds_to_logical_value() {
    let calc = Calculator::new();
    assert_eq!(eval_text(&calc, "1 < 2"), "Number(1)");
    assert_eq!(eval_text(&calc, "2 = 3"), "Number(0)");
    assert_eq!(eval_text(&calc, "3 >= 3"), "Number(1)");
}

#[test]
fn builtin_function_application() {
    let calc = Calculator::new();
    calc.load_global_functions().unwrap();
    let parsed = calc.parse("log(512, 4)", &ParseOptions::default());
    let result = calc
        .calculate(&parsed, &EvaluationOptions::default(), None)
        .unwrap();
    let value = result.number_value().unwrap().try_to_f64().unwrap();
    assert!((value - 4.5).abs() < 1e-12);
    assert_eq!(eval_text(&calc, "abs(0 - 7)"), "Number(7)");
    assert_eq!(eval_text(&calc, "max(1, 5, 3)"), "Number(5)");
}

#[test]
fn known_variables_substitute() {
    let calc = Calculator::new();
    calc.load_global_variables().unwrap();
    let parsed = calc.parse("pi", &ParseOptions::default());
    let result = calc
        .calculate(&parsed, &EvaluationOptions::default(), None)
        .unwrap();
    let value = result.number_value().unwrap().try_to_f64().unwrap();
    assert!((value - std::f64::consts::PI).abs() < 1e-12);
}

#[test]
fn unknown_variables_stay_symbolic() {
    let calc = Calculator::new();
    let parsed = calc.parse("x + 1", &ParseOptions::default());
    let result = calc
        .calculate(&parsed, &EvaluationOptions::default(), None)
        .unwrap();
    assert_eq!(result.kind(), NodeKind::Addition);
    assert_eq!(format!("{result:?}"), "Addition([Variable(variable=x), Number(1)])");
}

#[test]
fn evaluation_builds_a_new_tree() {
    let calc = Calculator::new();
    let parsed = calc.parse("1 + 2", &ParseOptions::default());
    let result = calc
        .calculate(&parsed, &EvaluationOptions::default(), None)
        .unwrap();
    assert!(!parsed.ptr_eq(&result));
    // The input is untouched.
    assert_eq!(format!("{parsed:?}"), "Addition([Number(1), Number(2)])");
}

#[test]
fn vectors_evaluate_elementwise() {
    let calc = Calculator::new();
    let vector = Node::vector([
        Node::power(Some(Node::number(2)), Some(Node::number(3))),
        Node::number(1) + Node::number(1),
    ]);
    let result = calc
        .calculate(&vector, &EvaluationOptions::default(), None)
        .unwrap();
    assert_eq!(format!("{result:?}"), "Vector([Number(8), Number(2)])");
}

#[test]
fn step_budget_exhaustion_aborts() {
    let calc = Calculator::new();
    let parsed = calc.parse("1 + 2 + 3 + 4 + 5", &ParseOptions::default());
    let tight = EvaluationOptions { max_steps: Some(2) };
    let err = calc.calculate(&parsed, &tight, None).unwrap_err();
    assert!(matches!(err, CalcError::Aborted { .. }));
}

#[test]
fn target_unit_must_resolve() {
    let calc = Calculator::new();
    let parsed = calc.parse("10", &ParseOptions::default());
    let err = calc
        .calculate(&parsed, &EvaluationOptions::default(), Some("parsec"))
        .unwrap_err();
    assert!(matches!(err, CalcError::NotFound { kind: "unit", .. }));

    calc.load_global_units().unwrap();
    assert!(
        calc.calculate(&parsed, &EvaluationOptions::default(), Some("m"))
            .is_ok()
    );
}

#[test]
fn print_round_trips_lowered_forms() {
    let calc = Calculator::new();
    let opts = PrintOptions::default();
    let quot = calc.parse("23 / 12", &ParseOptions::default());
    assert_eq!(calc.print(&quot, &opts), "23 / 12");
    let diff = calc.parse("23 - 12", &ParseOptions::default());
    assert_eq!(calc.print(&diff, &opts), "23 - 12");
    let prod = calc.parse("23 * 12", &ParseOptions::default());
    assert_eq!(calc.print(&prod, &opts), "23 * 12");
    let pow = calc.parse("2 ^ 10", &ParseOptions::default());
    assert_eq!(calc.print(&pow, &opts), "2^10");
}

#[test]
fn print_honours_the_multiplication_sign() {
    let calc = Calculator::new();
    let prod = calc.parse("2 * 3", &ParseOptions::default());
    let opts = PrintOptions {
        multiplication_sign: " × ".to_string(),
        ..PrintOptions::default()
    };
    assert_eq!(calc.print(&prod, &opts), "2 × 3");
}

#[test]
fn calculate_and_print_facade() {
    let calc = Calculator::new();
    let result = calc
        .calculate_and_print(
            "2 ^ 10",
            &EvaluationOptions::default(),
            &PrintOptions::default(),
            -1,
        )
        .unwrap();
    assert_eq!(result, "1024");

    let err = calc
        .calculate_and_print(
            "1 + 2 + 3 + 4",
            &EvaluationOptions::default(),
            &PrintOptions::default(),
            1,
        )
        .unwrap_err();
    assert!(matches!(err, CalcError::Aborted { .. }));
}

#[test]
fn float_printing_respects_precision() {
    let calc = Calculator::new();
    let node = Node::number(Number::from_f64(1.0 / 3.0));
    let opts = PrintOptions {
        precision: Some(4),
        ..PrintOptions::default()
    };
    assert_eq!(calc.print(&node, &opts), "0.3333");
    assert_eq!(calc.print(&Node::number(2.5), &opts), "2.5");
}
