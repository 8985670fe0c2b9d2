//! End-to-end tests for whole-formula calculation

use assembler_formula::{calculate, CalculationResult, Value, Variables};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn run(formula: &str) -> (CalculationResult, Variables) {
    let mut vars = Variables::new();
    let result = calculate(formula, &mut vars);
    (result, vars)
}

/// Empty or whitespace-only formulas are rejected with code 1
#[test]
fn test_empty_formula() {
    for formula in ["", "   ", "\n\t"] {
        let (result, _) = run(formula);
        assert_eq!(result.code, 1, "{:?}", formula);
        assert_eq!(result.result, None);
    }
}

#[test]
fn test_plain_arithmetic() {
    let (result, _) = run("=5+5");
    assert_eq!(result.code, 0);
    assert_eq!(result.result, Some(Value::Number(10.0)));
}

#[test]
fn test_assignments_are_visible_to_caller() {
    let (result, vars) = run("[A] = 2; [B] = {A} * 3; =({B})");
    assert_eq!(result.result, Some(Value::Number(6.0)));
    assert_eq!(vars.get("A"), Some(&Value::Number(2.0)));
    assert_eq!(vars.get("B"), Some(&Value::Number(6.0)));
}

#[test]
fn test_unbound_required_variable() {
    let (result, _) = run("=({X})");
    assert_eq!(result.code, 2);
    assert!(result.message.contains("'X'"));
    assert!(result.message.contains("line 1"));
    assert!(result.hints.is_some());
}

#[test]
fn test_unbound_optional_variable() {
    let (result, _) = run("=({^X})");
    assert_eq!(result.code, 0);
    assert_eq!(result.result, Some(Value::Number(0.0)));
}

#[test]
fn test_between_bounds_are_exclusive() {
    let (result, _) = run("[A] = 5; =({A}[0,10])");
    assert_eq!(result.result, Some(Value::Boolean(true)));

    let (result, _) = run("[A] = 0; =({A}[0,10])");
    assert_eq!(result.result, Some(Value::Boolean(false)));

    let (result, _) = run("[A] = 10; =({A}[0,10])");
    assert_eq!(result.result, Some(Value::Boolean(false)));
}

#[test]
fn test_rounding_glyphs() {
    assert_eq!(run("=(²(1.2))").0.number(), Some(2.0));
    assert_eq!(run("=(³(1.8))").0.number(), Some(1.0));
    assert_eq!(run("=(¹(1.5))").0.number(), Some(2.0));
    assert_eq!(run("=(ª(4))").0.number(), Some(5.0));
    assert_eq!(run("=(º(5))").0.number(), Some(6.0));
}

#[test]
fn test_exponent_and_root_glyphs() {
    assert_eq!(run("=(2²)").0.number(), Some(4.0));
    assert_eq!(run("=(√(9))").0.number(), Some(3.0));
    assert_eq!(run("=(³√(8))").0.number(), Some(2.0));
}

#[test]
fn test_string_return_is_verbatim() {
    let (result, _) = run("=#hello world");
    assert_eq!(result.result, Some(Value::Text("hello world".into())));

    // Operators in the payload are not evaluated
    let (result, _) = run("=#1 + 1");
    assert_eq!(result.result, Some(Value::Text("1 + 1".into())));
}

#[test]
fn test_comments_are_ignored() {
    let (result, _) = run("//note;\n=5");
    assert_eq!(result.code, 0);
    assert_eq!(result.result, Some(Value::Number(5.0)));
}

#[test]
fn test_unbalanced_parenthesis_hint() {
    let (result, _) = run("=(5+5");
    assert_ne!(result.code, 0);
    assert_eq!(result.result, None);
    let hints = result.hints.expect("failed results carry hints");
    assert_eq!(
        hints,
        vec!["Unbalanced parentheses: 1 '(' opened, 0 ')' closed".to_string()]
    );
}

#[test]
fn test_conditional_forms() {
    let mut vars: Variables = [("ALTURA", 2.3)].into_iter().collect();
    let result = calculate("=SE({ALTURA} > 2.1, 1.15, 1)", &mut vars);
    assert_eq!(result.number(), Some(1.15));

    let result = calculate("=SE({ALTURA} > 2.1 ? \"alta\" : \"normal\")", &mut vars);
    assert_eq!(result.result, Some(Value::Text("alta".into())));
}

#[test]
fn test_realistic_price_formula() {
    let mut vars: Variables = [
        ("LARGURA", 0.9),
        ("ALTURA", 2.15),
        ("PRECO_M2", 120.0),
        ("QTD", 2.0),
    ]
    .into_iter()
    .collect();

    let formula = "
        // área mínima cobrada de 1 m²;
        [AREA] = {LARGURA} * {ALTURA};
        [AREA_COBRADA] = SE({AREA} < 1, 1, {AREA});
        // acréscimo para portas altas;
        [FATOR] = {ALTURA}[2.1, 3] ? 1.1 : 1;
        =²({AREA_COBRADA} * {PRECO_M2} * {FATOR} * {QTD} + {^FRETE})
    ";

    let result = calculate(formula, &mut vars);
    assert_eq!(result.code, 0, "{}", result.message);
    // 0.9 * 2.15 = 1.935; 1.935 * 120 * 1.1 * 2 = 510.84
    assert_eq!(result.number(), Some(511.0));
    assert_eq!(vars.get("FATOR"), Some(&Value::Number(1.1)));
    assert!(!vars.contains("FRETE"));
}

#[test]
fn test_failure_keeps_earlier_assignments() {
    let (result, vars) = run("[A] = 1; [B] = {A} +; =({B})");
    assert_eq!(result.code, 4);
    assert!(result.message.starts_with("Syntax error at line 2"));
    assert_eq!(vars.get("A"), Some(&Value::Number(1.0)));
    assert!(!vars.contains("B"));
}

proptest! {
    /// Same formula, fresh copies of the same inputs: same outcome
    #[test]
    fn prop_calculation_is_repeatable(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let formula = "[S] = {A} + {B}; [P] = {A} * {B}; =SE({S} > {P}, ¹({S}), ³({P}))";
        let initial: Variables = [("A", a), ("B", b)].into_iter().collect();

        let mut first_vars = initial.clone();
        let first = calculate(formula, &mut first_vars);
        let mut second_vars = initial.clone();
        let second = calculate(formula, &mut second_vars);

        prop_assert_eq!(first.code, second.code);
        prop_assert_eq!(first.result, second.result);
        prop_assert_eq!(first_vars, second_vars);
    }

    /// Failures always carry hints, successes never do
    #[test]
    fn prop_hints_only_on_failure(text in "[=(){}\\[\\]0-9+A;^ ]{0,24}") {
        let mut vars = Variables::new();
        let result = calculate(&text, &mut vars);
        prop_assert_eq!(result.code == 0, result.hints.is_none());
        if result.code == 0 {
            prop_assert!(result.message.is_empty());
        } else {
            prop_assert!(result.result.is_none());
        }
    }
}
