use mxcore::{CalcError, Calculator, ParseOptions};
use mxexpr::item::Item;
use mxexpr::node::Node;

#[test]
fn lookups_are_alias_aware_and_identity_preserving() {
    let calc = Calculator::new();
    calc.load_global_units().unwrap();

    let by_name = calc.get_unit("meter").unwrap();
    let by_alias = calc.get_unit("m").unwrap();
    assert!(by_name.ptr_eq(&by_alias));
    assert_eq!(by_name.name(), "meter");
    assert!(calc.get_unit("parsec").is_none());
}

#[test]
fn get_item_searches_all_tables() {
    let calc = Calculator::new();
    calc.load_global_units().unwrap();
    calc.load_global_variables().unwrap();
    calc.load_global_functions().unwrap();

    assert!(calc.get_item("pi").unwrap().kind().is_variable());
    assert!(calc.get_item("log").unwrap().kind().is_function());
    assert!(calc.get_item("meter").unwrap().kind().is_unit());
    assert!(calc.get_item("nonesuch").is_none());
}

#[test]
fn currencies_require_units_first() {
    let calc = Calculator::new();
    let err = calc.load_global_currencies().unwrap_err();
    assert!(matches!(err, CalcError::LoadFailed(_)));

    calc.load_global_units().unwrap();
    calc.load_global_currencies().unwrap();
    let euro = calc.get_unit("EUR").unwrap();
    assert!(euro.ptr_eq(&calc.get_unit("euro").unwrap()));
}

#[test]
fn loaders_are_idempotent() {
    let calc = Calculator::new();
    calc.load_global_units().unwrap();
    let first = calc.get_unit("meter").unwrap();
    calc.load_global_units().unwrap();
    assert!(calc.get_unit("meter").unwrap().ptr_eq(&first));
}

#[test]
fn prefixes_and_datasets() {
    let calc = Calculator::new();
    calc.load_global_prefixes().unwrap();
    calc.load_global_datasets().unwrap();

    let kilo = calc.get_prefix("k").unwrap();
    assert_eq!(kilo.name, "kilo");
    assert_eq!(kilo.exponent10, 3);
    assert_eq!(calc.get_prefix("kilo").unwrap(), kilo);
    assert!(calc.get_prefix("mebi").is_none());

    assert!(calc.dataset_names().contains(&"elements".to_string()));
}

#[test]
fn messages_drain_in_order() {
    let calc = Calculator::new();
    calc.parse("1 +", &ParseOptions::default());
    calc.parse("frobnicate(1)", &ParseOptions::default());

    let first = calc.next_message().unwrap();
    assert!(first.kind().is_error());
    let rest = calc.take_messages();
    assert!(!rest.is_empty());
    assert!(calc.next_message().is_none());
    assert!(calc.take_messages().is_empty());
}

#[test]
fn precision_is_per_instance() {
    let a = Calculator::new();
    let b = Calculator::new();
    assert_eq!(a.precision(), 10);
    a.set_precision(4);
    assert_eq!(a.precision(), 4);
    assert_eq!(b.precision(), 10);
}

#[test]
fn instances_are_isolated() {
    let a = Calculator::new();
    let b = Calculator::new();
    a.register(Item::variable("only_in_a"));
    assert!(a.get_variable("only_in_a").is_some());
    assert!(b.get_variable("only_in_a").is_none());
}

#[test]
fn assumptions_stay_out_of_the_name_tables() {
    let calc = Calculator::new();
    let registered = calc.register(Item::assumptions());
    assert!(calc.get_unit("assumptions").is_none());
    assert!(calc.get_item("assumptions").is_none());
    assert!(calc.assumptions().unwrap().ptr_eq(&registered));

    // Registering again replaces the record.
    let replacement = calc.register(Item::assumptions());
    assert!(calc.assumptions().unwrap().ptr_eq(&replacement));
}

#[test]
fn registered_known_variables_feed_evaluation() {
    let calc = Calculator::new();
    calc.register(Item::known_variable("answer", Node::number(42)));
    let parsed = calc.parse("answer + 0", &ParseOptions::default());
    let result = calc
        .calculate(&parsed, &mxcore::EvaluationOptions::default(), None)
        .unwrap();
    assert_eq!(format!("{result:?}"), "Number(42)");
}
