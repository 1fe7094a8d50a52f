use mxexpr::prelude::*;

#[test]
fn scalar_reprs() {
    assert_eq!(format!("{:?}", Node::number(20)), "Number(20)");
    assert_eq!(format!("{:?}", Node::number(-3)), "Number(-3)");
    assert_eq!(format!("{:?}", Node::number(1.5)), "Number(1.5)");
    assert_eq!(format!("{:?}", Node::undefined()), "Undefined()");
}

#[test]
fn sequence_reprs_recurse() {
    let sum = Node::addition([Node::number(1), Node::number(2), Node::number(3)]);
    assert_eq!(
        format!("{sum:?}"),
        "Addition([Number(1), Number(2), Number(3)])"
    );

    let nested = Node::multiplication([Node::number(2), sum]);
    assert_eq!(
        format!("{nested:?}"),
        "Multiplication([Number(2), Addition([Number(1), Number(2), Number(3)])])"
    );
}

#[test]
fn fixed_arity_reprs_are_field_tagged() {
    let power = Node::power(Some(Node::number(2)), Some(Node::number(10)));
    assert_eq!(
        format!("{power:?}"),
        "Power(base=Number(2), exponent=Number(10))"
    );

    let cmp = Node::comparison(
        Some(Node::number(1)),
        ComparisonOp::LessOrEqual,
        Some(Node::number(2)),
    );
    assert_eq!(
        format!("{cmp:?}"),
        "Comparison(left=Number(1), op=LessOrEqual, right=Number(2))"
    );
}

#[test]
fn entity_reprs_use_the_primary_name() {
    let x = ItemRef::construct(Item::variable("x"));
    let var = Node::variable(x).unwrap();
    assert_eq!(format!("{var:?}"), "Variable(variable=x)");

    let meter = ItemRef::construct(Item::unit("meter"));
    let unit = Node::unit(meter).unwrap();
    assert_eq!(format!("{unit:?}"), "Unit(unit=meter)");

    let log = ItemRef::construct(Item::function("log", |_| None));
    let call = Node::function(log, [Node::number(512), Node::number(4)]).unwrap();
    assert_eq!(
        format!("{call:?}"),
        "Function(function=log, args=[Number(512), Number(4)])"
    );
}

#[test]
fn marker_kinds_render_bracketed() {
    assert_eq!(format!("{:?}", Node::marker(NodeKind::Datetime)), "<Datetime>");
    assert_eq!(format!("{:?}", Node::marker(NodeKind::Symbolic)), "<Symbolic>");
}

#[test]
fn repr_is_stable_across_calls() {
    let tree = Node::number(2).pow(Node::number(10)) + Node::number(1);
    let first = format!("{tree:?}");
    let second = format!("{tree:?}");
    assert_eq!(first, second);
}
