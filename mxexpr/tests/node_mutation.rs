use mxexpr::prelude::*;

#[test]
fn append_then_delete_restores_the_sequence() {
    let node = Node::addition([Node::number(1), Node::number(2)]);
    let extra = Node::number(3);
    node.append(extra.clone()).unwrap();
    assert_eq!(node.child_count(), 3);
    assert!(node.child(2).unwrap().ptr_eq(&extra));

    node.del_child(2).unwrap();
    assert_eq!(node.child_count(), 2);
    assert_eq!(extra.refcount(), 1);
}

#[test]
fn append_rejected_on_fixed_arity_kinds() {
    let power = Node::power(Some(Node::number(2)), Some(Node::number(3)));
    let err = power.append(Node::number(4)).unwrap_err();
    assert!(matches!(err, ExprError::NotAppendable(NodeKind::Power)));
    assert_eq!(power.child_count(), 2);
}

#[test]
fn child_access_returns_identical_handles() {
    let inner = Node::number(5);
    let node = Node::vector([inner.clone()]);
    let first = node.child(0).unwrap();
    assert!(first.ptr_eq(&inner));
    assert!(matches!(
        node.child(1),
        Err(ExprError::IndexOutOfBounds { index: 1, len: 1 })
    ));
}

#[test]
fn set_child_drops_the_previous_share() {
    let old = Node::number(1);
    let node = Node::vector([old.clone()]);
    node.set_child(0, Node::number(2)).unwrap();
    assert_eq!(old.refcount(), 1);
    assert_eq!(
        node.child(0).unwrap().number_value().unwrap(),
        Number::from(2)
    );
}

#[test]
fn absent_power_operands_default_to_zero() {
    let power = Node::power(None, None);
    let view = power.as_power().unwrap();
    assert_eq!(view.base().number_value().unwrap(), Number::zero());
    assert_eq!(view.exponent().number_value().unwrap(), Number::zero());
}

#[test]
fn absent_comparison_operands_default_to_zero() {
    let cmp = Node::comparison(None, ComparisonOp::Less, None);
    let view = cmp.as_comparison().unwrap();
    assert_eq!(view.op(), ComparisonOp::Less);
    assert_eq!(view.left().number_value().unwrap(), Number::zero());
    assert_eq!(view.right().number_value().unwrap(), Number::zero());
}

#[test]
fn binary_operation_requires_two_operands() {
    let err = Node::binary_operation(NodeKind::BitwiseAnd, [Node::number(1)]).unwrap_err();
    assert!(matches!(
        err,
        ExprError::TooFewOperands {
            kind: NodeKind::BitwiseAnd,
            min: 2,
            got: 1
        }
    ));

    let ok = Node::binary_operation(NodeKind::BitwiseAnd, [Node::number(1), Node::number(2)]);
    assert!(ok.is_ok());
}

#[test]
fn views_revalidate_after_retag() {
    let node = Node::number(20);
    assert!(node.as_number().is_ok());

    // The engine may rewrite a node in place; stale views must not survive.
    node.retag(NodeKind::Addition);
    let err = node.as_number().unwrap_err();
    assert!(matches!(
        err,
        ExprError::KindMismatch {
            expected: NodeKind::Number,
            found: NodeKind::Addition
        }
    ));
}

#[test]
fn item_family_checked_at_construction() {
    let unit = ItemRef::construct(Item::unit("meter"));
    let err = Node::variable(unit).unwrap_err();
    assert!(matches!(err, ExprError::ItemKindMismatch { .. }));
}

#[test]
fn structural_equality_ignores_handle_identity() {
    let a = Node::addition([Node::number(1), Node::number(2)]);
    let b = Node::addition([Node::number(1), Node::number(2)]);
    assert!(!a.ptr_eq(&b));
    assert_eq!(*a, *b);

    let c = Node::addition([Node::number(2), Node::number(1)]);
    assert_ne!(*a, *c);
}

#[test]
fn operator_sugar_builds_canonical_forms() {
    let sum = Node::number(1) + Node::number(2);
    assert_eq!(format!("{sum:?}"), "Addition([Number(1), Number(2)])");

    let diff = Node::number(5) - Node::number(3);
    assert_eq!(
        format!("{diff:?}"),
        "Addition([Number(5), Multiplication([Number(-1), Number(3)])])"
    );

    let quot = Node::number(5) / Node::number(3);
    assert_eq!(
        format!("{quot:?}"),
        "Multiplication([Number(5), Power(base=Number(3), exponent=Number(-1))])"
    );
}

#[test]
fn vector_matrix_views() {
    let matrix = Node::vector([
        Node::vector([Node::number(1), Node::number(2)]),
        Node::vector([Node::number(3), Node::number(4)]),
    ]);
    let view = matrix.as_vector().unwrap();
    assert_eq!(view.rows(), 2);
    assert_eq!(view.columns(), 2);
    assert_eq!(
        view.element(1, 0).unwrap().number_value().unwrap(),
        Number::from(3)
    );

    let flat = view.flatten();
    assert_eq!(flat.child_count(), 4);

    let sorted = Node::vector([Node::number(3), Node::number(1), Node::number(2)]);
    let sorted = sorted.as_vector().unwrap().sort(true);
    assert_eq!(
        format!("{sorted:?}"),
        "Vector([Number(1), Number(2), Number(3)])"
    );
}
