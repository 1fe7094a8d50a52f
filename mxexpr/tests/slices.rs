use mxexpr::prelude::*;

fn digits(n: usize) -> NodeRef {
    Node::vector((0..n as i64).map(Node::number))
}

fn values(slice: &[NodeRef]) -> Vec<i64> {
    slice
        .iter()
        .map(|n| n.number_value().unwrap().try_to_i64().unwrap())
        .collect()
}

#[test]
fn forward_slices() {
    let v = digits(6);
    assert_eq!(values(&v.slice(0, 6, 1).unwrap()), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(values(&v.slice(1, 4, 1).unwrap()), vec![1, 2, 3]);
    assert_eq!(values(&v.slice(0, 6, 2).unwrap()), vec![0, 2, 4]);
    assert_eq!(values(&v.slice(0, 5, 3).unwrap()), vec![0, 3]);
}

#[test]
fn reverse_slice_excludes_the_stop_endpoint() {
    let v = digits(6);
    assert_eq!(values(&v.slice(4, 1, -1).unwrap()), vec![4, 3, 2]);
    assert_eq!(values(&v.slice(5, 0, -2).unwrap()), vec![5, 3, 1]);
}

#[test]
fn negative_endpoints_wrap() {
    let v = digits(6);
    // -2 wraps to 4, -1 wraps to 5.
    assert_eq!(values(&v.slice(-2, 6, 1).unwrap()), vec![4, 5]);
    assert_eq!(values(&v.slice(0, -1, 1).unwrap()), vec![0, 1, 2, 3, 4]);
    assert_eq!(values(&v.slice(-1, 1, -1).unwrap()), vec![5, 4, 3, 2]);
}

#[test]
fn open_ended_slices_run_to_the_end() {
    let v = digits(6);
    // Reverse with no stop reaches down to and including child 0.
    assert_eq!(values(&v.slice_open(5, -1).unwrap()), vec![5, 4, 3, 2, 1, 0]);
    assert_eq!(values(&v.slice_open(-1, -2).unwrap()), vec![5, 3, 1]);
    assert_eq!(values(&v.slice_open(2, 1).unwrap()), vec![2, 3, 4, 5]);
    assert_eq!(values(&digits(3).slice_open(2, -1).unwrap()), vec![2, 1, 0]);

    assert!(matches!(v.slice_open(0, 0), Err(ExprError::ZeroStep)));
    assert!(matches!(
        v.slice_open(6, -1),
        Err(ExprError::IndexOutOfBounds { .. })
    ));
    assert!(digits(0).slice_open(0, -1).unwrap().is_empty());
}

#[test]
fn direction_mismatch_yields_empty() {
    let v = digits(6);
    assert!(v.slice(1, 4, -1).unwrap().is_empty());
    assert!(v.slice(4, 1, 2).unwrap().is_empty());
}

#[test]
fn zero_step_is_an_error() {
    let v = digits(6);
    assert!(matches!(v.slice(0, 6, 0), Err(ExprError::ZeroStep)));
}

#[test]
fn out_of_bounds_endpoints_are_errors_not_clamped() {
    let v = digits(6);
    assert!(matches!(
        v.slice(0, 7, 1),
        Err(ExprError::IndexOutOfBounds { .. })
    ));
    assert!(matches!(
        v.slice(6, 1, -1),
        Err(ExprError::IndexOutOfBounds { .. })
    ));
}

#[test]
fn empty_sequence_full_slice_is_empty() {
    let v = digits(0);
    assert!(v.slice(0, 0, 1).unwrap().is_empty());
}

#[test]
fn slice_handles_share_identity_with_children() {
    let v = digits(3);
    let slice = v.slice(0, 3, 1).unwrap();
    for (i, handle) in slice.iter().enumerate() {
        assert!(handle.ptr_eq(&v.child(i).unwrap()));
    }
}
