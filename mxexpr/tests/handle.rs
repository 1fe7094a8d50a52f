use mxexpr::prelude::*;

#[test]
fn fresh_node_owns_one_share() {
    let node = Node::number(20);
    assert_eq!(node.refcount(), 1);
}

#[test]
fn fresh_item_starts_unowned_until_wrapped() {
    // Items start at count 0; the constructing handle wraps and brings it to 1.
    let item = ItemRef::construct(Item::variable("x"));
    assert_eq!(item.refcount(), 1);
}

#[test]
fn clone_increments_drop_decrements() {
    let node = Node::number(7);
    let copy = node.clone();
    assert_eq!(node.refcount(), 2);
    assert!(node.ptr_eq(&copy));
    drop(copy);
    assert_eq!(node.refcount(), 1);
}

#[test]
fn release_transfers_the_share() {
    let node = Node::number(7);
    let ptr = node.clone().release();
    // The released share is still accounted for in the count.
    assert_eq!(node.refcount(), 2);
    let adopted = unsafe { NodeRef::adopt(ptr) };
    assert_eq!(adopted.refcount(), 2);
    drop(adopted);
    assert_eq!(node.refcount(), 1);
}

#[test]
fn wrap_takes_a_new_share() {
    let node = Node::number(7);
    let ptr = node.clone().release();
    let wrapped = unsafe { NodeRef::wrap(ptr) };
    assert_eq!(wrapped.refcount(), 3);
    let adopted = unsafe { NodeRef::adopt(ptr) };
    drop(adopted);
    drop(wrapped);
    assert_eq!(node.refcount(), 1);
}

#[test]
fn children_hold_counted_shares() {
    let child = Node::number(1);
    let parent = Node::addition([child.clone()]);
    assert_eq!(child.refcount(), 2);
    drop(parent);
    assert_eq!(child.refcount(), 1);
}

#[test]
fn nodes_referencing_an_item_share_its_count() {
    let item = ItemRef::construct(Item::variable("x"));
    let a = Node::variable(item.clone()).unwrap();
    let b = Node::variable(item.clone()).unwrap();
    assert_eq!(item.refcount(), 3);
    drop(a);
    drop(b);
    assert_eq!(item.refcount(), 1);
}
