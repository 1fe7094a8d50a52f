//! Intrusive reference counting and the [`Ref`] ownership handle.
//!
//! Role
//! - Every tree node and named entity carries its own count; [`Ref`] is the
//!   only way ownership shares are created, copied, and transferred.
//! - The two entity families start at different initial counts: freshly
//!   constructed nodes already own one share ([`RefCounted::NEW_STARTS_OWNED`]
//!   is `true`), freshly constructed items own none. [`Ref::construct`] adopts
//!   or wraps accordingly; the distinction is a type-level constant so a
//!   mixed-up call site cannot compile into a silent count corruption.
//!
//! Counting is deliberately non-atomic (`Cell`): handles are thread-affine,
//! which the python layer enforces with unsendable wrappers. Decrementing a
//! zero count is a fatal invariant violation and panics.
use std::cell::Cell;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

/// Implemented by entities managed through [`Ref`] handles.
///
/// # Safety
///
/// `refcount_cell` must return a cell embedded in the entity itself, and the
/// entity must only ever be allocated through [`Ref::construct`] /
/// [`Ref::adopt_value`] so that destruction at count zero frees the right
/// allocation.
pub unsafe trait RefCounted {
    /// Whether a freshly constructed value already accounts for one share.
    const NEW_STARTS_OWNED: bool;

    fn refcount_cell(&self) -> &Cell<usize>;
}

/// Counted handle to a [`RefCounted`] entity.
///
/// Copying (`Clone`) increments, dropping decrements, and the entity is
/// destroyed exactly when the count reaches zero, recursively releasing the
/// shares it holds on its children.
pub struct Ref<T: RefCounted> {
    ptr: NonNull<T>,
    _marker: PhantomData<T>,
}

impl<T: RefCounted> Ref<T> {
    /// Heap-allocate `value` and take the initial share, adopting or wrapping
    /// depending on the entity family.
    pub fn construct(value: T) -> Ref<T> {
        let ptr = NonNull::from(Box::leak(Box::new(value)));
        if T::NEW_STARTS_OWNED {
            unsafe { Ref::adopt(ptr) }
        } else {
            unsafe { Ref::wrap(ptr) }
        }
    }

    /// Heap-allocate `value` and adopt it with exactly one share, regardless
    /// of what its embedded count says. Used when an engine call hands a tree
    /// back by value.
    pub fn adopt_value(value: T) -> Ref<T> {
        let ptr = NonNull::from(Box::leak(Box::new(value)));
        unsafe { ptr.as_ref() }.refcount_cell().set(1);
        unsafe { Ref::adopt(ptr) }
    }

    /// Take a new share on an existing entity, incrementing its count.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live entity allocated by this module.
    pub unsafe fn wrap(ptr: NonNull<T>) -> Ref<T> {
        let cell = unsafe { ptr.as_ref() }.refcount_cell();
        cell.set(cell.get() + 1);
        Ref {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Assume a share that the entity's count already reflects; no increment.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live entity allocated by this module whose count
    /// includes the share being adopted.
    pub unsafe fn adopt(ptr: NonNull<T>) -> Ref<T> {
        Ref {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Sever this handle from the entity without decrementing, transferring
    /// the share to the caller. The single legal ownership-transfer primitive.
    pub fn release(self) -> NonNull<T> {
        let ptr = self.ptr;
        std::mem::forget(self);
        ptr
    }

    /// Current count, for diagnostics and tests.
    pub fn refcount(&self) -> usize {
        self.refcount_cell().get()
    }

    /// Whether two handles point at the same entity.
    pub fn ptr_eq(&self, other: &Ref<T>) -> bool {
        self.ptr == other.ptr
    }

    fn refcount_cell(&self) -> &Cell<usize> {
        unsafe { self.ptr.as_ref() }.refcount_cell()
    }
}

impl<T: RefCounted> Clone for Ref<T> {
    fn clone(&self) -> Self {
        unsafe { Ref::wrap(self.ptr) }
    }
}

impl<T: RefCounted> Drop for Ref<T> {
    fn drop(&mut self) {
        let cell = self.refcount_cell();
        let count = cell.get();
        assert!(count > 0, "refcount decremented below zero");
        cell.set(count - 1);
        if count == 1 {
            drop(unsafe { Box::from_raw(self.ptr.as_ptr()) });
        }
    }
}

impl<T: RefCounted> Deref for Ref<T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { self.ptr.as_ref() }
    }
}

impl<T: RefCounted + std::fmt::Debug> std::fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        (**self).fmt(f)
    }
}
