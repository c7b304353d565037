use rockslice_common::error::ErrorKind;

use super::{spy_context, spy_context_with};
use crate::{AbstractSlice, DirectSlice, DropPolicy, HandleState, Ownership, Slice, SliceOptions};

#[test]
fn test_dispose_frees_exactly_once() {
    let (spy, ctx) = spy_context();
    let mut slice = Slice::from_text(&ctx, "abc").unwrap();
    let handle = slice.handle().native_handle().unwrap();

    slice.dispose().unwrap();
    slice.dispose().unwrap();
    drop(slice);

    assert_eq!(spy.free_count(handle), 1);
    assert!(!spy.is_live(handle));
}

#[test]
fn test_reads_after_dispose() {
    let (_spy, ctx) = spy_context();
    let mut slice = Slice::from_bytes(&ctx, &[1, 2, 3]).unwrap();
    slice.dispose().unwrap();
    assert_eq!(slice.state(), HandleState::Disposed);
    assert!(!slice.is_owning());

    for err in [
        slice.size().unwrap_err(),
        slice.data().unwrap_err(),
        slice.pin().unwrap_err(),
        slice.lease().unwrap_err(),
        slice.to_text(true).unwrap_err(),
    ] {
        assert!(
            matches!(err.kind(), ErrorKind::UseAfterDispose { .. }),
            "{err}"
        );
        assert!(err.is_lifecycle_violation());
    }
}

#[test]
fn test_mutations_after_dispose() {
    let (spy, ctx) = spy_context();
    let mut slice = Slice::from_text(&ctx, "gone").unwrap();
    slice.dispose().unwrap();

    let other = spy.engine_owned(b"other").unwrap();
    let err = slice.set_handle(other, Ownership::Viewing).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UseAfterDispose { .. }));
    assert!(matches!(
        slice.clear().unwrap_err().kind(),
        ErrorKind::UseAfterDispose { .. }
    ));
    assert!(matches!(
        slice.disown().unwrap_err().kind(),
        ErrorKind::UseAfterDispose { .. }
    ));
    assert!(spy.is_live(other));
}

#[test]
fn test_disown_never_frees() {
    let (spy, ctx) = spy_context();
    let mut slice = Slice::from_text(&ctx, "abc").unwrap();
    let handle = slice.handle().native_handle().unwrap();

    slice.disown().unwrap();
    assert!(!slice.is_owning());
    assert_eq!(slice.data().unwrap(), b"abc");

    slice.dispose().unwrap();
    drop(slice);
    assert_eq!(spy.free_count(handle), 0);
    assert!(spy.is_live(handle));
}

#[test]
fn test_disown_is_irreversible() {
    let (spy, ctx) = spy_context();
    let mut slice = Slice::from_text(&ctx, "abc").unwrap();
    slice.disown().unwrap();

    let other = spy.engine_owned(b"xyz").unwrap();
    let err = slice.set_handle(other, Ownership::Owning).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    assert_eq!(slice.data().unwrap(), b"abc");

    slice.set_handle(other, Ownership::Viewing).unwrap();
    assert_eq!(slice.data().unwrap(), b"xyz");
    assert_eq!(spy.total_frees(), 0);
}

#[test]
fn test_unowned_slice_bound_by_engine() {
    let (spy, ctx) = spy_context();
    let handle = spy.engine_owned(b"value").unwrap();

    let mut slice = Slice::unowned(&ctx);
    assert!(matches!(
        slice.size().unwrap_err().kind(),
        ErrorKind::UnboundAccess { .. }
    ));

    slice.set_handle(handle, Ownership::Viewing).unwrap();
    assert_eq!(slice.state(), HandleState::BoundViewing);
    assert_eq!(slice.size().unwrap(), 5);
    assert_eq!(slice.data().unwrap(), b"value");

    drop(slice);
    assert_eq!(spy.free_count(handle), 0);
}

#[test]
fn test_engine_transfers_ownership() {
    let (spy, ctx) = spy_context();
    let handle = spy.engine_owned(b"transferred").unwrap();

    let mut slice = Slice::from_bytes(&ctx, b"placeholder").unwrap();
    slice.clear().unwrap();
    assert_eq!(slice.state(), HandleState::Unbound);
    assert!(!slice.handle().is_disowned());

    slice.set_handle(handle, Ownership::Owning).unwrap();
    assert_eq!(slice.state(), HandleState::BoundOwning);
    assert_eq!(slice.data().unwrap(), b"transferred");

    slice.dispose().unwrap();
    assert_eq!(spy.free_count(handle), 1);
}

#[test]
fn test_unowned_slice_cannot_take_ownership() {
    let (spy, ctx) = spy_context();
    let handle = spy.engine_owned(b"engine").unwrap();

    let mut slice = Slice::unowned(&ctx);
    let err = slice.set_handle(handle, Ownership::Owning).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    assert_eq!(slice.state(), HandleState::Unbound);
}

#[test]
fn test_rebinding_frees_previous_owned_buffer() {
    let (spy, ctx) = spy_context();
    let mut slice = Slice::from_text(&ctx, "first").unwrap();
    let first = slice.handle().native_handle().unwrap();
    let second = spy.engine_owned(b"second").unwrap();

    slice.set_handle(second, Ownership::Viewing).unwrap();
    assert_eq!(spy.free_count(first), 1);
    assert_eq!(slice.data().unwrap(), b"second");

    slice.clear().unwrap();
    assert_eq!(slice.state(), HandleState::Unbound);
    assert_eq!(spy.free_count(second), 0);
}

#[test]
fn test_rebinding_same_handle_only_changes_ownership() {
    let (spy, ctx) = spy_context();
    let mut slice = Slice::from_text(&ctx, "same").unwrap();
    let handle = slice.handle().native_handle().unwrap();

    slice.set_handle(handle, Ownership::Viewing).unwrap();
    assert_eq!(spy.free_count(handle), 0);
    assert_eq!(slice.data().unwrap(), b"same");

    slice.set_handle(handle, Ownership::Owning).unwrap();
    slice.dispose().unwrap();
    assert_eq!(spy.free_count(handle), 1);
}

#[test]
fn test_rebinding_to_unknown_handle_keeps_binding() {
    let (spy, ctx) = spy_context();
    let mut slice = Slice::from_text(&ctx, "kept").unwrap();
    let stale = spy.engine_owned(b"stale").unwrap();
    ctx.engine().free(stale).unwrap();

    let err = slice.set_handle(stale, Ownership::Viewing).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnknownHandle { .. }));
    assert_eq!(slice.data().unwrap(), b"kept");
}

#[test]
fn test_failed_free_can_be_retried() {
    let (spy, ctx) = spy_context();
    let mut slice = Slice::from_text(&ctx, "retry").unwrap();
    let handle = slice.handle().native_handle().unwrap();

    spy.set_fail_frees(true);
    assert!(slice.dispose().is_err());
    assert_eq!(slice.state(), HandleState::BoundOwning);
    assert!(spy.is_live(handle));

    spy.set_fail_frees(false);
    slice.dispose().unwrap();
    assert_eq!(spy.free_count(handle), 2);
    assert!(!spy.is_live(handle));
}

#[test]
fn test_drop_disposes_by_default() {
    let (spy, ctx) = spy_context();
    let handles: Vec<_> = (0..10u8)
        .map(|i| {
            let slice = Slice::from_bytes(&ctx, &[i; 8]).unwrap();
            slice.handle().native_handle().unwrap()
        })
        .collect();

    for handle in handles {
        assert_eq!(spy.free_count(handle), 1);
    }
    assert_eq!(spy.live_buffers(), 0);
}

#[test]
fn test_drop_policy_leak() {
    let (spy, ctx) = spy_context_with(SliceOptions::default().drop_policy(DropPolicy::Leak));
    let slice = DirectSlice::copy_from(&ctx, b"leaked").unwrap();
    let handle = slice.handle().native_handle().unwrap();
    drop(slice);

    assert_eq!(spy.free_count(handle), 0);
    assert!(spy.is_live(handle));

    let mut disposed = Slice::from_text(&ctx, "explicit").unwrap();
    let handle = disposed.handle().native_handle().unwrap();
    disposed.dispose().unwrap();
    assert_eq!(spy.free_count(handle), 1);
}

#[test]
fn test_every_allocation_is_freed() {
    let (spy, ctx) = spy_context();
    {
        let _a = Slice::from_text(&ctx, "a").unwrap();
        let mut b = Slice::from_bytes_at(&ctx, b"xbc", 1).unwrap();
        let _c = DirectSlice::copy_from(&ctx, b"c").unwrap();
        let mut d = Slice::from_bytes(&ctx, b"d").unwrap();
        b.dispose().unwrap();
        d.disown().unwrap();
    }
    assert_eq!(spy.total_allocations(), 4);
    assert_eq!(spy.total_frees(), 3);
    assert_eq!(spy.live_buffers(), 1);
}
