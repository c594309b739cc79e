mod common;

use common::Fixture;
use tether::target::{self, Slot, TargetId};
use tether::{Bind, Buffer, Error, Handle, ObjectKind, RestorePolicy, Texture2d};

#[test]
fn clones_share_one_object() {
    let fx = Fixture::new();
    let mut a = Buffer::new();
    a.initialize(&fx.gl).unwrap();
    let handle = a.handle();
    let b = a.clone();
    let c = b.clone();
    assert_eq!(c.handle(), handle);

    drop(a);
    drop(b);
    assert!(fx.mock.is_live(handle));
    assert_eq!(fx.mock.deletions(handle), 0);
    drop(c);
    assert!(!fx.mock.is_live(handle));
    assert_eq!(fx.mock.deletions(handle), 1);
}

#[test]
fn initialization_is_shared_by_clones() {
    let fx = Fixture::new();
    let mut a = Buffer::new();
    let mut b = a.clone();
    a.initialize(&fx.gl).unwrap();
    assert!(b.is_initialized());
    b.initialize(&fx.gl).unwrap();
    assert_eq!(fx.mock.generated(ObjectKind::Buffer), 1);
}

#[test]
fn uninitialized_resources_delete_nothing() {
    let fx = Fixture::new();
    drop(Buffer::new());
    drop(Texture2d::new());
    assert!(fx.mock.calls().is_empty());
}

#[test]
fn allocation_failure_is_recoverable() {
    let fx = Fixture::new();
    fx.mock.fail_generate(ObjectKind::Texture);
    let mut texture = Texture2d::new();
    match texture.initialize(&fx.gl) {
        Err(Error::AllocationFailed { kind }) => assert_eq!(kind, ObjectKind::Texture),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!texture.is_initialized());
    assert_eq!(texture.handle(), Handle::NULL);

    fx.mock.allow_generate(ObjectKind::Texture);
    texture.initialize(&fx.gl).unwrap();
    assert!(texture.is_initialized());
}

#[test]
fn resources_outlive_their_context_handle() {
    let fx = Fixture::new();
    let Fixture { gl, mock } = fx;
    let mut buffer = Buffer::new();
    buffer.initialize(&gl).unwrap();
    let handle = buffer.handle();
    drop(gl);
    assert!(mock.is_live(handle));
    drop(buffer);
    assert_eq!(mock.deletions(handle), 1);
    assert_eq!(mock.live_objects(), 0);
}

#[test]
fn deletion_forgets_cached_bindings() {
    let fx = Fixture::new();
    let slot = Slot::new(TargetId::ArrayBuffer);
    let mut buffer = Buffer::new();
    buffer.initialize(&fx.gl).unwrap();
    let handle = buffer.handle();
    {
        let _bound = buffer.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::DoNothing);
    }
    assert_eq!(fx.gl.current_binding(slot), handle);
    drop(buffer);
    // deleting a bound object unbinds it
    assert_eq!(fx.mock.bound(slot), Handle::NULL);
    assert_eq!(fx.gl.current_binding(slot), Handle::NULL);
}

#[test]
fn data_reports_handle_and_metadata() {
    let fx = Fixture::new();
    let mut texture = Texture2d::new();
    assert_eq!(texture.data().handle, Handle::NULL);
    texture.initialize(&fx.gl).unwrap();
    {
        let bound = texture.bind::<target::Texture2D>(&fx.gl);
        bound.upload_2d(0, tether::PixelFormat::Rgba8, 4, 2, Some(&[0u8; 32][..]));
    }
    let data = texture.data();
    assert_eq!(data.handle, texture.handle());
    assert_eq!(data.meta.format, Some(tether::PixelFormat::Rgba8));
    assert_eq!((data.meta.width, data.meta.height, data.meta.depth), (4, 2, 1));
    assert_eq!(data.meta.levels, 1);
}
