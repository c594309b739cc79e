mod common;

use common::Fixture;
use tether::backend::mock::Call;
use tether::target::{self, Slot, TargetId};
use tether::{Bind, Bound, Buffer, BufferUsage, ContextConfig, Handle, RestorePolicy, Texture2d, VertexArray};

fn buffer(fx: &Fixture) -> Buffer {
    let mut buffer = Buffer::new();
    buffer.initialize(&fx.gl).unwrap();
    buffer
}

const ARRAY_BUFFER: Slot = Slot {
    target: TargetId::ArrayBuffer,
    unit: 0,
};

#[test]
fn restore_previous_rebinds_outer_occupant() {
    let fx = Fixture::new();
    let a = buffer(&fx);
    let b = buffer(&fx);

    let outer = a.bind::<target::ArrayBuffer>(&fx.gl);
    {
        let _inner = b.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
        assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), b.handle());
    }
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), a.handle());
    drop(outer);
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), Handle::NULL);
}

#[test]
fn restore_null_is_the_default() {
    let fx = Fixture::new();
    let a = buffer(&fx);
    let b = buffer(&fx);

    let _outer = a.bind::<target::ArrayBuffer>(&fx.gl);
    {
        let _inner = Bound::<_, target::ArrayBuffer>::new(&fx.gl, &b);
    }
    // the outer binding is not restored
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), Handle::NULL);
}

#[test]
fn do_nothing_leaves_the_slot() {
    let fx = Fixture::new();
    let a = buffer(&fx);
    {
        let _bound = a.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::DoNothing);
    }
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), a.handle());
}

#[test]
fn nested_guards_unwind_in_order() {
    let fx = Fixture::new();
    let buffers: Vec<Buffer> = (0..3).map(|_| buffer(&fx)).collect();

    let g0 = buffers[0].bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
    let g1 = buffers[1].bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
    let g2 = buffers[2].bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), buffers[2].handle());
    drop(g2);
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), buffers[1].handle());
    drop(g1);
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), buffers[0].handle());
    drop(g0);
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), Handle::NULL);
}

#[test]
fn restore_previous_over_empty_target() {
    let fx = Fixture::new();
    let mut vbo = Buffer::new();
    vbo.initialize(&fx.gl).unwrap();
    {
        let bound = vbo.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
        bound.upload(&[[0.0f32, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]], BufferUsage::StaticDraw);
        assert_eq!(bound.size(), 32);
    }
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), Handle::NULL);
    assert_eq!(vbo.data().meta.size, 32);
    assert_eq!(vbo.data().meta.usage, BufferUsage::StaticDraw);
}

#[test]
fn targets_are_independent() {
    let fx = Fixture::new();
    let a = buffer(&fx);
    let b = buffer(&fx);

    let _array = a.bind::<target::ArrayBuffer>(&fx.gl);
    {
        let _copy = b.bind::<target::CopyReadBuffer>(&fx.gl);
        let _uniform = b.bind::<target::UniformBuffer>(&fx.gl);
        assert_eq!(fx.mock.bound_to(TargetId::CopyReadBuffer), b.handle());
        assert_eq!(fx.mock.bound_to(TargetId::UniformBuffer), b.handle());
    }
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), a.handle());
    assert_eq!(fx.mock.bound_to(TargetId::CopyReadBuffer), Handle::NULL);
}

#[test]
fn texture_units_are_separate_slots() {
    let fx = Fixture::new();
    let mut t0 = Texture2d::new();
    let mut t1 = Texture2d::new();
    t0.initialize(&fx.gl).unwrap();
    t1.initialize(&fx.gl).unwrap();

    let unit0 = t0.bind::<target::Texture2D>(&fx.gl);
    {
        let unit1 = t1.bind_unit::<target::Texture2D>(&fx.gl, 1, RestorePolicy::RestorePrevious);
        assert_eq!(unit1.slot(), Slot::texture_unit(TargetId::Texture2D, 1));
        assert_eq!(fx.mock.bound(Slot::texture_unit(TargetId::Texture2D, 1)), t1.handle());
        assert_eq!(fx.mock.bound(unit0.slot()), t0.handle());
    }
    assert_eq!(fx.mock.bound(Slot::texture_unit(TargetId::Texture2D, 1)), Handle::NULL);
    assert_eq!(fx.mock.bound_to(TargetId::Texture2D), t0.handle());
}

#[test]
fn uninitialized_resource_binds_nothing() {
    let fx = Fixture::new();
    let a = buffer(&fx);
    let empty = Buffer::new();

    let _outer = a.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::DoNothing);
    {
        let bound = empty.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
        assert_eq!(bound.handle(), Handle::NULL);
        assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), Handle::NULL);
    }
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), a.handle());
}

#[test]
fn cache_elides_redundant_binds_and_queries() {
    let fx = Fixture::new();
    let a = buffer(&fx);
    fx.mock.take_calls();

    let _g0 = a.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
    let _g1 = a.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
    let _g2 = a.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
    assert_eq!(fx.query_count(ARRAY_BUFFER), 1);
    assert_eq!(fx.bind_count(ARRAY_BUFFER), 1);
    assert_eq!(fx.gl.current_binding(ARRAY_BUFFER), a.handle());
}

#[test]
fn uncached_context_queries_every_time() {
    let fx = Fixture::with_config(ContextConfig {
        cache_bindings: false,
        ..Default::default()
    });
    let a = buffer(&fx);
    fx.mock.take_calls();

    {
        let _g0 = a.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
        let _g1 = a.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
    }
    assert_eq!(fx.query_count(ARRAY_BUFFER), 2);
    // two binds, two restores
    assert_eq!(fx.bind_count(ARRAY_BUFFER), 4);
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), Handle::NULL);
}

#[test]
fn invalidate_bindings_requeries_the_backend() {
    let fx = Fixture::new();
    let a = buffer(&fx);
    assert_eq!(fx.gl.current_binding(ARRAY_BUFFER), Handle::NULL);

    // binding changed behind the context's back
    tether::Backend::bind(&fx.mock, ARRAY_BUFFER, a.handle());
    assert_eq!(fx.gl.current_binding(ARRAY_BUFFER), Handle::NULL);
    fx.gl.invalidate_bindings();
    assert_eq!(fx.gl.current_binding(ARRAY_BUFFER), a.handle());
}

#[test]
fn switching_vertex_arrays_invalidates_element_binding() {
    let fx = Fixture::new();
    let mut vao1 = VertexArray::new();
    let mut vao2 = VertexArray::new();
    vao1.initialize(&fx.gl).unwrap();
    vao2.initialize(&fx.gl).unwrap();
    let ebo = buffer(&fx);
    let element_slot = Slot::new(TargetId::ElementArrayBuffer);

    {
        let _vao = vao1.bind_with::<target::CurrentVertexArray>(&fx.gl, RestorePolicy::DoNothing);
        let _ebo = ebo.bind_with::<target::ElementArrayBuffer>(&fx.gl, RestorePolicy::DoNothing);
    }
    {
        let _vao = vao2.bind_with::<target::CurrentVertexArray>(&fx.gl, RestorePolicy::DoNothing);
        // vao2 has no index buffer: the bind must reach the backend
        let _ebo = ebo.bind_with::<target::ElementArrayBuffer>(&fx.gl, RestorePolicy::DoNothing);
    }
    assert_eq!(fx.bind_count(element_slot), 2);
    assert_eq!(fx.mock.bound_to(TargetId::ElementArrayBuffer), ebo.handle());

    let _vao = vao1.bind_with::<target::CurrentVertexArray>(&fx.gl, RestorePolicy::DoNothing);
    assert_eq!(fx.gl.current_binding(element_slot), ebo.handle());
}

#[test]
fn deleting_current_vertex_array_forgets_its_index_buffer() {
    let fx = Fixture::new();
    let mut vao = VertexArray::new();
    vao.initialize(&fx.gl).unwrap();
    let ebo = buffer(&fx);
    let other = buffer(&fx);
    let element_slot = Slot::new(TargetId::ElementArrayBuffer);

    {
        let _vao = vao.bind_with::<target::CurrentVertexArray>(&fx.gl, RestorePolicy::DoNothing);
        let _ebo = ebo.bind_with::<target::ElementArrayBuffer>(&fx.gl, RestorePolicy::DoNothing);
    }
    drop(vao);
    // the default vertex array is current again, with its own (empty) index buffer
    assert_eq!(fx.mock.bound_to(TargetId::ElementArrayBuffer), Handle::NULL);
    assert_eq!(fx.gl.current_binding(element_slot), Handle::NULL);

    {
        let _bound = other.bind_with::<target::ElementArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
        assert_eq!(fx.mock.bound_to(TargetId::ElementArrayBuffer), other.handle());
    }
    assert_eq!(fx.mock.bound_to(TargetId::ElementArrayBuffer), Handle::NULL);
}

#[test]
fn restore_previous_skips_deleted_occupant() {
    let fx = Fixture::new();
    let a = buffer(&fx);
    let b = buffer(&fx);
    let b_handle = b.handle();

    drop(b.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::DoNothing));
    {
        let _bound = a.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
        drop(b);
        assert!(!fx.mock.is_live(b_handle));
    }
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), Handle::NULL);
    assert_eq!(fx.mock.binds().last(), Some(&(ARRAY_BUFFER, Handle::NULL)));
    assert!(!fx
        .mock
        .binds()
        .iter()
        .skip_while(|(_, handle)| *handle != a.handle())
        .any(|(_, handle)| *handle == b_handle));
}

#[test]
fn restore_previous_ignores_unrelated_deletions() {
    let fx = Fixture::new();
    let a = buffer(&fx);
    let b = buffer(&fx);
    let c = buffer(&fx);

    drop(b.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::DoNothing));
    {
        let _bound = a.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
        drop(c);
    }
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), b.handle());

    // later guards are not affected by deletions that happened before their snapshot
    {
        let _bound = a.bind_with::<target::ArrayBuffer>(&fx.gl, RestorePolicy::RestorePrevious);
    }
    assert_eq!(fx.mock.bound_to(TargetId::ArrayBuffer), b.handle());
}

#[test]
fn invalidate_bindings_resets_backend_state() {
    let fx = Fixture::new();
    fx.gl.invalidate_bindings();
    assert!(fx.mock.calls().contains(&Call::InvalidateState));
}
