//! Binding guards.
//!
//! A [`Bound`] binds a resource to a target slot when created and restores the slot when
//! dropped. Operations that act on "whatever is bound to target X" take a `&Bound<R, X>`
//! instead of the resource: holding the guard is the proof that the resource is bound.
//!
//! Guards on the same slot must be dropped in the reverse order of their creation for the
//! outer state to be restored correctly. Scoping guards lexically does that automatically;
//! moving a guard out of its scope or calling `mem::forget` on it does not.
use crate::context::{Context, Snapshot};
use crate::handle::{Handle, Resource};
use crate::target::{BindableTo, Slot, Target, TextureTarget};
use std::fmt;
use std::marker::PhantomData;

/// What a guard leaves in its slot when dropped.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub enum RestorePolicy {
    /// Query the occupant of the slot before binding, and rebind it on drop. If the occupant
    /// was deleted in the meantime, the slot is left bound to the null object.
    RestorePrevious,
    /// Bind the null object on drop.
    RestoreNull,
    /// Leave the slot as is. Used when an enclosing scope manages the slot.
    DoNothing,
}

impl Default for RestorePolicy {
    fn default() -> Self {
        RestorePolicy::RestoreNull
    }
}

#[derive(Copy, Clone, Debug)]
enum Restore {
    Previous(Snapshot),
    Null,
    Nothing,
}

/// A resource bound to a target. See the module documentation.
pub struct Bound<'a, R: BindableTo<T>, T: Target> {
    gl: &'a Context,
    resource: &'a R,
    slot: Slot,
    restore: Restore,
    _target: PhantomData<fn() -> T>,
}

impl<'a, R: BindableTo<T>, T: Target> Bound<'a, R, T> {
    /// Binds the resource with the context's default restore policy (`RestoreNull` unless
    /// configured otherwise).
    pub fn new(gl: &'a Context, resource: &'a R) -> Bound<'a, R, T> {
        Bound::with_policy(gl, resource, gl.config().default_restore)
    }

    pub fn with_policy(gl: &'a Context, resource: &'a R, policy: RestorePolicy) -> Bound<'a, R, T> {
        Bound::bind_slot(gl, resource, Slot::new(T::ID), policy)
    }

    fn bind_slot(gl: &'a Context, resource: &'a R, slot: Slot, policy: RestorePolicy) -> Bound<'a, R, T> {
        let restore = match policy {
            RestorePolicy::RestorePrevious => Restore::Previous(gl.snapshot(slot)),
            RestorePolicy::RestoreNull => Restore::Null,
            RestorePolicy::DoNothing => Restore::Nothing,
        };
        gl.bind_raw(slot, resource.handle());
        Bound {
            gl,
            resource,
            slot,
            restore,
            _target: PhantomData,
        }
    }

    pub fn context(&self) -> &'a Context {
        self.gl
    }

    pub fn resource(&self) -> &'a R {
        self.resource
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Handle of the bound object.
    pub fn handle(&self) -> Handle {
        self.resource.handle()
    }
}

impl<'a, R: BindableTo<T>, T: TextureTarget> Bound<'a, R, T> {
    /// Binds a texture to its target on the given texture unit.
    pub fn unit(gl: &'a Context, resource: &'a R, unit: u32, policy: RestorePolicy) -> Bound<'a, R, T> {
        Bound::bind_slot(gl, resource, Slot::texture_unit(T::ID, unit), policy)
    }
}

impl<'a, R: BindableTo<T>, T: Target> Drop for Bound<'a, R, T> {
    fn drop(&mut self) {
        match self.restore {
            Restore::Previous(snapshot) => self.gl.restore_snapshot(self.slot, snapshot),
            Restore::Null => self.gl.bind_raw(self.slot, Handle::NULL),
            Restore::Nothing => {}
        }
    }
}

impl<'a, R: BindableTo<T>, T: Target> fmt::Debug for Bound<'a, R, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Bound")
            .field("slot", &self.slot)
            .field("handle", &self.resource.handle())
            .field("restore", &self.restore)
            .finish()
    }
}

/// Extension methods for creating binding guards.
///
/// ```
/// use tether::{target, Bind, Buffer, BufferUsage, Context, MockBackend};
///
/// let gl = Context::new(MockBackend::new());
/// let mut vbo = Buffer::new();
/// vbo.initialize(&gl).unwrap();
/// {
///     let bound = vbo.bind::<target::ArrayBuffer>(&gl);
///     bound.upload(&[[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]], BufferUsage::StaticDraw);
/// }
/// assert_eq!(vbo.data().meta.size, 24);
/// ```
pub trait Bind: Resource + Sized {
    fn bind<'a, T: Target>(&'a self, gl: &'a Context) -> Bound<'a, Self, T>
    where
        Self: BindableTo<T>,
    {
        Bound::new(gl, self)
    }

    fn bind_with<'a, T: Target>(&'a self, gl: &'a Context, policy: RestorePolicy) -> Bound<'a, Self, T>
    where
        Self: BindableTo<T>,
    {
        Bound::with_policy(gl, self, policy)
    }

    /// Binds a texture on a texture unit.
    fn bind_unit<'a, T: TextureTarget>(
        &'a self,
        gl: &'a Context,
        unit: u32,
        policy: RestorePolicy,
    ) -> Bound<'a, Self, T>
    where
        Self: BindableTo<T>,
    {
        Bound::unit(gl, self, unit, policy)
    }
}

impl<R: Resource> Bind for R {}
