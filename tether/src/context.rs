//! The context: owner of the backend and of the binding table.
use crate::backend::Backend;
use crate::binding::RestorePolicy;
use crate::handle::{Handle, ObjectKind};
use crate::target::{Slot, TargetClass, TargetId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{trace, warn};

/// Context configuration.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextConfig {
    /// Remember the occupant of each slot, so that redundant binds and binding queries don't
    /// reach the backend.
    pub cache_bindings: bool,
    /// Restore policy of guards created with `Bound::new`.
    pub default_restore: RestorePolicy,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            cache_bindings: true,
            default_restore: RestorePolicy::RestoreNull,
        }
    }
}

struct ContextInner {
    backend: Box<dyn Backend>,
    config: ContextConfig,
    bindings: RefCell<HashMap<Slot, Handle>>,
    /// Incremented on every deletion of a bindable object.
    deletion_epoch: Cell<u64>,
    /// Number of live binding snapshots.
    snapshots: Cell<usize>,
    /// Epoch at which objects were deleted while snapshots were live.
    deleted: RefCell<HashMap<(TargetClass, Handle), u64>>,
}

/// Occupant of a slot saved by a `RestorePrevious` guard.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Snapshot {
    pub(crate) handle: Handle,
    epoch: u64,
}

/// A graphics context.
///
/// Holds the backend and a table mapping every binding slot to its current occupant. Cloning
/// a context is cheap and returns a reference to the same context.
///
/// Contexts are neither `Send` nor `Sync`: bind-then-operate APIs have one current context
/// per thread, and every resource and binding guard is tied to the thread that created its context.
/// The context (and the backend) is torn down when the last clone is dropped; every resource
/// holds a clone.
///
/// # Deletion and in-flight commands
///
/// Objects are deleted as soon as their last owner is dropped, with no synchronization with
/// commands still executing on the GPU. Call [`Context::finish`] before dropping resources
/// that may be referenced by in-flight commands, unless the backend defers deletion itself
/// (OpenGL does).
#[derive(Clone)]
pub struct Context(Rc<ContextInner>);

impl Context {
    /// Creates a context with the default configuration.
    pub fn new(backend: impl Backend + 'static) -> Context {
        Context::with_config(backend, ContextConfig::default())
    }

    pub fn with_config(backend: impl Backend + 'static, config: ContextConfig) -> Context {
        Context(Rc::new(ContextInner {
            backend: Box::new(backend),
            config,
            bindings: RefCell::new(HashMap::new()),
            deletion_epoch: Cell::new(0),
            snapshots: Cell::new(0),
            deleted: RefCell::new(HashMap::new()),
        }))
    }

    /// Creates a context over the OpenGL context that is current on this thread.
    ///
    /// # Safety
    ///
    /// An OpenGL context must be current on the calling thread, and remain current for as
    /// long as the returned context is alive.
    #[cfg(feature = "gl")]
    pub unsafe fn load_gl<F>(loadfn: F, config: ContextConfig) -> Context
    where
        F: FnMut(&'static str) -> *const std::os::raw::c_void,
    {
        let backend = crate::backend::gl::GlBackend::load_with(loadfn, Default::default());
        Context::with_config(backend, config)
    }

    pub fn backend(&self) -> &dyn Backend {
        &*self.0.backend
    }

    pub fn config(&self) -> &ContextConfig {
        &self.0.config
    }

    /// Returns whether both values refer to the same context.
    pub fn same_context(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the object currently bound to the slot.
    ///
    /// The backend is queried the first time a slot is looked at (or on every call if the
    /// binding cache is disabled).
    pub fn current_binding(&self, slot: Slot) -> Handle {
        if !self.0.config.cache_bindings {
            return self.0.backend.binding(slot);
        }
        if let Some(&handle) = self.0.bindings.borrow().get(&slot) {
            return handle;
        }
        let handle = self.0.backend.binding(slot);
        self.0.bindings.borrow_mut().insert(slot, handle);
        handle
    }

    /// Binds `handle` to `slot`. The only writer of binding state; called by binding guards.
    pub(crate) fn bind_raw(&self, slot: Slot, handle: Handle) {
        if self.0.config.cache_bindings {
            let mut bindings = self.0.bindings.borrow_mut();
            let previous = bindings.insert(slot, handle);
            if previous == Some(handle) {
                trace!(?slot, %handle, "already bound");
                return;
            }
            // the element array binding is vertex array state
            if slot.target == TargetId::CurrentVertexArray {
                bindings.remove(&Slot::new(TargetId::ElementArrayBuffer));
            }
        }
        trace!(?slot, %handle, "bind");
        self.0.backend.bind(slot, handle);
    }

    /// Saves the occupant of a slot, to be restored by `restore_snapshot`.
    pub(crate) fn snapshot(&self, slot: Slot) -> Snapshot {
        let handle = self.current_binding(slot);
        self.0.snapshots.set(self.0.snapshots.get() + 1);
        Snapshot {
            handle,
            epoch: self.0.deletion_epoch.get(),
        }
    }

    /// Binds back a snapshot, or the null object if the saved occupant has been deleted
    /// since the snapshot was taken.
    pub(crate) fn restore_snapshot(&self, slot: Slot, snapshot: Snapshot) {
        let deleted = self
            .0
            .deleted
            .borrow()
            .get(&(slot.target.class(), snapshot.handle))
            .map_or(false, |&epoch| epoch > snapshot.epoch);
        let live = self.0.snapshots.get() - 1;
        self.0.snapshots.set(live);
        if live == 0 {
            self.0.deleted.borrow_mut().clear();
        }
        if deleted {
            warn!(?slot, previous = %snapshot.handle, "previous occupant was deleted, binding null instead");
            self.bind_raw(slot, Handle::NULL);
        } else {
            trace!(?slot, previous = %snapshot.handle, "restoring previous binding");
            self.bind_raw(slot, snapshot.handle);
        }
    }

    /// Drops the cache entries that refer to an object about to be deleted.
    ///
    /// Deleting a bound object unbinds it, and the backend may reuse its handle.
    pub(crate) fn forget_object(&self, kind: ObjectKind, handle: Handle) {
        let class = match kind.target_class() {
            Some(class) => class,
            None => return,
        };
        let epoch = self.0.deletion_epoch.get() + 1;
        self.0.deletion_epoch.set(epoch);
        if self.0.snapshots.get() > 0 {
            self.0.deleted.borrow_mut().insert((class, handle), epoch);
        }

        let mut bindings = self.0.bindings.borrow_mut();
        // the element array binding belongs to whichever vertex array was current
        if kind == ObjectKind::VertexArray {
            bindings.remove(&Slot::new(TargetId::ElementArrayBuffer));
        }
        bindings.retain(|slot, bound| !(slot.target.class() == class && *bound == handle));
    }

    /// Forgets the cached occupant of every slot.
    ///
    /// Call this after code outside of this crate has changed bindings on the same context
    /// (e.g. a UI renderer sharing the GL context).
    pub fn invalidate_bindings(&self) {
        trace!("invalidating binding cache");
        self.0.bindings.borrow_mut().clear();
        self.0.backend.invalidate_state();
    }

    /// Blocks until all submitted commands have completed.
    pub fn finish(&self) {
        self.0.backend.finish()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.0.config)
            .field("bindings", &self.0.bindings.borrow())
            .finish()
    }
}
