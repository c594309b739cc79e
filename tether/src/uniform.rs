//! Typed uniform locations and setters.
//!
//! Locations are looked up by name once, when initialized, and keep a weak reference to
//! their program. Setting a uniform goes through the program's binding guard:
//!
//! ```
//! use tether::{target, Bind, Context, FragmentShader, MockBackend, Program, UniformLocation, VertexShader};
//!
//! let gl = Context::new(MockBackend::new());
//! let mut vs = VertexShader::new("in vec2 position;");
//! let mut fs = FragmentShader::new("uniform vec4 tint;");
//! vs.initialize(&gl).unwrap();
//! fs.initialize(&gl).unwrap();
//! let mut program = Program::new().attach(&vs).attach(&fs);
//! program.initialize(&gl).unwrap();
//!
//! let mut tint = UniformLocation::<[f32; 4]>::new(&program, "tint");
//! tint.initialize(&gl).unwrap();
//!
//! let bound = program.bind::<target::CurrentProgram>(&gl);
//! bound.set(&tint, [1.0, 0.5, 0.0, 1.0]);
//! ```
use crate::binding::Bound;
use crate::buffer::Buffer;
use crate::context::Context;
use crate::error::{Error, LocationKind, Result};
use crate::handle::{check_initialized, Handle, ObjectCell, ObjectKind};
use crate::init::Initialize;
use crate::sealed::{Sealed, SealedUniform};
use crate::shader::{Program, ProgramInfo};
use crate::target::{CurrentProgram, IndexedTarget, ShaderStorageBuffer, TextureTarget, UniformBuffer};
use crate::texture::Texture;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Range;
use std::rc::{Rc, Weak};
use tracing::{trace, warn};

/// A uniform value, as passed to the backend.
///
/// Vectors carry their number of components, matrices their order. Matrices are
/// column-major: `data[column * order + row]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UniformValue<'a> {
    F32 { components: u8, data: &'a [f32] },
    F64 { components: u8, data: &'a [f64] },
    I32 { components: u8, data: &'a [i32] },
    U32 { components: u8, data: &'a [u32] },
    I64 { components: u8, data: &'a [i64] },
    U64 { components: u8, data: &'a [u64] },
    MatF32 { order: u8, data: &'a [f32] },
    MatF64 { order: u8, data: &'a [f64] },
}

const F32_ENTRY_POINTS: [&str; 4] = ["Uniform1fv", "Uniform2fv", "Uniform3fv", "Uniform4fv"];
const F64_ENTRY_POINTS: [&str; 4] = ["Uniform1dv", "Uniform2dv", "Uniform3dv", "Uniform4dv"];
const I32_ENTRY_POINTS: [&str; 4] = ["Uniform1iv", "Uniform2iv", "Uniform3iv", "Uniform4iv"];
const U32_ENTRY_POINTS: [&str; 4] = ["Uniform1uiv", "Uniform2uiv", "Uniform3uiv", "Uniform4uiv"];
const I64_ENTRY_POINTS: [&str; 4] = ["Uniform1i64vARB", "Uniform2i64vARB", "Uniform3i64vARB", "Uniform4i64vARB"];
const U64_ENTRY_POINTS: [&str; 4] = ["Uniform1ui64vARB", "Uniform2ui64vARB", "Uniform3ui64vARB", "Uniform4ui64vARB"];
const MAT_F32_ENTRY_POINTS: [&str; 3] = ["UniformMatrix2fv", "UniformMatrix3fv", "UniformMatrix4fv"];
const MAT_F64_ENTRY_POINTS: [&str; 3] = ["UniformMatrix2dv", "UniformMatrix3dv", "UniformMatrix4dv"];

impl<'a> UniformValue<'a> {
    /// Name of the OpenGL entry point that sets this value.
    pub fn entry_point(&self) -> &'static str {
        match *self {
            UniformValue::F32 { components, .. } => F32_ENTRY_POINTS[components as usize - 1],
            UniformValue::F64 { components, .. } => F64_ENTRY_POINTS[components as usize - 1],
            UniformValue::I32 { components, .. } => I32_ENTRY_POINTS[components as usize - 1],
            UniformValue::U32 { components, .. } => U32_ENTRY_POINTS[components as usize - 1],
            UniformValue::I64 { components, .. } => I64_ENTRY_POINTS[components as usize - 1],
            UniformValue::U64 { components, .. } => U64_ENTRY_POINTS[components as usize - 1],
            UniformValue::MatF32 { order, .. } => MAT_F32_ENTRY_POINTS[order as usize - 2],
            UniformValue::MatF64 { order, .. } => MAT_F64_ENTRY_POINTS[order as usize - 2],
        }
    }

    /// Number of elements (vectors or matrices) in the value.
    pub fn count(&self) -> usize {
        match *self {
            UniformValue::F32 { components, data } => data.len() / components as usize,
            UniformValue::F64 { components, data } => data.len() / components as usize,
            UniformValue::I32 { components, data } => data.len() / components as usize,
            UniformValue::U32 { components, data } => data.len() / components as usize,
            UniformValue::I64 { components, data } => data.len() / components as usize,
            UniformValue::U64 { components, data } => data.len() / components as usize,
            UniformValue::MatF32 { order, data } => data.len() / (order as usize * order as usize),
            UniformValue::MatF64 { order, data } => data.len() / (order as usize * order as usize),
        }
    }
}

/// Types that can be assigned to a uniform.
pub trait Uniform: SealedUniform {
    fn value(&self) -> UniformValue<'_>;
}

macro_rules! impl_uniform_scalar {
    ($t:ty, $variant:ident) => {
        impl SealedUniform for $t {}
        impl Uniform for $t {
            fn value(&self) -> UniformValue<'_> {
                UniformValue::$variant {
                    components: 1,
                    data: std::slice::from_ref(self),
                }
            }
        }

        impl_uniform_vector!($t, $variant, 1);
        impl_uniform_vector!($t, $variant, 2);
        impl_uniform_vector!($t, $variant, 3);
        impl_uniform_vector!($t, $variant, 4);
    };
}

macro_rules! impl_uniform_vector {
    ($t:ty, $variant:ident, $n:expr) => {
        impl SealedUniform for [$t; $n] {}
        impl Uniform for [$t; $n] {
            fn value(&self) -> UniformValue<'_> {
                UniformValue::$variant {
                    components: $n,
                    data: &self[..],
                }
            }
        }
    };
}

macro_rules! impl_uniform_matrix {
    ($t:ty, $variant:ident, $n:expr) => {
        impl SealedUniform for [[$t; $n]; $n] {}
        impl Uniform for [[$t; $n]; $n] {
            fn value(&self) -> UniformValue<'_> {
                UniformValue::$variant {
                    order: $n,
                    data: bytemuck::cast_slice(&self[..]),
                }
            }
        }
    };
}

impl_uniform_scalar!(f32, F32);
impl_uniform_scalar!(f64, F64);
impl_uniform_scalar!(i32, I32);
impl_uniform_scalar!(u32, U32);
// 64-bit integers need ARB_gpu_shader_int64
impl_uniform_scalar!(i64, I64);
impl_uniform_scalar!(u64, U64);

impl_uniform_matrix!(f32, MatF32, 2);
impl_uniform_matrix!(f32, MatF32, 3);
impl_uniform_matrix!(f32, MatF32, 4);
impl_uniform_matrix!(f64, MatF64, 2);
impl_uniform_matrix!(f64, MatF64, 3);
impl_uniform_matrix!(f64, MatF64, 4);

// Uniform types from glam -------------------------------------------------------------------------

#[cfg(feature = "tether-glam")]
mod glam_impls {
    use super::{SealedUniform, Uniform, UniformValue};

    macro_rules! impl_glam {
        ($t:ty, $elem:ty, $len:expr, $variant:ident { $field:ident: $n:expr }) => {
            impl SealedUniform for $t {}
            impl Uniform for $t {
                fn value(&self) -> UniformValue<'_> {
                    let data: &[$elem; $len] = self.as_ref();
                    UniformValue::$variant {
                        $field: $n,
                        data: &data[..],
                    }
                }
            }
        };
    }

    impl_glam!(glam::Vec2, f32, 2, F32 { components: 2 });
    impl_glam!(glam::Vec3, f32, 3, F32 { components: 3 });
    impl_glam!(glam::Vec4, f32, 4, F32 { components: 4 });
    impl_glam!(glam::IVec2, i32, 2, I32 { components: 2 });
    impl_glam!(glam::IVec3, i32, 3, I32 { components: 3 });
    impl_glam!(glam::IVec4, i32, 4, I32 { components: 4 });
    impl_glam!(glam::UVec2, u32, 2, U32 { components: 2 });
    impl_glam!(glam::UVec3, u32, 3, U32 { components: 3 });
    impl_glam!(glam::UVec4, u32, 4, U32 { components: 4 });
    impl_glam!(glam::DVec2, f64, 2, F64 { components: 2 });
    impl_glam!(glam::DVec3, f64, 3, F64 { components: 3 });
    impl_glam!(glam::DVec4, f64, 4, F64 { components: 4 });
    impl_glam!(glam::Mat2, f32, 4, MatF32 { order: 2 });
    impl_glam!(glam::Mat3, f32, 9, MatF32 { order: 3 });
    impl_glam!(glam::Mat4, f32, 16, MatF32 { order: 4 });
}

//--------------------------------------------------------------------------------------------------

/// Name lookup against a program, shared by every kind of location.
#[derive(Clone)]
pub(crate) struct ProgramLocation {
    name: Cow<'static, str>,
    program: Weak<ObjectCell<ProgramInfo>>,
    resolved: Option<(Handle, u32)>,
}

impl ProgramLocation {
    pub(crate) fn new(program: &Program, name: Cow<'static, str>) -> ProgramLocation {
        ProgramLocation {
            name,
            program: Rc::downgrade(&program.cell),
            resolved: None,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Resolves the location with `lookup`. Does nothing if it's already resolved.
    ///
    /// The program must be initialized.
    pub(crate) fn resolve(
        &mut self,
        gl: &Context,
        kind: LocationKind,
        lookup: impl FnOnce(&Context, Handle, &str) -> Option<u32>,
    ) -> Result<()> {
        if self.resolved.is_some() {
            return Ok(());
        }
        let program = self.program.upgrade().ok_or_else(|| Error::DanglingProgram {
            name: self.name.to_string(),
        })?;
        if !program.is_initialized() {
            return Err(Error::NotInitialized {
                kind: ObjectKind::Program,
            });
        }
        let handle = program.handle();
        match lookup(gl, handle, &self.name) {
            Some(index) => {
                trace!(%kind, name = %self.name, program = %handle, index, "resolved location");
                self.resolved = Some((handle, index));
                Ok(())
            }
            None => {
                warn!(%kind, name = %self.name, program = %handle, "location not found");
                Err(Error::LocationNotFound {
                    name: self.name.to_string(),
                    kind,
                })
            }
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub(crate) fn index(&self) -> Option<u32> {
        self.resolved.map(|(_, index)| index)
    }

    /// Returns the index to use with the given program, if the location is resolved against it.
    ///
    /// Panics in debug builds if the location is not resolved, or belongs to another program.
    pub(crate) fn index_for(&self, program: Handle) -> Option<u32> {
        match self.resolved {
            Some((owner, index)) => {
                debug_assert!(
                    self.program.strong_count() > 0,
                    "location `{}` used after its program was dropped",
                    self.name
                );
                debug_assert_eq!(owner, program, "location `{}` belongs to another program", self.name);
                Some(index)
            }
            None => {
                debug_assert!(false, "location `{}` used before initialization", self.name);
                None
            }
        }
    }
}

impl fmt::Debug for ProgramLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Location")
            .field("name", &self.name)
            .field("index", &self.index())
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------

/// Type of sampler uniforms reading from textures bound to `T`.
pub struct Sampler<T: TextureTarget>(PhantomData<T>);

/// Location of a uniform of type `T` in a program.
pub struct UniformLocation<T> {
    inner: ProgramLocation,
    _type: PhantomData<fn(T)>,
}

impl<T> UniformLocation<T> {
    /// Creates an unresolved location. `program` does not need to be initialized yet.
    pub fn new(program: &Program, name: impl Into<Cow<'static, str>>) -> UniformLocation<T> {
        UniformLocation {
            inner: ProgramLocation::new(program, name.into()),
            _type: PhantomData,
        }
    }

    /// Looks up the location in the program. Does nothing if it's already resolved.
    pub fn initialize(&mut self, gl: &Context) -> Result<()> {
        self.inner.resolve(gl, LocationKind::Uniform, |gl, program, name| {
            gl.backend()
                .uniform_location(program, name)
                .and_then(|loc| u32::try_from(loc).ok())
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.is_resolved()
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn index(&self) -> Option<u32> {
        self.inner.index()
    }
}

impl<T> Clone for UniformLocation<T> {
    fn clone(&self) -> Self {
        UniformLocation {
            inner: self.inner.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for UniformLocation<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("UniformLocation").field(&self.inner).finish()
    }
}

impl<T> Initialize for UniformLocation<T> {
    fn initialize(&mut self, gl: &Context) -> Result<()> {
        UniformLocation::initialize(self, gl)
    }

    fn is_initialized(&self) -> bool {
        UniformLocation::is_initialized(self)
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Owned(format!("uniform `{}`", self.inner.name()))
    }
}

//--------------------------------------------------------------------------------------------------

/// Kinds of interface blocks.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BlockType {
    Uniform,
    ShaderStorage,
}

/// Interface block markers. The associated target is the indexed buffer target that backs
/// the block.
pub trait InterfaceBlock: Sealed + 'static {
    type Target: IndexedTarget;
    const TYPE: BlockType;
    const LOCATION_KIND: LocationKind;
}

/// Uniform blocks, backed by uniform buffers.
#[derive(Copy, Clone, Debug)]
pub struct UniformBlock;

/// Shader storage blocks, backed by shader storage buffers.
#[derive(Copy, Clone, Debug)]
pub struct StorageBlock;

impl Sealed for UniformBlock {}
impl Sealed for StorageBlock {}

impl InterfaceBlock for UniformBlock {
    type Target = UniformBuffer;
    const TYPE: BlockType = BlockType::Uniform;
    const LOCATION_KIND: LocationKind = LocationKind::UniformBlock;
}

impl InterfaceBlock for StorageBlock {
    type Target = ShaderStorageBuffer;
    const TYPE: BlockType = BlockType::ShaderStorage;
    const LOCATION_KIND: LocationKind = LocationKind::StorageBlock;
}

/// Location of an interface block in a program.
pub struct BlockLocation<K: InterfaceBlock> {
    inner: ProgramLocation,
    _kind: PhantomData<K>,
}

impl<K: InterfaceBlock> BlockLocation<K> {
    pub fn new(program: &Program, name: impl Into<Cow<'static, str>>) -> BlockLocation<K> {
        BlockLocation {
            inner: ProgramLocation::new(program, name.into()),
            _kind: PhantomData,
        }
    }

    pub fn initialize(&mut self, gl: &Context) -> Result<()> {
        self.inner.resolve(gl, K::LOCATION_KIND, |gl, program, name| {
            gl.backend().block_index(program, K::TYPE, name)
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.is_resolved()
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn index(&self) -> Option<u32> {
        self.inner.index()
    }
}

impl<K: InterfaceBlock> Clone for BlockLocation<K> {
    fn clone(&self) -> Self {
        BlockLocation {
            inner: self.inner.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: InterfaceBlock> fmt::Debug for BlockLocation<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("BlockLocation")
            .field(&K::TYPE)
            .field(&self.inner)
            .finish()
    }
}

impl<K: InterfaceBlock> Initialize for BlockLocation<K> {
    fn initialize(&mut self, gl: &Context) -> Result<()> {
        BlockLocation::initialize(self, gl)
    }

    fn is_initialized(&self) -> bool {
        BlockLocation::is_initialized(self)
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{} `{}`", K::LOCATION_KIND, self.inner.name()))
    }
}

//--------------------------------------------------------------------------------------------------

impl<'a> Bound<'a, Program, CurrentProgram> {
    /// Sets the value of a uniform of the bound program.
    pub fn set<T: Uniform>(&self, location: &UniformLocation<T>, value: T) {
        if !check_initialized(ObjectKind::Program, self.handle()) {
            return;
        }
        if let Some(index) = location.inner.index_for(self.handle()) {
            let value = value.value();
            trace!(name = location.name(), index, entry_point = value.entry_point(), "set uniform");
            self.context().backend().uniform(index as i32, value);
        }
    }

    /// Makes a sampler uniform read from a bound texture, on the texture unit of its guard.
    pub fn set_texture<T: TextureTarget>(
        &self,
        location: &UniformLocation<Sampler<T>>,
        texture: &Bound<Texture<T>, T>,
    ) {
        if !check_initialized(ObjectKind::Program, self.handle()) {
            return;
        }
        if let Some(index) = location.inner.index_for(self.handle()) {
            let unit = texture.slot().unit;
            trace!(name = location.name(), index, unit, texture = %texture.handle(), "set sampler");
            let backend = self.context().backend();
            backend.active_texture(unit);
            backend.uniform(
                index as i32,
                UniformValue::I32 {
                    components: 1,
                    data: &[unit as i32],
                },
            );
        }
    }

    /// Connects an interface block to the indexed binding point `binding`, and binds a buffer
    /// (or a byte range of it) there.
    pub fn set_block<K: InterfaceBlock>(
        &self,
        location: &BlockLocation<K>,
        binding: u32,
        buffer: &Bound<Buffer, K::Target>,
        range: Option<Range<usize>>,
    ) {
        if !check_initialized(ObjectKind::Program, self.handle()) {
            return;
        }
        if let Some(index) = location.inner.index_for(self.handle()) {
            trace!(name = location.name(), index, binding, buffer = %buffer.handle(), ?range, "set block");
            self.context()
                .backend()
                .block_binding(self.handle(), K::TYPE, index, binding);
            match range {
                Some(range) => buffer.bind_range(binding, range),
                None => buffer.bind_base(binding),
            }
        }
    }
}
