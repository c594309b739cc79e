//! Vertex attribute types.
use crate::sealed::SealedAttribute;

/// Component types of vertex attributes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ScalarType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl ScalarType {
    pub fn byte_size(self) -> usize {
        match self {
            ScalarType::U8 | ScalarType::I8 => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }
}

/// How the vertex shader sees an attribute, which decides the pointer call used to source it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum AttribKind {
    /// Floats, or integers converted (and possibly normalized) to floats.
    Float,
    /// Integers, read as is.
    Integer,
    /// Doubles.
    Double,
}

/// Layout of a vertex attribute in a vertex buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AttribFormat {
    pub scalar: ScalarType,
    /// Number of components, 1 to 4.
    pub components: u8,
    /// Integer components are normalized to `[0,1]` (unsigned) or `[-1,1]` (signed).
    pub normalized: bool,
}

impl AttribFormat {
    pub const fn new(scalar: ScalarType, components: u8, normalized: bool) -> AttribFormat {
        AttribFormat {
            scalar,
            components,
            normalized,
        }
    }

    pub fn kind(&self) -> AttribKind {
        match self.scalar {
            ScalarType::F32 => AttribKind::Float,
            ScalarType::F64 => AttribKind::Double,
            _ if self.normalized => AttribKind::Float,
            _ => AttribKind::Integer,
        }
    }

    /// Size of one attribute in bytes.
    pub fn byte_size(&self) -> usize {
        self.scalar.byte_size() * self.components as usize
    }
}

/// Trait implemented by types that can serve as a vertex attribute.
///
/// # Safety
///
/// `FORMAT` must describe the memory layout of the type.
pub unsafe trait VertexAttribute: SealedAttribute {
    const FORMAT: AttribFormat;
}

/// Wrapper type for normalized integer attributes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct Norm<T>(pub T);

unsafe impl<T: bytemuck::Zeroable> bytemuck::Zeroable for Norm<T> {}
unsafe impl<T: bytemuck::Pod> bytemuck::Pod for Norm<T> {}

impl From<f32> for Norm<u8> {
    fn from(v: f32) -> Self {
        Norm((v * u8::MAX as f32) as u8)
    }
}

impl From<f32> for Norm<u16> {
    fn from(v: f32) -> Self {
        Norm((v * u16::MAX as f32) as u16)
    }
}

impl From<f32> for Norm<i8> {
    fn from(v: f32) -> Self {
        Norm((v * i8::MAX as f32) as i8)
    }
}

impl From<f32> for Norm<i16> {
    fn from(v: f32) -> Self {
        Norm((v * i16::MAX as f32) as i16)
    }
}

macro_rules! impl_attrib_type {
    ($t:ty, $scalar:ident, $n:expr, $norm:expr) => {
        impl SealedAttribute for $t {}
        unsafe impl VertexAttribute for $t {
            const FORMAT: AttribFormat = AttribFormat::new(ScalarType::$scalar, $n, $norm);
        }
    };
}

macro_rules! impl_attrib_types {
    ($t:ty, $scalar:ident, $norm:expr) => {
        impl_attrib_type!($t, $scalar, 1, $norm);
        impl_attrib_type!([$t; 1], $scalar, 1, $norm);
        impl_attrib_type!([$t; 2], $scalar, 2, $norm);
        impl_attrib_type!([$t; 3], $scalar, 3, $norm);
        impl_attrib_type!([$t; 4], $scalar, 4, $norm);
    };
}

impl_attrib_types!(f32, F32, false);
impl_attrib_types!(f64, F64, false);
impl_attrib_types!(u32, U32, false);
impl_attrib_types!(i32, I32, false);
impl_attrib_types!(u16, U16, false);
impl_attrib_types!(i16, I16, false);
impl_attrib_types!(u8, U8, false);
impl_attrib_types!(i8, I8, false);
impl_attrib_types!(Norm<u8>, U8, true);
impl_attrib_types!(Norm<i8>, I8, true);
impl_attrib_types!(Norm<u16>, U16, true);
impl_attrib_types!(Norm<i16>, I16, true);

// Vertex types from glam --------------------------------------------------------------------------

#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::Vec2, F32, 2, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::Vec3, F32, 3, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::Vec4, F32, 4, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::IVec2, I32, 2, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::IVec3, I32, 3, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::IVec4, I32, 4, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::UVec2, U32, 2, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::UVec3, U32, 3, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::UVec4, U32, 4, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::DVec2, F64, 2, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::DVec3, F64, 3, false);
#[cfg(feature = "tether-glam")]
impl_attrib_type!(glam::DVec4, F64, 4, false);
