//! Type-state resource binding over bind-then-operate graphics APIs.
//!
//! Objects of the underlying API (buffers, textures, programs...) are modified by binding
//! them to a target slot of the context, then calling an entry point that acts on whatever is
//! bound there. This crate makes that binding explicit: operations that act on a bound object
//! take a binding guard ([`Bound`]) as proof that the object is bound, guards restore the
//! previous state of their slot when dropped, and legal (object, target) combinations are
//! checked at compile time.

// allows generated code to refer to `::tether` from within the crate
extern crate self as tether;

#[macro_use]
mod handle;

pub mod backend;
mod binding;
mod buffer;
mod context;
mod draw;
mod error;
mod format;
mod framebuffer;
mod init;
mod renderbuffer;
pub mod sampling;
mod sealed;
pub mod shader;
pub mod target;
mod texture;
pub mod uniform;
pub mod vertex;
mod vertex_array;

pub use crate::backend::mock::MockBackend;
pub use crate::backend::Backend;
pub use crate::binding::Bind;
pub use crate::binding::Bound;
pub use crate::binding::RestorePolicy;
pub use crate::buffer::Buffer;
pub use crate::buffer::BufferInfo;
pub use crate::buffer::BufferUsage;
pub use crate::context::Context;
pub use crate::context::ContextConfig;
pub use crate::draw::{draw, draw_indexed, draw_indexed_instanced, draw_instanced};
pub use crate::draw::{IndexFormat, IndexType, Primitive};
pub use crate::error::{BuildStage, Error, LocationKind, Result};
pub use crate::format::{FormatInfo, PixelFormat};
pub use crate::framebuffer::{blit, Attachment, ClearMask, ClearValues, Rect};
pub use crate::framebuffer::{Framebuffer, FramebufferBuilder, FramebufferInfo, FramebufferStatus};
pub use crate::handle::{Handle, ObjectData, ObjectKind, Resource};
pub use crate::init::{initialize_all, Initialize};
pub use crate::renderbuffer::{Renderbuffer, RenderbufferInfo};
pub use crate::sampling::{Filter, SamplerDescription, TextureParameter};
pub use crate::shader::{ComputeShader, FragmentShader, GeometryShader, TessControlShader, TessEvaluationShader, VertexShader};
pub use crate::shader::{Program, ProgramInfo, Shader, ShaderInfo, ShaderStage};
pub use crate::texture::{CubeFace, TexImage, Texture, TextureInfo};
pub use crate::texture::{Texture1d, Texture2d, Texture2dArray, Texture3d, TextureCube};
pub use crate::uniform::{BlockLocation, Sampler, StorageBlock, Uniform, UniformBlock, UniformLocation};
pub use crate::vertex::{Norm, VertexAttribute};
pub use crate::vertex_array::{AttributeLocation, VertexArray, VertexArrayInfo};

pub use tether_macros::Initialize;

#[doc(hidden)]
pub mod derive_helpers {
    pub use crate::init::element_failed;
}
