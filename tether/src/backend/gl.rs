//! OpenGL 4.5 core backend, over bindings generated at build time.
use crate::backend::Backend;
use crate::buffer::BufferUsage;
use crate::draw::{IndexFormat, Primitive};
use crate::format::PixelFormat;
use crate::framebuffer::{Attachment, ClearMask, ClearValues, FramebufferStatus, Rect};
use crate::handle::{Handle, ObjectKind};
use crate::sampling::{Filter, SamplerAddressMode, SamplerMipmapMode, TextureParameter};
use crate::shader::ShaderStage;
use crate::target::{Slot, TargetClass, TargetId};
use crate::texture::TexImage;
use crate::uniform::{BlockType, UniformValue};
use crate::vertex::{AttribFormat, AttribKind, ScalarType};
use std::cell::Cell;
use std::ffi::CString;
use std::ops::Range;
use std::os::raw::c_void;
use std::ptr;
use tracing::error;

#[allow(clippy::all, non_upper_case_globals, non_snake_case, non_camel_case_types, dead_code, missing_docs)]
pub mod api {
    include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
}

use self::api as gl;
use self::api::types::*;
use self::api::Gl;

/// Configuration of the OpenGL backend.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub struct GlBackendConfig {
    /// Call `glGetError` after every call and log the errors.
    pub check_errors: bool,
}

impl Default for GlBackendConfig {
    fn default() -> Self {
        GlBackendConfig {
            check_errors: cfg!(debug_assertions),
        }
    }
}

pub struct GlBackend {
    gl: Gl,
    config: GlBackendConfig,
    /// Last unit passed to `glActiveTexture`, `None` when unknown.
    active_unit: Cell<Option<u32>>,
    /// Whether ARB_gpu_shader_int64 entry points were loaded.
    int64_uniforms: bool,
}

//--------------------------------------------------------------------------------------------------
// Enum mappings

fn target_to_glenum(target: TargetId) -> GLenum {
    match target {
        TargetId::ArrayBuffer => gl::ARRAY_BUFFER,
        TargetId::ElementArrayBuffer => gl::ELEMENT_ARRAY_BUFFER,
        TargetId::UniformBuffer => gl::UNIFORM_BUFFER,
        TargetId::ShaderStorageBuffer => gl::SHADER_STORAGE_BUFFER,
        TargetId::CopyReadBuffer => gl::COPY_READ_BUFFER,
        TargetId::CopyWriteBuffer => gl::COPY_WRITE_BUFFER,
        TargetId::PixelPackBuffer => gl::PIXEL_PACK_BUFFER,
        TargetId::PixelUnpackBuffer => gl::PIXEL_UNPACK_BUFFER,
        TargetId::DrawIndirectBuffer => gl::DRAW_INDIRECT_BUFFER,
        TargetId::DispatchIndirectBuffer => gl::DISPATCH_INDIRECT_BUFFER,
        TargetId::TextureBuffer => gl::TEXTURE_BUFFER,
        TargetId::TransformFeedbackBuffer => gl::TRANSFORM_FEEDBACK_BUFFER,
        TargetId::AtomicCounterBuffer => gl::ATOMIC_COUNTER_BUFFER,
        TargetId::QueryBuffer => gl::QUERY_BUFFER,
        TargetId::Texture1D => gl::TEXTURE_1D,
        TargetId::Texture2D => gl::TEXTURE_2D,
        TargetId::Texture3D => gl::TEXTURE_3D,
        TargetId::Texture2DArray => gl::TEXTURE_2D_ARRAY,
        TargetId::TextureCubeMap => gl::TEXTURE_CUBE_MAP,
        TargetId::DrawFramebuffer => gl::DRAW_FRAMEBUFFER,
        TargetId::ReadFramebuffer => gl::READ_FRAMEBUFFER,
        TargetId::RenderbufferTarget => gl::RENDERBUFFER,
        // not targets in GL: bound with glUseProgram and glBindVertexArray
        TargetId::CurrentProgram | TargetId::CurrentVertexArray => 0,
    }
}

/// The `glGetIntegerv` parameter that returns the object bound to a target.
fn binding_query(target: TargetId) -> GLenum {
    match target {
        TargetId::ArrayBuffer => gl::ARRAY_BUFFER_BINDING,
        TargetId::ElementArrayBuffer => gl::ELEMENT_ARRAY_BUFFER_BINDING,
        TargetId::UniformBuffer => gl::UNIFORM_BUFFER_BINDING,
        TargetId::ShaderStorageBuffer => gl::SHADER_STORAGE_BUFFER_BINDING,
        TargetId::CopyReadBuffer => gl::COPY_READ_BUFFER_BINDING,
        TargetId::CopyWriteBuffer => gl::COPY_WRITE_BUFFER_BINDING,
        TargetId::PixelPackBuffer => gl::PIXEL_PACK_BUFFER_BINDING,
        TargetId::PixelUnpackBuffer => gl::PIXEL_UNPACK_BUFFER_BINDING,
        TargetId::DrawIndirectBuffer => gl::DRAW_INDIRECT_BUFFER_BINDING,
        TargetId::DispatchIndirectBuffer => gl::DISPATCH_INDIRECT_BUFFER_BINDING,
        TargetId::TextureBuffer => gl::TEXTURE_BUFFER_BINDING,
        TargetId::TransformFeedbackBuffer => gl::TRANSFORM_FEEDBACK_BUFFER_BINDING,
        TargetId::AtomicCounterBuffer => gl::ATOMIC_COUNTER_BUFFER_BINDING,
        TargetId::QueryBuffer => gl::QUERY_BUFFER_BINDING,
        TargetId::Texture1D => gl::TEXTURE_BINDING_1D,
        TargetId::Texture2D => gl::TEXTURE_BINDING_2D,
        TargetId::Texture3D => gl::TEXTURE_BINDING_3D,
        TargetId::Texture2DArray => gl::TEXTURE_BINDING_2D_ARRAY,
        TargetId::TextureCubeMap => gl::TEXTURE_BINDING_CUBE_MAP,
        TargetId::DrawFramebuffer => gl::DRAW_FRAMEBUFFER_BINDING,
        TargetId::ReadFramebuffer => gl::READ_FRAMEBUFFER_BINDING,
        TargetId::RenderbufferTarget => gl::RENDERBUFFER_BINDING,
        TargetId::CurrentProgram => gl::CURRENT_PROGRAM,
        TargetId::CurrentVertexArray => gl::VERTEX_ARRAY_BINDING,
    }
}

fn usage_to_glenum(usage: BufferUsage) -> GLenum {
    match usage {
        BufferUsage::StaticDraw => gl::STATIC_DRAW,
        BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
        BufferUsage::StreamDraw => gl::STREAM_DRAW,
        BufferUsage::StaticRead => gl::STATIC_READ,
        BufferUsage::DynamicRead => gl::DYNAMIC_READ,
        BufferUsage::StreamRead => gl::STREAM_READ,
        BufferUsage::StaticCopy => gl::STATIC_COPY,
        BufferUsage::DynamicCopy => gl::DYNAMIC_COPY,
        BufferUsage::StreamCopy => gl::STREAM_COPY,
    }
}

fn stage_to_glenum(stage: ShaderStage) -> GLenum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        ShaderStage::Geometry => gl::GEOMETRY_SHADER,
        ShaderStage::TessControl => gl::TESS_CONTROL_SHADER,
        ShaderStage::TessEvaluation => gl::TESS_EVALUATION_SHADER,
        ShaderStage::Compute => gl::COMPUTE_SHADER,
    }
}

/// OpenGL description of a pixel format.
struct GlFormatInfo {
    internal_fmt: GLenum,
    upload_components: GLenum,
    upload_ty: GLenum,
}

fn format_info(format: PixelFormat) -> GlFormatInfo {
    use PixelFormat::*;
    let (internal_fmt, upload_components, upload_ty) = match format {
        R8 => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
        Rg8 => (gl::RG8, gl::RG, gl::UNSIGNED_BYTE),
        Rgb8 => (gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
        Rgba8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
        Srgb8 => (gl::SRGB8, gl::RGB, gl::UNSIGNED_BYTE),
        Srgb8Alpha8 => (gl::SRGB8_ALPHA8, gl::RGBA, gl::UNSIGNED_BYTE),
        R16F => (gl::R16F, gl::RED, gl::HALF_FLOAT),
        Rg16F => (gl::RG16F, gl::RG, gl::HALF_FLOAT),
        Rgba16F => (gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT),
        R32F => (gl::R32F, gl::RED, gl::FLOAT),
        Rg32F => (gl::RG32F, gl::RG, gl::FLOAT),
        Rgb32F => (gl::RGB32F, gl::RGB, gl::FLOAT),
        Rgba32F => (gl::RGBA32F, gl::RGBA, gl::FLOAT),
        R32UI => (gl::R32UI, gl::RED_INTEGER, gl::UNSIGNED_INT),
        Rgba32UI => (gl::RGBA32UI, gl::RGBA_INTEGER, gl::UNSIGNED_INT),
        Depth16 => (gl::DEPTH_COMPONENT16, gl::DEPTH_COMPONENT, gl::UNSIGNED_SHORT),
        Depth24 => (gl::DEPTH_COMPONENT24, gl::DEPTH_COMPONENT, gl::UNSIGNED_INT),
        Depth32F => (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
        Depth24Stencil8 => (gl::DEPTH24_STENCIL8, gl::DEPTH_STENCIL, gl::UNSIGNED_INT_24_8),
        Depth32FStencil8 => (
            gl::DEPTH32F_STENCIL8,
            gl::DEPTH_STENCIL,
            gl::FLOAT_32_UNSIGNED_INT_24_8_REV,
        ),
    };
    GlFormatInfo {
        internal_fmt,
        upload_components,
        upload_ty,
    }
}

fn min_filter_to_glenum(filter: Filter, mipmap_mode: Option<SamplerMipmapMode>) -> GLenum {
    match (filter, mipmap_mode) {
        (Filter::Nearest, None) => gl::NEAREST,
        (Filter::Linear, None) => gl::LINEAR,
        (Filter::Nearest, Some(SamplerMipmapMode::Linear)) => gl::NEAREST_MIPMAP_LINEAR,
        (Filter::Linear, Some(SamplerMipmapMode::Linear)) => gl::LINEAR_MIPMAP_LINEAR,
        (Filter::Nearest, Some(SamplerMipmapMode::Nearest)) => gl::NEAREST_MIPMAP_NEAREST,
        (Filter::Linear, Some(SamplerMipmapMode::Nearest)) => gl::LINEAR_MIPMAP_NEAREST,
    }
}

fn filter_to_glenum(filter: Filter) -> GLenum {
    match filter {
        Filter::Nearest => gl::NEAREST,
        Filter::Linear => gl::LINEAR,
    }
}

fn address_mode_to_glenum(mode: SamplerAddressMode) -> GLenum {
    match mode {
        SamplerAddressMode::Clamp => gl::CLAMP_TO_EDGE,
        SamplerAddressMode::Mirror => gl::MIRRORED_REPEAT,
        SamplerAddressMode::Wrap => gl::REPEAT,
    }
}

fn attachment_to_glenum(attachment: Attachment) -> GLenum {
    match attachment {
        Attachment::Color(index) => gl::COLOR_ATTACHMENT0 + index,
        Attachment::Depth => gl::DEPTH_ATTACHMENT,
        Attachment::Stencil => gl::STENCIL_ATTACHMENT,
        Attachment::DepthStencil => gl::DEPTH_STENCIL_ATTACHMENT,
    }
}

fn framebuffer_status_from_glenum(status: GLenum) -> FramebufferStatus {
    match status {
        gl::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
        gl::FRAMEBUFFER_UNDEFINED => FramebufferStatus::Undefined,
        gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
        gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::IncompleteMissingAttachment,
        gl::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => FramebufferStatus::IncompleteDrawBuffer,
        gl::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => FramebufferStatus::IncompleteReadBuffer,
        gl::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
        gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
        gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => FramebufferStatus::IncompleteLayerTargets,
        other => FramebufferStatus::Unknown(other),
    }
}

fn clear_mask_to_glbitfield(mask: ClearMask) -> GLbitfield {
    let mut bits = 0;
    if mask.contains(ClearMask::COLOR) {
        bits |= gl::COLOR_BUFFER_BIT;
    }
    if mask.contains(ClearMask::DEPTH) {
        bits |= gl::DEPTH_BUFFER_BIT;
    }
    if mask.contains(ClearMask::STENCIL) {
        bits |= gl::STENCIL_BUFFER_BIT;
    }
    bits
}

fn primitive_to_glenum(mode: Primitive) -> GLenum {
    match mode {
        Primitive::Points => gl::POINTS,
        Primitive::Lines => gl::LINES,
        Primitive::LineStrip => gl::LINE_STRIP,
        Primitive::LineLoop => gl::LINE_LOOP,
        Primitive::Triangles => gl::TRIANGLES,
        Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
        Primitive::TriangleFan => gl::TRIANGLE_FAN,
        Primitive::Patches => gl::PATCHES,
    }
}

fn index_format_to_glenum(format: IndexFormat) -> GLenum {
    match format {
        IndexFormat::U8 => gl::UNSIGNED_BYTE,
        IndexFormat::U16 => gl::UNSIGNED_SHORT,
        IndexFormat::U32 => gl::UNSIGNED_INT,
    }
}

fn scalar_to_glenum(scalar: ScalarType) -> GLenum {
    match scalar {
        ScalarType::U8 => gl::UNSIGNED_BYTE,
        ScalarType::I8 => gl::BYTE,
        ScalarType::U16 => gl::UNSIGNED_SHORT,
        ScalarType::I16 => gl::SHORT,
        ScalarType::U32 => gl::UNSIGNED_INT,
        ScalarType::I32 => gl::INT,
        ScalarType::F32 => gl::FLOAT,
        ScalarType::F64 => gl::DOUBLE,
    }
}

fn error_name(code: GLenum) -> &'static str {
    match code {
        gl::INVALID_ENUM => "GL_INVALID_ENUM",
        gl::INVALID_VALUE => "GL_INVALID_VALUE",
        gl::INVALID_OPERATION => "GL_INVALID_OPERATION",
        gl::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        gl::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        gl::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        gl::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        _ => "unknown GL error",
    }
}

//--------------------------------------------------------------------------------------------------
// Uniform setters, indexed by number of components (or matrix order - 2)

type UniformFv = unsafe fn(&Gl, GLint, GLsizei, *const GLfloat);
type UniformDv = unsafe fn(&Gl, GLint, GLsizei, *const GLdouble);
type UniformIv = unsafe fn(&Gl, GLint, GLsizei, *const GLint);
type UniformUiv = unsafe fn(&Gl, GLint, GLsizei, *const GLuint);
type UniformI64v = unsafe fn(&Gl, GLint, GLsizei, *const GLint64);
type UniformUi64v = unsafe fn(&Gl, GLint, GLsizei, *const GLuint64);
type UniformMatrixFv = unsafe fn(&Gl, GLint, GLsizei, GLboolean, *const GLfloat);
type UniformMatrixDv = unsafe fn(&Gl, GLint, GLsizei, GLboolean, *const GLdouble);

const UNIFORM_FV: [UniformFv; 4] = [Gl::Uniform1fv, Gl::Uniform2fv, Gl::Uniform3fv, Gl::Uniform4fv];
const UNIFORM_DV: [UniformDv; 4] = [Gl::Uniform1dv, Gl::Uniform2dv, Gl::Uniform3dv, Gl::Uniform4dv];
const UNIFORM_IV: [UniformIv; 4] = [Gl::Uniform1iv, Gl::Uniform2iv, Gl::Uniform3iv, Gl::Uniform4iv];
const UNIFORM_UIV: [UniformUiv; 4] = [Gl::Uniform1uiv, Gl::Uniform2uiv, Gl::Uniform3uiv, Gl::Uniform4uiv];
const UNIFORM_I64V: [UniformI64v; 4] = [Gl::Uniform1i64vARB, Gl::Uniform2i64vARB, Gl::Uniform3i64vARB, Gl::Uniform4i64vARB];
const UNIFORM_UI64V: [UniformUi64v; 4] = [Gl::Uniform1ui64vARB, Gl::Uniform2ui64vARB, Gl::Uniform3ui64vARB, Gl::Uniform4ui64vARB];
const UNIFORM_MATRIX_FV: [UniformMatrixFv; 3] = [Gl::UniformMatrix2fv, Gl::UniformMatrix3fv, Gl::UniformMatrix4fv];
const UNIFORM_MATRIX_DV: [UniformMatrixDv; 3] = [Gl::UniformMatrix2dv, Gl::UniformMatrix3dv, Gl::UniformMatrix4dv];

//--------------------------------------------------------------------------------------------------

fn info_log(log_buf: Vec<u8>) -> String {
    String::from_utf8_lossy(&log_buf).trim_end_matches('\0').to_string()
}

impl GlBackend {
    /// Loads the OpenGL entry points with `loadfn` (usually the `get_proc_address` function of
    /// the windowing library).
    ///
    /// # Safety
    ///
    /// The OpenGL context the entry points are loaded from must be current on the calling
    /// thread whenever the backend is used.
    pub unsafe fn load_with<F>(mut loadfn: F, config: GlBackendConfig) -> GlBackend
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        let mut int64_uniforms = false;
        let gl = Gl::load_with(|name| {
            let ptr = loadfn(name);
            if name == "glUniform1i64vARB" {
                int64_uniforms = !ptr.is_null();
            }
            ptr
        });
        GlBackend {
            gl,
            config,
            active_unit: Cell::new(Some(0)),
            int64_uniforms,
        }
    }

    /// The raw entry points.
    pub fn api(&self) -> &Gl {
        &self.gl
    }

    /// Logs the pending OpenGL errors, if error checking is enabled.
    fn check(&self, what: &'static str) {
        if !self.config.check_errors {
            return;
        }
        // bounded: a lost context may report errors forever
        for _ in 0..16 {
            let code = unsafe { self.gl.GetError() };
            if code == gl::NO_ERROR {
                break;
            }
            error!(call = what, error = error_name(code), code, "OpenGL error");
        }
    }

    fn activate_unit(&self, unit: u32) {
        if self.active_unit.get() != Some(unit) {
            unsafe { self.gl.ActiveTexture(gl::TEXTURE0 + unit) }
            self.active_unit.set(Some(unit));
        }
    }

    fn get_integer(&self, pname: GLenum) -> GLint {
        let mut value = 0;
        unsafe { self.gl.GetIntegerv(pname, &mut value) };
        value
    }
}

impl Backend for GlBackend {
    fn generate(&self, kind: ObjectKind) -> Handle {
        let mut obj = 0;
        unsafe {
            match kind {
                ObjectKind::Buffer => self.gl.GenBuffers(1, &mut obj),
                ObjectKind::Texture => self.gl.GenTextures(1, &mut obj),
                ObjectKind::Framebuffer => self.gl.GenFramebuffers(1, &mut obj),
                ObjectKind::Renderbuffer => self.gl.GenRenderbuffers(1, &mut obj),
                ObjectKind::VertexArray => self.gl.GenVertexArrays(1, &mut obj),
                ObjectKind::Program => obj = self.gl.CreateProgram(),
                ObjectKind::Shader(stage) => obj = self.gl.CreateShader(stage_to_glenum(stage)),
            }
        }
        self.check("generate");
        Handle(obj)
    }

    fn delete(&self, kind: ObjectKind, handle: Handle) {
        let obj = handle.0;
        unsafe {
            match kind {
                ObjectKind::Buffer => self.gl.DeleteBuffers(1, &obj),
                ObjectKind::Texture => self.gl.DeleteTextures(1, &obj),
                ObjectKind::Framebuffer => self.gl.DeleteFramebuffers(1, &obj),
                ObjectKind::Renderbuffer => self.gl.DeleteRenderbuffers(1, &obj),
                ObjectKind::VertexArray => self.gl.DeleteVertexArrays(1, &obj),
                ObjectKind::Program => self.gl.DeleteProgram(obj),
                ObjectKind::Shader(_) => self.gl.DeleteShader(obj),
            }
        }
        self.check("delete");
    }

    fn bind(&self, slot: Slot, handle: Handle) {
        let target = target_to_glenum(slot.target);
        unsafe {
            match slot.target.class() {
                TargetClass::Buffer => self.gl.BindBuffer(target, handle.0),
                TargetClass::Texture => {
                    self.activate_unit(slot.unit);
                    self.gl.BindTexture(target, handle.0)
                }
                TargetClass::Framebuffer => self.gl.BindFramebuffer(target, handle.0),
                TargetClass::Renderbuffer => self.gl.BindRenderbuffer(target, handle.0),
                TargetClass::Program => self.gl.UseProgram(handle.0),
                TargetClass::VertexArray => self.gl.BindVertexArray(handle.0),
            }
        }
        self.check("bind");
    }

    fn binding(&self, slot: Slot) -> Handle {
        if slot.target.class() == TargetClass::Texture {
            self.activate_unit(slot.unit);
        }
        Handle(self.get_integer(binding_query(slot.target)) as u32)
    }

    fn bind_buffer_range(&self, target: TargetId, index: u32, buffer: Handle, range: Option<Range<usize>>) {
        let target = target_to_glenum(target);
        unsafe {
            match range {
                Some(range) => self.gl.BindBufferRange(
                    target,
                    index,
                    buffer.0,
                    range.start as GLintptr,
                    (range.end - range.start) as GLsizeiptr,
                ),
                None => self.gl.BindBufferBase(target, index, buffer.0),
            }
        }
        self.check("bind_buffer_range");
    }

    fn active_texture(&self, unit: u32) {
        self.activate_unit(unit);
    }

    fn buffer_data(&self, target: TargetId, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        let ptr = data.map_or(ptr::null(), |data| data.as_ptr() as *const c_void);
        unsafe {
            self.gl
                .BufferData(target_to_glenum(target), size as GLsizeiptr, ptr, usage_to_glenum(usage))
        }
        self.check("buffer_data");
    }

    fn buffer_sub_data(&self, target: TargetId, offset: usize, data: &[u8]) {
        unsafe {
            self.gl.BufferSubData(
                target_to_glenum(target),
                offset as GLintptr,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
            )
        }
        self.check("buffer_sub_data");
    }

    fn tex_image(&self, slot: Slot, image: &TexImage) {
        self.activate_unit(slot.unit);
        let fmt = format_info(image.format);
        let ptr = image.data.map_or(ptr::null(), |data| data.as_ptr() as *const c_void);
        let [width, height, depth] = image.extent;
        let level = image.level as GLint;
        unsafe {
            // client data is tightly packed
            let prev_unpack_alignment = self.get_integer(gl::UNPACK_ALIGNMENT);
            self.gl.PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            match slot.target {
                TargetId::Texture1D => self.gl.TexImage1D(
                    gl::TEXTURE_1D,
                    level,
                    fmt.internal_fmt as GLint,
                    width as GLsizei,
                    0,
                    fmt.upload_components,
                    fmt.upload_ty,
                    ptr,
                ),
                TargetId::Texture2D | TargetId::TextureCubeMap => {
                    let target = match image.face {
                        Some(face) => gl::TEXTURE_CUBE_MAP_POSITIVE_X + face.layer(),
                        None => gl::TEXTURE_2D,
                    };
                    self.gl.TexImage2D(
                        target,
                        level,
                        fmt.internal_fmt as GLint,
                        width as GLsizei,
                        height as GLsizei,
                        0,
                        fmt.upload_components,
                        fmt.upload_ty,
                        ptr,
                    )
                }
                TargetId::Texture3D | TargetId::Texture2DArray => self.gl.TexImage3D(
                    target_to_glenum(slot.target),
                    level,
                    fmt.internal_fmt as GLint,
                    width as GLsizei,
                    height as GLsizei,
                    depth as GLsizei,
                    0,
                    fmt.upload_components,
                    fmt.upload_ty,
                    ptr,
                ),
                other => unreachable!("{:?} is not a texture target", other),
            }
            self.gl.PixelStorei(gl::UNPACK_ALIGNMENT, prev_unpack_alignment);
        }
        self.check("tex_image");
    }

    fn tex_parameter(&self, slot: Slot, param: TextureParameter) {
        self.activate_unit(slot.unit);
        let target = target_to_glenum(slot.target);
        unsafe {
            match param {
                TextureParameter::MinFilter(filter, mipmap_mode) => self.gl.TexParameteri(
                    target,
                    gl::TEXTURE_MIN_FILTER,
                    min_filter_to_glenum(filter, mipmap_mode) as GLint,
                ),
                TextureParameter::MagFilter(filter) => {
                    self.gl
                        .TexParameteri(target, gl::TEXTURE_MAG_FILTER, filter_to_glenum(filter) as GLint)
                }
                TextureParameter::WrapS(mode) => {
                    self.gl
                        .TexParameteri(target, gl::TEXTURE_WRAP_S, address_mode_to_glenum(mode) as GLint)
                }
                TextureParameter::WrapT(mode) => {
                    self.gl
                        .TexParameteri(target, gl::TEXTURE_WRAP_T, address_mode_to_glenum(mode) as GLint)
                }
                TextureParameter::WrapR(mode) => {
                    self.gl
                        .TexParameteri(target, gl::TEXTURE_WRAP_R, address_mode_to_glenum(mode) as GLint)
                }
                TextureParameter::BaseLevel(level) => {
                    self.gl.TexParameteri(target, gl::TEXTURE_BASE_LEVEL, level as GLint)
                }
                TextureParameter::MaxLevel(level) => {
                    self.gl.TexParameteri(target, gl::TEXTURE_MAX_LEVEL, level as GLint)
                }
                TextureParameter::BorderColor(color) => {
                    self.gl
                        .TexParameterfv(target, gl::TEXTURE_BORDER_COLOR, color.as_ptr())
                }
            }
        }
        self.check("tex_parameter");
    }

    fn generate_mipmap(&self, slot: Slot) {
        self.activate_unit(slot.unit);
        unsafe { self.gl.GenerateMipmap(target_to_glenum(slot.target)) }
        self.check("generate_mipmap");
    }

    fn renderbuffer_storage(&self, format: PixelFormat, width: u32, height: u32, samples: u32) {
        let internal_fmt = format_info(format).internal_fmt;
        unsafe {
            if samples > 0 {
                self.gl.RenderbufferStorageMultisample(
                    gl::RENDERBUFFER,
                    samples as GLsizei,
                    internal_fmt,
                    width as GLsizei,
                    height as GLsizei,
                )
            } else {
                self.gl
                    .RenderbufferStorage(gl::RENDERBUFFER, internal_fmt, width as GLsizei, height as GLsizei)
            }
        }
        self.check("renderbuffer_storage");
    }

    fn framebuffer_texture(&self, target: TargetId, attachment: Attachment, texture: Handle, level: u32, layer: Option<u32>) {
        let target = target_to_glenum(target);
        let attachment = attachment_to_glenum(attachment);
        unsafe {
            match layer {
                Some(layer) => self.gl.FramebufferTextureLayer(
                    target,
                    attachment,
                    texture.0,
                    level as GLint,
                    layer as GLint,
                ),
                None => self
                    .gl
                    .FramebufferTexture(target, attachment, texture.0, level as GLint),
            }
        }
        self.check("framebuffer_texture");
    }

    fn framebuffer_renderbuffer(&self, target: TargetId, attachment: Attachment, renderbuffer: Handle) {
        unsafe {
            self.gl.FramebufferRenderbuffer(
                target_to_glenum(target),
                attachment_to_glenum(attachment),
                gl::RENDERBUFFER,
                renderbuffer.0,
            )
        }
        self.check("framebuffer_renderbuffer");
    }

    fn framebuffer_status(&self, target: TargetId) -> FramebufferStatus {
        let status = unsafe { self.gl.CheckFramebufferStatus(target_to_glenum(target)) };
        self.check("framebuffer_status");
        framebuffer_status_from_glenum(status)
    }

    fn draw_buffers(&self, attachments: &[Attachment]) {
        let buffers: Vec<GLenum> = attachments.iter().map(|&a| attachment_to_glenum(a)).collect();
        unsafe { self.gl.DrawBuffers(buffers.len() as GLsizei, buffers.as_ptr()) }
        self.check("draw_buffers");
    }

    fn clear(&self, values: &ClearValues) {
        // glClearBuffer* doesn't touch the clear color/depth/stencil state
        unsafe {
            if let Some(color) = values.color {
                self.gl.ClearBufferfv(gl::COLOR, 0, color.as_ptr());
            }
            match (values.depth, values.stencil) {
                (Some(depth), Some(stencil)) => self.gl.ClearBufferfi(gl::DEPTH_STENCIL, 0, depth, stencil),
                (Some(depth), None) => self.gl.ClearBufferfv(gl::DEPTH, 0, &depth),
                (None, Some(stencil)) => self.gl.ClearBufferiv(gl::STENCIL, 0, &stencil),
                (None, None) => {}
            }
        }
        self.check("clear");
    }

    fn blit_framebuffer(&self, src: Rect, dst: Rect, mask: ClearMask, filter: Filter) {
        unsafe {
            self.gl.BlitFramebuffer(
                src.x,
                src.y,
                src.x + src.width,
                src.y + src.height,
                dst.x,
                dst.y,
                dst.x + dst.width,
                dst.y + dst.height,
                clear_mask_to_glbitfield(mask),
                filter_to_glenum(filter),
            )
        }
        self.check("blit_framebuffer");
    }

    fn compile_shader(&self, shader: Handle, source: &str) -> Result<(), String> {
        let obj = shader.0;
        unsafe {
            let srcs = [source.as_ptr() as *const GLchar];
            let lens = [source.len() as GLint];
            self.gl.ShaderSource(obj, 1, srcs.as_ptr(), lens.as_ptr());
            self.gl.CompileShader(obj);
            let mut status: GLint = 0;
            self.gl.GetShaderiv(obj, gl::COMPILE_STATUS, &mut status);
            self.check("compile_shader");
            if status == gl::TRUE as GLint {
                return Ok(());
            }
            let mut log_size: GLint = 0;
            self.gl.GetShaderiv(obj, gl::INFO_LOG_LENGTH, &mut log_size);
            let mut log_buf: Vec<u8> = vec![0; log_size.max(1) as usize];
            let mut written: GLsizei = 0;
            self.gl.GetShaderInfoLog(
                obj,
                log_buf.len() as GLsizei,
                &mut written,
                log_buf.as_mut_ptr() as *mut GLchar,
            );
            log_buf.truncate(written as usize);
            Err(info_log(log_buf))
        }
    }

    fn link_program(&self, program: Handle, shaders: &[Handle]) -> Result<(), String> {
        let obj = program.0;
        unsafe {
            for shader in shaders {
                self.gl.AttachShader(obj, shader.0);
            }
            self.gl.LinkProgram(obj);
            for shader in shaders {
                self.gl.DetachShader(obj, shader.0);
            }
            let mut status: GLint = 0;
            self.gl.GetProgramiv(obj, gl::LINK_STATUS, &mut status);
            self.check("link_program");
            if status == gl::TRUE as GLint {
                return Ok(());
            }
            let mut log_size: GLint = 0;
            self.gl.GetProgramiv(obj, gl::INFO_LOG_LENGTH, &mut log_size);
            let mut log_buf: Vec<u8> = vec![0; log_size.max(1) as usize];
            let mut written: GLsizei = 0;
            self.gl.GetProgramInfoLog(
                obj,
                log_buf.len() as GLsizei,
                &mut written,
                log_buf.as_mut_ptr() as *mut GLchar,
            );
            log_buf.truncate(written as usize);
            Err(info_log(log_buf))
        }
    }

    fn uniform_location(&self, program: Handle, name: &str) -> Option<i32> {
        let name = CString::new(name).ok()?;
        let location = unsafe { self.gl.GetUniformLocation(program.0, name.as_ptr()) };
        self.check("uniform_location");
        if location < 0 {
            None
        } else {
            Some(location)
        }
    }

    fn attribute_location(&self, program: Handle, name: &str) -> Option<u32> {
        let name = CString::new(name).ok()?;
        let location = unsafe { self.gl.GetAttribLocation(program.0, name.as_ptr()) };
        self.check("attribute_location");
        if location < 0 {
            None
        } else {
            Some(location as u32)
        }
    }

    fn block_index(&self, program: Handle, ty: BlockType, name: &str) -> Option<u32> {
        let name = CString::new(name).ok()?;
        let index = unsafe {
            match ty {
                BlockType::Uniform => self.gl.GetUniformBlockIndex(program.0, name.as_ptr()),
                BlockType::ShaderStorage => {
                    self.gl
                        .GetProgramResourceIndex(program.0, gl::SHADER_STORAGE_BLOCK, name.as_ptr())
                }
            }
        };
        self.check("block_index");
        if index == gl::INVALID_INDEX {
            None
        } else {
            Some(index)
        }
    }

    fn block_binding(&self, program: Handle, ty: BlockType, block: u32, binding: u32) {
        unsafe {
            match ty {
                BlockType::Uniform => self.gl.UniformBlockBinding(program.0, block, binding),
                BlockType::ShaderStorage => self.gl.ShaderStorageBlockBinding(program.0, block, binding),
            }
        }
        self.check("block_binding");
    }

    fn uniform(&self, location: i32, value: UniformValue) {
        let count = value.count() as GLsizei;
        if matches!(value, UniformValue::I64 { .. } | UniformValue::U64 { .. }) && !self.int64_uniforms {
            error!(entry_point = value.entry_point(), "64-bit integer uniforms need ARB_gpu_shader_int64");
            return;
        }
        unsafe {
            match value {
                UniformValue::F32 { components, data } => {
                    UNIFORM_FV[components as usize - 1](&self.gl, location, count, data.as_ptr())
                }
                UniformValue::F64 { components, data } => {
                    UNIFORM_DV[components as usize - 1](&self.gl, location, count, data.as_ptr())
                }
                UniformValue::I32 { components, data } => {
                    UNIFORM_IV[components as usize - 1](&self.gl, location, count, data.as_ptr())
                }
                UniformValue::U32 { components, data } => {
                    UNIFORM_UIV[components as usize - 1](&self.gl, location, count, data.as_ptr())
                }
                UniformValue::I64 { components, data } => {
                    UNIFORM_I64V[components as usize - 1](&self.gl, location, count, data.as_ptr())
                }
                UniformValue::U64 { components, data } => {
                    UNIFORM_UI64V[components as usize - 1](&self.gl, location, count, data.as_ptr())
                }
                // column-major
                UniformValue::MatF32 { order, data } => {
                    UNIFORM_MATRIX_FV[order as usize - 2](&self.gl, location, count, gl::FALSE, data.as_ptr())
                }
                UniformValue::MatF64 { order, data } => {
                    UNIFORM_MATRIX_DV[order as usize - 2](&self.gl, location, count, gl::FALSE, data.as_ptr())
                }
            }
        }
        self.check("uniform");
    }

    fn vertex_attrib_pointer(&self, index: u32, format: AttribFormat, stride: usize, offset: usize) {
        let size = format.components as GLint;
        let ty = scalar_to_glenum(format.scalar);
        let stride = stride as GLsizei;
        let offset = offset as *const c_void;
        unsafe {
            match format.kind() {
                AttribKind::Float => {
                    self.gl
                        .VertexAttribPointer(index, size, ty, format.normalized as GLboolean, stride, offset)
                }
                AttribKind::Integer => self.gl.VertexAttribIPointer(index, size, ty, stride, offset),
                AttribKind::Double => self.gl.VertexAttribLPointer(index, size, ty, stride, offset),
            }
        }
        self.check("vertex_attrib_pointer");
    }

    fn enable_vertex_attrib(&self, index: u32, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.EnableVertexAttribArray(index)
            } else {
                self.gl.DisableVertexAttribArray(index)
            }
        }
        self.check("enable_vertex_attrib");
    }

    fn vertex_attrib_divisor(&self, index: u32, divisor: u32) {
        unsafe { self.gl.VertexAttribDivisor(index, divisor) }
        self.check("vertex_attrib_divisor");
    }

    fn draw_arrays(&self, mode: Primitive, first: i32, count: i32, instances: Option<i32>) {
        let mode = primitive_to_glenum(mode);
        unsafe {
            match instances {
                Some(instances) => self.gl.DrawArraysInstanced(mode, first, count, instances),
                None => self.gl.DrawArrays(mode, first, count),
            }
        }
        self.check("draw_arrays");
    }

    fn draw_elements(&self, mode: Primitive, count: i32, format: IndexFormat, offset: usize, instances: Option<i32>) {
        let mode = primitive_to_glenum(mode);
        let ty = index_format_to_glenum(format);
        let offset = offset as *const c_void;
        unsafe {
            match instances {
                Some(instances) => self.gl.DrawElementsInstanced(mode, count, ty, offset, instances),
                None => self.gl.DrawElements(mode, count, ty, offset),
            }
        }
        self.check("draw_elements");
    }

    fn finish(&self) {
        unsafe { self.gl.Finish() }
        self.check("finish");
    }

    fn invalidate_state(&self) {
        self.active_unit.set(None);
    }
}
