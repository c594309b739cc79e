//! A backend that records calls and simulates the binding state, used in tests.
//!
//! Shaders are "compiled" by scanning their source for declarations:
//!
//! - `uniform <type> <name>;` declares a uniform,
//! - `uniform <Block> {` declares a uniform block,
//! - `buffer <Block> {` declares a shader storage block,
//! - `in <type> <name>;` declares a vertex attribute (vertex shaders only),
//! - a line starting with `#error` fails compilation.
//!
//! `layout(...)` qualifiers are ignored. Linking merges the declarations of all shaders and
//! assigns locations in order of first appearance.
use crate::backend::Backend;
use crate::buffer::BufferUsage;
use crate::draw::{IndexFormat, Primitive};
use crate::format::PixelFormat;
use crate::framebuffer::{Attachment, ClearMask, ClearValues, FramebufferStatus, Rect};
use crate::handle::{Handle, ObjectKind};
use crate::sampling::{Filter, TextureParameter};
use crate::shader::ShaderStage;
use crate::target::{Slot, TargetId};
use crate::texture::{CubeFace, TexImage};
use crate::uniform::{BlockType, UniformValue};
use crate::vertex::AttribFormat;
use std::cell::{Ref, RefCell};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::rc::Rc;

/// A recorded draw call, with the state it was issued against.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub mode: Primitive,
    pub first: i32,
    pub count: i32,
    /// Index format and byte offset, for indexed draws.
    pub indices: Option<(IndexFormat, usize)>,
    pub instances: Option<i32>,
    pub program: Handle,
    pub vertex_array: Handle,
    pub element_buffer: Handle,
}

/// A recorded backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Generate {
        kind: ObjectKind,
        handle: Handle,
    },
    Delete {
        kind: ObjectKind,
        handle: Handle,
    },
    Bind {
        slot: Slot,
        handle: Handle,
    },
    QueryBinding(Slot),
    BindBufferRange {
        target: TargetId,
        index: u32,
        buffer: Handle,
        range: Option<Range<usize>>,
    },
    ActiveTexture(u32),
    BufferData {
        target: TargetId,
        size: usize,
        usage: BufferUsage,
        with_data: bool,
    },
    BufferSubData {
        target: TargetId,
        offset: usize,
        size: usize,
    },
    TexImage {
        slot: Slot,
        level: u32,
        face: Option<CubeFace>,
        format: PixelFormat,
        extent: [u32; 3],
        with_data: bool,
    },
    TexParameter {
        slot: Slot,
        param: TextureParameter,
    },
    GenerateMipmap(Slot),
    RenderbufferStorage {
        format: PixelFormat,
        width: u32,
        height: u32,
        samples: u32,
    },
    FramebufferTexture {
        target: TargetId,
        attachment: Attachment,
        texture: Handle,
        level: u32,
        layer: Option<u32>,
    },
    FramebufferRenderbuffer {
        target: TargetId,
        attachment: Attachment,
        renderbuffer: Handle,
    },
    FramebufferStatus(TargetId),
    DrawBuffers(Vec<Attachment>),
    Clear(ClearValues),
    Blit {
        src: Rect,
        dst: Rect,
        mask: ClearMask,
        filter: Filter,
    },
    CompileShader {
        shader: Handle,
        success: bool,
    },
    LinkProgram {
        program: Handle,
        success: bool,
    },
    BlockBinding {
        program: Handle,
        ty: BlockType,
        block: u32,
        binding: u32,
    },
    Uniform {
        program: Handle,
        location: i32,
        entry_point: &'static str,
        data: Vec<f64>,
    },
    VertexAttribPointer {
        index: u32,
        format: AttribFormat,
        stride: usize,
        offset: usize,
    },
    EnableVertexAttrib {
        index: u32,
        enabled: bool,
    },
    VertexAttribDivisor {
        index: u32,
        divisor: u32,
    },
    Draw(DrawCall),
    Finish,
    InvalidateState,
}

/// Declarations found in a shader or program.
#[derive(Clone, Debug, Default)]
struct Interface {
    uniforms: Vec<String>,
    attributes: Vec<String>,
    uniform_blocks: Vec<String>,
    storage_blocks: Vec<String>,
}

impl Interface {
    fn merge(&mut self, other: &Interface) {
        fn merge_names(into: &mut Vec<String>, from: &[String]) {
            for name in from {
                if !into.contains(name) {
                    into.push(name.clone());
                }
            }
        }
        merge_names(&mut self.uniforms, &other.uniforms);
        merge_names(&mut self.attributes, &other.attributes);
        merge_names(&mut self.uniform_blocks, &other.uniform_blocks);
        merge_names(&mut self.storage_blocks, &other.storage_blocks);
    }
}

/// Strips an array suffix and trailing punctuation from a declared name.
fn declared_name(token: &str) -> String {
    let token = token.trim_end_matches(|c: char| c == '{' || c == ';');
    match token.find('[') {
        Some(pos) => token[..pos].to_string(),
        None => token.to_string(),
    }
}

fn parse_shader(stage: ShaderStage, source: &str) -> Result<Interface, String> {
    let mut interface = Interface::default();
    for (line_number, line) in source.lines().enumerate() {
        let mut line = line.trim();
        if let Some(message) = line.strip_prefix("#error") {
            return Err(format!("ERROR: 0:{}: '#error' : {}", line_number + 1, message.trim()));
        }
        if line.starts_with("layout") {
            match line.find(')') {
                Some(end) => line = line[end + 1..].trim(),
                None => continue,
            }
        }
        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ';')
            .filter(|t| !t.is_empty())
            .collect();
        match tokens.as_slice() {
            ["uniform", block, "{", ..] => interface.uniform_blocks.push(declared_name(block)),
            ["uniform", block] if block.ends_with('{') => interface.uniform_blocks.push(declared_name(block)),
            ["uniform", _ty, name, ..] => interface.uniforms.push(declared_name(name)),
            ["buffer", block, ..] => interface.storage_blocks.push(declared_name(block)),
            ["in", _ty, name, ..] if stage == ShaderStage::Vertex => interface.attributes.push(declared_name(name)),
            _ => {}
        }
    }
    Ok(interface)
}

#[derive(Default)]
struct MockState {
    next_handle: u32,
    calls: Vec<Call>,
    live: HashMap<Handle, ObjectKind>,
    generated: Vec<(ObjectKind, Handle)>,
    deleted: Vec<(ObjectKind, Handle)>,
    fail_generate: HashSet<ObjectKind>,
    bindings: HashMap<Slot, Handle>,
    /// Element array buffer of each vertex array (including the null one).
    element_buffers: HashMap<Handle, Handle>,
    indexed: HashMap<(TargetId, u32), (Handle, Option<Range<usize>>)>,
    active_unit: u32,
    shaders: HashMap<Handle, Interface>,
    programs: HashMap<Handle, Interface>,
    attachments: HashMap<Handle, HashMap<Attachment, Handle>>,
    uniforms: HashMap<(Handle, i32), (&'static str, Vec<f64>)>,
}

impl MockState {
    fn binding(&self, slot: Slot) -> Handle {
        if slot.target == TargetId::ElementArrayBuffer {
            let vertex_array = self.binding(Slot::new(TargetId::CurrentVertexArray));
            return self.element_buffers.get(&vertex_array).copied().unwrap_or_default();
        }
        self.bindings.get(&slot).copied().unwrap_or_default()
    }

    fn bound_to(&self, target: TargetId) -> Handle {
        self.binding(Slot::new(target))
    }
}

/// Recording backend. Clones share the same state, so a test can keep a clone to inspect
/// the backend owned by a `Context`.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Rc<RefCell<MockState>>,
}

impl MockBackend {
    pub fn new() -> MockBackend {
        MockBackend::default()
    }

    fn state(&self) -> Ref<MockState> {
        self.state.borrow()
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    /// Makes `generate` fail for objects of the given kind.
    pub fn fail_generate(&self, kind: ObjectKind) {
        self.state.borrow_mut().fail_generate.insert(kind);
    }

    pub fn allow_generate(&self, kind: ObjectKind) {
        self.state.borrow_mut().fail_generate.remove(&kind);
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Returns the calls recorded so far and clears the log.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    /// Bind calls recorded so far.
    pub fn binds(&self) -> Vec<(Slot, Handle)> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match *call {
                Call::Bind { slot, handle } => Some((slot, handle)),
                _ => None,
            })
            .collect()
    }

    /// Object currently bound to a slot.
    pub fn bound(&self, slot: Slot) -> Handle {
        self.state().binding(slot)
    }

    /// Object currently bound to a target (texture unit 0 for texture targets).
    pub fn bound_to(&self, target: TargetId) -> Handle {
        self.state().bound_to(target)
    }

    /// Buffer (and range) bound to an indexed binding point.
    pub fn indexed_binding(&self, target: TargetId, index: u32) -> Option<(Handle, Option<Range<usize>>)> {
        self.state().indexed.get(&(target, index)).cloned()
    }

    pub fn active_texture_unit(&self) -> u32 {
        self.state().active_unit
    }

    /// Number of objects generated and not deleted yet.
    pub fn live_objects(&self) -> usize {
        self.state().live.len()
    }

    pub fn is_live(&self, handle: Handle) -> bool {
        self.state().live.contains_key(&handle)
    }

    /// Number of objects of the given kind generated so far.
    pub fn generated(&self, kind: ObjectKind) -> usize {
        self.state().generated.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Number of objects of the given kind deleted so far.
    pub fn deleted(&self, kind: ObjectKind) -> usize {
        self.state().deleted.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Number of times a handle was deleted.
    pub fn deletions(&self, handle: Handle) -> usize {
        self.state().deleted.iter().filter(|(_, h)| *h == handle).count()
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Draw(draw) => Some(draw.clone()),
                _ => None,
            })
            .collect()
    }

    /// Last value assigned to a uniform of a program: entry point and data.
    pub fn uniform_value(&self, program: Handle, location: i32) -> Option<(&'static str, Vec<f64>)> {
        self.state().uniforms.get(&(program, location)).cloned()
    }

    /// Attachments of a framebuffer.
    pub fn attachments(&self, framebuffer: Handle) -> HashMap<Attachment, Handle> {
        self.state().attachments.get(&framebuffer).cloned().unwrap_or_default()
    }
}

fn uniform_data(value: &UniformValue) -> Vec<f64> {
    match *value {
        UniformValue::F32 { data, .. } | UniformValue::MatF32 { data, .. } => {
            data.iter().map(|&v| v as f64).collect()
        }
        UniformValue::F64 { data, .. } | UniformValue::MatF64 { data, .. } => data.to_vec(),
        UniformValue::I32 { data, .. } => data.iter().map(|&v| v as f64).collect(),
        UniformValue::U32 { data, .. } => data.iter().map(|&v| v as f64).collect(),
        UniformValue::I64 { data, .. } => data.iter().map(|&v| v as f64).collect(),
        UniformValue::U64 { data, .. } => data.iter().map(|&v| v as f64).collect(),
    }
}

impl Backend for MockBackend {
    fn generate(&self, kind: ObjectKind) -> Handle {
        let mut state = self.state.borrow_mut();
        if state.fail_generate.contains(&kind) {
            return Handle::NULL;
        }
        state.next_handle += 1;
        let handle = Handle(state.next_handle);
        state.live.insert(handle, kind);
        state.generated.push((kind, handle));
        state.calls.push(Call::Generate { kind, handle });
        handle
    }

    fn delete(&self, kind: ObjectKind, handle: Handle) {
        let mut state = self.state.borrow_mut();
        state.live.remove(&handle);
        state.deleted.push((kind, handle));
        state.calls.push(Call::Delete { kind, handle });
        // deleting a bound object unbinds it
        let bound_elsewhere: Vec<Slot> = state
            .bindings
            .iter()
            .filter(|(slot, bound)| **bound == handle && kind.target_class() == Some(slot.target.class()))
            .map(|(slot, _)| *slot)
            .collect();
        for slot in bound_elsewhere {
            state.bindings.remove(&slot);
        }
        if kind == ObjectKind::Buffer {
            for buffer in state.element_buffers.values_mut() {
                if *buffer == handle {
                    *buffer = Handle::NULL;
                }
            }
        }
        state.shaders.remove(&handle);
        state.programs.remove(&handle);
        state.attachments.remove(&handle);
    }

    fn bind(&self, slot: Slot, handle: Handle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Bind { slot, handle });
        if slot.target == TargetId::ElementArrayBuffer {
            let vertex_array = state.bound_to(TargetId::CurrentVertexArray);
            state.element_buffers.insert(vertex_array, handle);
        } else {
            state.bindings.insert(slot, handle);
        }
    }

    fn binding(&self, slot: Slot) -> Handle {
        self.record(Call::QueryBinding(slot));
        self.state().binding(slot)
    }

    fn bind_buffer_range(&self, target: TargetId, index: u32, buffer: Handle, range: Option<Range<usize>>) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::BindBufferRange {
            target,
            index,
            buffer,
            range: range.clone(),
        });
        state.indexed.insert((target, index), (buffer, range));
    }

    fn active_texture(&self, unit: u32) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::ActiveTexture(unit));
        state.active_unit = unit;
    }

    fn buffer_data(&self, target: TargetId, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        debug_assert!(data.map_or(true, |data| data.len() == size));
        self.record(Call::BufferData {
            target,
            size,
            usage,
            with_data: data.is_some(),
        });
    }

    fn buffer_sub_data(&self, target: TargetId, offset: usize, data: &[u8]) {
        self.record(Call::BufferSubData {
            target,
            offset,
            size: data.len(),
        });
    }

    fn tex_image(&self, slot: Slot, image: &TexImage) {
        debug_assert!(!self.state().binding(slot).is_null(), "no texture bound to {:?}", slot);
        self.record(Call::TexImage {
            slot,
            level: image.level,
            face: image.face,
            format: image.format,
            extent: image.extent,
            with_data: image.data.is_some(),
        });
    }

    fn tex_parameter(&self, slot: Slot, param: TextureParameter) {
        self.record(Call::TexParameter { slot, param });
    }

    fn generate_mipmap(&self, slot: Slot) {
        self.record(Call::GenerateMipmap(slot));
    }

    fn renderbuffer_storage(&self, format: PixelFormat, width: u32, height: u32, samples: u32) {
        self.record(Call::RenderbufferStorage {
            format,
            width,
            height,
            samples,
        });
    }

    fn framebuffer_texture(&self, target: TargetId, attachment: Attachment, texture: Handle, level: u32, layer: Option<u32>) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::FramebufferTexture {
            target,
            attachment,
            texture,
            level,
            layer,
        });
        let framebuffer = state.bound_to(target);
        let attachments = state.attachments.entry(framebuffer).or_default();
        if texture.is_null() {
            attachments.remove(&attachment);
        } else {
            attachments.insert(attachment, texture);
        }
    }

    fn framebuffer_renderbuffer(&self, target: TargetId, attachment: Attachment, renderbuffer: Handle) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::FramebufferRenderbuffer {
            target,
            attachment,
            renderbuffer,
        });
        let framebuffer = state.bound_to(target);
        let attachments = state.attachments.entry(framebuffer).or_default();
        if renderbuffer.is_null() {
            attachments.remove(&attachment);
        } else {
            attachments.insert(attachment, renderbuffer);
        }
    }

    fn framebuffer_status(&self, target: TargetId) -> FramebufferStatus {
        self.record(Call::FramebufferStatus(target));
        let state = self.state();
        let framebuffer = state.bound_to(target);
        if framebuffer.is_null() {
            return FramebufferStatus::Complete;
        }
        match state.attachments.get(&framebuffer) {
            Some(attachments) if !attachments.is_empty() => FramebufferStatus::Complete,
            _ => FramebufferStatus::IncompleteMissingAttachment,
        }
    }

    fn draw_buffers(&self, attachments: &[Attachment]) {
        self.record(Call::DrawBuffers(attachments.to_vec()));
    }

    fn clear(&self, values: &ClearValues) {
        self.record(Call::Clear(*values));
    }

    fn blit_framebuffer(&self, src: Rect, dst: Rect, mask: ClearMask, filter: Filter) {
        self.record(Call::Blit { src, dst, mask, filter });
    }

    fn compile_shader(&self, shader: Handle, source: &str) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let stage = match state.live.get(&shader) {
            Some(ObjectKind::Shader(stage)) => *stage,
            _ => return Err(format!("{} is not a shader", shader)),
        };
        let result = parse_shader(stage, source);
        state.calls.push(Call::CompileShader {
            shader,
            success: result.is_ok(),
        });
        let interface = result?;
        state.shaders.insert(shader, interface);
        Ok(())
    }

    fn link_program(&self, program: Handle, shaders: &[Handle]) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let mut interface = Interface::default();
        let mut result = Ok(());
        if shaders.is_empty() {
            result = Err("error: no shaders attached to the program".to_string());
        }
        for shader in shaders {
            match state.shaders.get(shader) {
                Some(shader_interface) => interface.merge(shader_interface),
                None => {
                    result = Err(format!("error: shader {} is not compiled", shader));
                    break;
                }
            }
        }
        state.calls.push(Call::LinkProgram {
            program,
            success: result.is_ok(),
        });
        result?;
        state.programs.insert(program, interface);
        Ok(())
    }

    fn uniform_location(&self, program: Handle, name: &str) -> Option<i32> {
        let state = self.state();
        let interface = state.programs.get(&program)?;
        interface.uniforms.iter().position(|u| u == name).map(|i| i as i32)
    }

    fn attribute_location(&self, program: Handle, name: &str) -> Option<u32> {
        let state = self.state();
        let interface = state.programs.get(&program)?;
        interface.attributes.iter().position(|a| a == name).map(|i| i as u32)
    }

    fn block_index(&self, program: Handle, ty: BlockType, name: &str) -> Option<u32> {
        let state = self.state();
        let interface = state.programs.get(&program)?;
        let blocks = match ty {
            BlockType::Uniform => &interface.uniform_blocks,
            BlockType::ShaderStorage => &interface.storage_blocks,
        };
        blocks.iter().position(|b| b == name).map(|i| i as u32)
    }

    fn block_binding(&self, program: Handle, ty: BlockType, block: u32, binding: u32) {
        self.record(Call::BlockBinding {
            program,
            ty,
            block,
            binding,
        });
    }

    fn uniform(&self, location: i32, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let program = state.bound_to(TargetId::CurrentProgram);
        debug_assert!(!program.is_null(), "uniform set with no current program");
        let entry_point = value.entry_point();
        let data = uniform_data(&value);
        state.uniforms.insert((program, location), (entry_point, data.clone()));
        state.calls.push(Call::Uniform {
            program,
            location,
            entry_point,
            data,
        });
    }

    fn vertex_attrib_pointer(&self, index: u32, format: AttribFormat, stride: usize, offset: usize) {
        self.record(Call::VertexAttribPointer {
            index,
            format,
            stride,
            offset,
        });
    }

    fn enable_vertex_attrib(&self, index: u32, enabled: bool) {
        self.record(Call::EnableVertexAttrib { index, enabled });
    }

    fn vertex_attrib_divisor(&self, index: u32, divisor: u32) {
        self.record(Call::VertexAttribDivisor { index, divisor });
    }

    fn draw_arrays(&self, mode: Primitive, first: i32, count: i32, instances: Option<i32>) {
        let mut state = self.state.borrow_mut();
        let draw = DrawCall {
            mode,
            first,
            count,
            indices: None,
            instances,
            program: state.bound_to(TargetId::CurrentProgram),
            vertex_array: state.bound_to(TargetId::CurrentVertexArray),
            element_buffer: state.bound_to(TargetId::ElementArrayBuffer),
        };
        state.calls.push(Call::Draw(draw));
    }

    fn draw_elements(&self, mode: Primitive, count: i32, format: IndexFormat, offset: usize, instances: Option<i32>) {
        let mut state = self.state.borrow_mut();
        let draw = DrawCall {
            mode,
            first: 0,
            count,
            indices: Some((format, offset)),
            instances,
            program: state.bound_to(TargetId::CurrentProgram),
            vertex_array: state.bound_to(TargetId::CurrentVertexArray),
            element_buffer: state.bound_to(TargetId::ElementArrayBuffer),
        };
        state.calls.push(Call::Draw(draw));
    }

    fn finish(&self) {
        self.record(Call::Finish);
    }

    fn invalidate_state(&self) {
        self.record(Call::InvalidateState);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_declarations() {
        let source = "
            layout(location = 0) in vec3 position;
            in vec2 uv;
            uniform mat4 model;
            uniform sampler2D albedo;
            uniform vec4 lights[4];
            layout(std140) uniform Camera {
                mat4 view;
            };
            buffer Particles {
                vec4 data[];
            };
        ";
        let interface = parse_shader(ShaderStage::Vertex, source).unwrap();
        assert_eq!(interface.attributes, ["position", "uv"]);
        assert_eq!(interface.uniforms, ["model", "albedo", "lights"]);
        assert_eq!(interface.uniform_blocks, ["Camera"]);
        assert_eq!(interface.storage_blocks, ["Particles"]);
    }

    #[test]
    fn fragment_inputs_are_not_attributes() {
        let interface = parse_shader(ShaderStage::Fragment, "in vec2 uv;").unwrap();
        assert!(interface.attributes.is_empty());
    }

    #[test]
    fn error_directive_fails_compilation() {
        let err = parse_shader(ShaderStage::Fragment, "uniform vec4 tint;\n#error broken").unwrap_err();
        assert!(err.contains("0:2"));
        assert!(err.contains("broken"));
    }
}
