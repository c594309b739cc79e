mod common;

use common::Fixture;
use tether::backend::mock::DrawCall;
use tether::target;
use tether::{
    draw, draw_indexed, draw_indexed_instanced, draw_instanced, Bind, Buffer, BufferUsage, FragmentShader,
    IndexFormat, Primitive, Program, VertexArray, VertexShader,
};

struct Scene {
    _vs: VertexShader,
    _fs: FragmentShader,
    program: Program,
    vertex_array: VertexArray,
    indices: Buffer,
}

fn scene(fx: &Fixture) -> Scene {
    let mut vs = VertexShader::new("in vec2 position;");
    let mut fs = FragmentShader::new("uniform vec4 tint;");
    vs.initialize(&fx.gl).unwrap();
    fs.initialize(&fx.gl).unwrap();
    let mut program = Program::new().attach(&vs).attach(&fs);
    program.initialize(&fx.gl).unwrap();
    let mut vertex_array = VertexArray::new();
    vertex_array.initialize(&fx.gl).unwrap();
    let mut indices = Buffer::new();
    indices.initialize(&fx.gl).unwrap();
    Scene {
        _vs: vs,
        _fs: fs,
        program,
        vertex_array,
        indices,
    }
}

#[test]
fn non_positive_counts_draw_nothing() {
    let fx = Fixture::new();
    let s = scene(&fx);
    let program = s.program.bind::<target::CurrentProgram>(&fx.gl);
    let vao = s.vertex_array.bind::<target::CurrentVertexArray>(&fx.gl);

    draw(&program, &vao, Primitive::Triangles, 0, 0);
    draw(&program, &vao, Primitive::Triangles, 0, -3);
    draw_instanced(&program, &vao, Primitive::Triangles, 0, 3, 0);
    draw_instanced(&program, &vao, Primitive::Triangles, 0, 0, 4);
    assert!(fx.mock.draw_calls().is_empty());

    draw(&program, &vao, Primitive::Triangles, 0, 1);
    assert_eq!(fx.mock.draw_calls().len(), 1);
}

#[test]
fn draws_use_the_bound_state() {
    let fx = Fixture::new();
    let s = scene(&fx);
    {
        let program = s.program.bind::<target::CurrentProgram>(&fx.gl);
        let vao = s.vertex_array.bind::<target::CurrentVertexArray>(&fx.gl);
        draw(&program, &vao, Primitive::TriangleStrip, 4, 6);
        draw_instanced(&program, &vao, Primitive::Points, 0, 1, 100);
    }
    let calls = fx.mock.draw_calls();
    assert_eq!(
        calls[0],
        DrawCall {
            mode: Primitive::TriangleStrip,
            first: 4,
            count: 6,
            indices: None,
            instances: None,
            program: s.program.handle(),
            vertex_array: s.vertex_array.handle(),
            element_buffer: Default::default(),
        }
    );
    assert_eq!(calls[1].instances, Some(100));
}

#[test]
fn index_offset_scales_with_index_width() {
    let fx = Fixture::new();
    let s = scene(&fx);
    {
        let program = s.program.bind::<target::CurrentProgram>(&fx.gl);
        let vao = s.vertex_array.bind::<target::CurrentVertexArray>(&fx.gl);
        let indices = s.indices.bind::<target::ElementArrayBuffer>(&fx.gl);
        indices.upload(&[0u32; 64], BufferUsage::StaticDraw);

        draw_indexed::<u8>(&program, &vao, &indices, Primitive::Triangles, 6, 3);
        draw_indexed::<u16>(&program, &vao, &indices, Primitive::Triangles, 6, 3);
        draw_indexed::<u32>(&program, &vao, &indices, Primitive::Triangles, 6, 3);
        draw_indexed_instanced::<u16>(&program, &vao, &indices, Primitive::Lines, 2, 4, 8);
        draw_indexed_instanced::<u16>(&program, &vao, &indices, Primitive::Lines, 2, 4, 0);
        draw_indexed::<u32>(&program, &vao, &indices, Primitive::Triangles, 0, 0);
    }
    let indices: Vec<_> = fx.mock.draw_calls().iter().map(|call| call.indices).collect();
    assert_eq!(
        indices,
        vec![
            Some((IndexFormat::U8, 6)),
            Some((IndexFormat::U16, 12)),
            Some((IndexFormat::U32, 24)),
            Some((IndexFormat::U16, 4)),
        ]
    );
    let calls = fx.mock.draw_calls();
    assert_eq!(calls[3].instances, Some(8));
    assert!(calls.iter().all(|call| call.element_buffer == s.indices.handle()));
}
