mod common;

use common::Fixture;
use tether::backend::mock::Call;
use tether::target::{self, TargetId};
use tether::{
    blit, Attachment, Bind, ClearMask, ClearValues, Error, Filter, Framebuffer, FramebufferStatus, Handle,
    ObjectKind, PixelFormat, Rect, Renderbuffer, Texture2d, TextureCube,
};

fn color_texture(fx: &Fixture, width: u32, height: u32) -> Texture2d {
    let mut texture = Texture2d::new();
    texture.initialize(&fx.gl).unwrap();
    texture
        .bind::<target::Texture2D>(&fx.gl)
        .allocate(0, PixelFormat::Rgba8, [width, height, 1]);
    texture
}

fn depth_renderbuffer(fx: &Fixture, width: u32, height: u32) -> Renderbuffer {
    let mut rb = Renderbuffer::new();
    rb.initialize(&fx.gl).unwrap();
    rb.bind::<target::RenderbufferTarget>(&fx.gl)
        .storage(PixelFormat::Depth24Stencil8, width, height, 0);
    rb
}

#[test]
fn builder_attaches_and_enables_draw_buffers() {
    let fx = Fixture::new();
    let albedo = color_texture(&fx, 320, 240);
    let normals = color_texture(&fx, 320, 240);
    let depth = depth_renderbuffer(&fx, 320, 240);

    let framebuffer = Framebuffer::builder()
        .color_texture(&albedo)
        .color_texture(&normals)
        .depth_stencil_renderbuffer(&depth)
        .build(&fx.gl)
        .unwrap();

    let attachments = fx.mock.attachments(framebuffer.handle());
    assert_eq!(attachments[&Attachment::Color(0)], albedo.handle());
    assert_eq!(attachments[&Attachment::Color(1)], normals.handle());
    assert_eq!(attachments[&Attachment::DepthStencil], depth.handle());
    assert!(fx
        .mock
        .calls()
        .contains(&Call::DrawBuffers(vec![Attachment::Color(0), Attachment::Color(1)])));

    let info = framebuffer.data().meta;
    assert_eq!(info.color_attachments, 0b11);
    assert!(info.depth && info.stencil);
    assert_eq!(info.status, Some(FramebufferStatus::Complete));
    // the draw framebuffer binding is left as it was
    assert_eq!(fx.mock.bound_to(TargetId::DrawFramebuffer), Handle::NULL);
}

#[test]
fn incomplete_framebuffer_is_reported() {
    let fx = Fixture::new();
    let mut framebuffer = Framebuffer::new();
    framebuffer.initialize(&fx.gl).unwrap();
    {
        let bound = framebuffer.bind::<target::DrawFramebuffer>(&fx.gl);
        match bound.check_status() {
            Err(Error::FramebufferIncomplete(status)) => {
                assert_eq!(status, FramebufferStatus::IncompleteMissingAttachment)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
    assert_eq!(
        framebuffer.data().meta.status,
        Some(FramebufferStatus::IncompleteMissingAttachment)
    );
}

#[test]
fn failed_build_deletes_the_framebuffer() {
    let fx = Fixture::new();
    let result = Framebuffer::builder().build(&fx.gl);
    assert!(matches!(result, Err(Error::FramebufferIncomplete(_))));
    assert_eq!(fx.mock.generated(ObjectKind::Framebuffer), 1);
    assert_eq!(fx.mock.deleted(ObjectKind::Framebuffer), 1);
}

#[test]
fn layers_and_detach() {
    let fx = Fixture::new();
    let mut cube = TextureCube::new();
    cube.initialize(&fx.gl).unwrap();
    let mut framebuffer = Framebuffer::new();
    framebuffer.initialize(&fx.gl).unwrap();
    {
        let bound = framebuffer.bind::<target::DrawFramebuffer>(&fx.gl);
        bound.attach_texture_layer(Attachment::Color(0), &cube, 0, tether::CubeFace::PositiveZ.layer());
        assert!(bound.check_status().is_ok());
        bound.detach(Attachment::Color(0));
    }
    assert!(fx.mock.calls().contains(&Call::FramebufferTexture {
        target: TargetId::DrawFramebuffer,
        attachment: Attachment::Color(0),
        texture: cube.handle(),
        level: 0,
        layer: Some(4),
    }));
    assert!(fx.mock.attachments(framebuffer.handle()).is_empty());
    assert_eq!(framebuffer.data().meta.color_attachments, 0);
}

#[test]
fn clear_default_framebuffer() {
    let fx = Fixture::new();
    let window = Framebuffer::new();
    {
        let bound = window.bind::<target::DrawFramebuffer>(&fx.gl);
        bound.clear(&ClearValues::default());
        bound.clear(&ClearValues::color([0.0, 0.0, 0.0, 1.0]).depth(1.0));
    }
    let clears: Vec<ClearValues> = fx
        .mock
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Clear(values) => Some(values),
            _ => None,
        })
        .collect();
    assert_eq!(clears.len(), 1);
    assert_eq!(clears[0].mask(), ClearMask::COLOR | ClearMask::DEPTH);
}

#[test]
fn blit_to_window() {
    let fx = Fixture::new();
    let color = color_texture(&fx, 64, 64);
    let offscreen = Framebuffer::builder().color_texture(&color).build(&fx.gl).unwrap();
    let window = Framebuffer::new();
    {
        let read = offscreen.bind::<target::ReadFramebuffer>(&fx.gl);
        let draw = window.bind::<target::DrawFramebuffer>(&fx.gl);
        blit(
            &read,
            &draw,
            Rect::from_size(64, 64),
            Rect::new(10, 10, 128, 128),
            ClearMask::COLOR,
            Filter::Linear,
        );
        blit(&read, &draw, Rect::default(), Rect::default(), ClearMask::empty(), Filter::Nearest);
    }
    let blits: Vec<Call> = fx
        .mock
        .calls()
        .into_iter()
        .filter(|call| matches!(call, Call::Blit { .. }))
        .collect();
    assert_eq!(
        blits,
        vec![Call::Blit {
            src: Rect::from_size(64, 64),
            dst: Rect::new(10, 10, 128, 128),
            mask: ClearMask::COLOR,
            filter: Filter::Linear,
        }]
    );
}
