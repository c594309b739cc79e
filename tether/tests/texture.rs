mod common;

use common::Fixture;
use tether::backend::mock::Call;
use tether::sampling::{SamplerAddressMode, SamplerMipmapMode};
use tether::target::{self, Slot, TargetId};
use tether::{
    Bind, CubeFace, Filter, PixelFormat, Renderbuffer, RestorePolicy, SamplerDescription, Texture2d,
    Texture2dArray, TextureCube, TextureParameter,
};

#[test]
fn cube_map_allocation_covers_every_face() {
    let fx = Fixture::new();
    let mut cube = TextureCube::new();
    cube.initialize(&fx.gl).unwrap();
    fx.mock.take_calls();
    {
        let bound = cube.bind::<target::TextureCubeMap>(&fx.gl);
        bound.allocate(0, PixelFormat::Rgba16F, [64, 64, 1]);
    }
    let faces: Vec<CubeFace> = fx
        .mock
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::TexImage { face, .. } => face,
            _ => None,
        })
        .collect();
    assert_eq!(faces, CubeFace::ALL.to_vec());
    assert_eq!(cube.data().meta.width, 64);
}

#[test]
fn upload_face_and_layers() {
    let fx = Fixture::new();
    let mut cube = TextureCube::new();
    let mut array = Texture2dArray::new();
    cube.initialize(&fx.gl).unwrap();
    array.initialize(&fx.gl).unwrap();
    {
        let bound = cube.bind::<target::TextureCubeMap>(&fx.gl);
        bound.upload_face(CubeFace::NegativeY, 0, PixelFormat::R8, 2, Some(&[1u8, 2, 3, 4][..]));
    }
    {
        let bound = array.bind::<target::Texture2DArray>(&fx.gl);
        bound.upload_3d(0, PixelFormat::Rg8, [2, 2, 3], Some(&[0u8; 24][..]));
    }
    assert_eq!(array.data().meta.depth, 3);
    assert!(fx.mock.calls().contains(&Call::TexImage {
        slot: Slot::new(TargetId::TextureCubeMap),
        level: 0,
        face: Some(CubeFace::NegativeY),
        format: PixelFormat::R8,
        extent: [2, 2, 1],
        with_data: true,
    }));
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "image data size mismatch")]
fn image_data_must_match_extent() {
    let fx = Fixture::new();
    let mut texture = Texture2d::new();
    texture.initialize(&fx.gl).unwrap();
    let bound = texture.bind::<target::Texture2D>(&fx.gl);
    bound.upload_2d(0, PixelFormat::Rgba8, 2, 2, Some(&[0u8; 15][..]));
}

#[test]
#[cfg(not(debug_assertions))]
fn mismatched_image_data_is_skipped() {
    let fx = Fixture::new();
    let mut texture = Texture2d::new();
    texture.initialize(&fx.gl).unwrap();
    {
        let bound = texture.bind::<target::Texture2D>(&fx.gl);
        bound.upload_2d(0, PixelFormat::Rgba8, 2, 2, Some(&[0u8; 15][..]));
    }
    assert!(!fx.mock.calls().iter().any(|call| matches!(call, Call::TexImage { .. })));
    assert_eq!(texture.data().meta.levels, 0);
}

#[test]
fn mipmap_generation_updates_level_count() {
    let fx = Fixture::new();
    let mut texture = Texture2d::new();
    texture.initialize(&fx.gl).unwrap();
    {
        let bound = texture.bind::<target::Texture2D>(&fx.gl);
        bound.allocate(0, PixelFormat::Rgba8, [256, 64, 1]);
        bound.generate_mipmap();
    }
    assert_eq!(texture.data().meta.levels, 9);
    assert!(fx
        .mock
        .calls()
        .contains(&Call::GenerateMipmap(Slot::new(TargetId::Texture2D))));
}

#[test]
fn sampling_sets_every_parameter_on_the_guard_unit() {
    let fx = Fixture::new();
    let mut texture = Texture2d::new();
    texture.initialize(&fx.gl).unwrap();
    fx.mock.take_calls();
    {
        let bound = texture.bind_unit::<target::Texture2D>(&fx.gl, 2, RestorePolicy::RestoreNull);
        bound.set_sampling(&SamplerDescription::WRAP_LINEAR_MIPMAP_LINEAR);
    }
    let params: Vec<(Slot, TextureParameter)> = fx
        .mock
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::TexParameter { slot, param } => Some((slot, param)),
            _ => None,
        })
        .collect();
    assert_eq!(params.len(), 6);
    assert!(params
        .iter()
        .all(|(slot, _)| *slot == Slot::texture_unit(TargetId::Texture2D, 2)));
    assert_eq!(
        params[0].1,
        TextureParameter::MinFilter(Filter::Linear, Some(SamplerMipmapMode::Linear))
    );
    assert_eq!(params[2].1, TextureParameter::WrapS(SamplerAddressMode::Wrap));
}

#[test]
fn renderbuffer_storage_is_recorded() {
    let fx = Fixture::new();
    let mut rb = Renderbuffer::new();
    rb.initialize(&fx.gl).unwrap();
    {
        let bound = rb.bind::<target::RenderbufferTarget>(&fx.gl);
        bound.storage(PixelFormat::Depth24Stencil8, 640, 480, 4);
    }
    let info = rb.data().meta;
    assert_eq!(info.format, Some(PixelFormat::Depth24Stencil8));
    assert_eq!((info.width, info.height, info.samples), (640, 480, 4));
    assert!(fx.mock.calls().contains(&Call::RenderbufferStorage {
        format: PixelFormat::Depth24Stencil8,
        width: 640,
        height: 480,
        samples: 4,
    }));
}
