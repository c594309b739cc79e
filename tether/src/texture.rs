use crate::binding::Bound;
use crate::context::Context;
use crate::error::Result;
use crate::format::PixelFormat;
use crate::handle::{check_initialized, Handle, NativeHandle, ObjectCell, ObjectData, ObjectKind, Resource};
use crate::init::Initialize;
use crate::sampling::{SamplerDescription, TextureParameter};
use crate::sealed::Sealed;
use crate::target::{self, BindableTo, Image1dTarget, Image2dTarget, Image3dTarget, TextureTarget};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use tracing::{error, trace};

/// Faces of a cube map.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Layer index of the face in a layered cube map attachment.
    pub fn layer(self) -> u32 {
        self as u32
    }
}

/// Specification of one texture image, passed to the backend.
#[derive(Copy, Clone, Debug)]
pub struct TexImage<'a> {
    pub level: u32,
    /// Cube map face, for cube map targets.
    pub face: Option<CubeFace>,
    pub format: PixelFormat,
    /// Width, height, depth (or number of layers).
    pub extent: [u32; 3],
    /// Initial contents. `None` allocates uninitialized storage.
    pub data: Option<&'a [u8]>,
}

/// Format and extent last specified for level 0 of a texture, and number of specified levels.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TextureInfo {
    pub format: Option<PixelFormat>,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub levels: u32,
}

/// Texture objects.
///
/// A texture object can only ever be bound to one texture target, so the target is part of
/// the type.
pub struct Texture<T: TextureTarget> {
    pub(crate) cell: Rc<ObjectCell<TextureInfo>>,
    _target: PhantomData<T>,
}

pub type Texture1d = Texture<target::Texture1D>;
pub type Texture2d = Texture<target::Texture2D>;
pub type Texture3d = Texture<target::Texture3D>;
pub type Texture2dArray = Texture<target::Texture2DArray>;
pub type TextureCube = Texture<target::TextureCubeMap>;

impl<T: TextureTarget> Texture<T> {
    /// Creates a new, uninitialized texture.
    pub fn new() -> Texture<T> {
        Texture {
            cell: Default::default(),
            _target: PhantomData,
        }
    }

    /// Allocates the native object. Does nothing if it's already initialized.
    ///
    /// The storage is specified later through a binding guard (`upload_2d`, ...).
    pub fn initialize(&mut self, gl: &Context) -> Result<()> {
        self.cell
            .get_or_try_init(|| NativeHandle::generate(gl, ObjectKind::Texture))
            .map(drop)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.is_initialized()
    }

    pub fn handle(&self) -> Handle {
        self.cell.handle()
    }

    pub fn data(&self) -> ObjectData<TextureInfo> {
        self.cell.data()
    }
}

impl<T: TextureTarget> Default for Texture<T> {
    fn default() -> Self {
        Texture::new()
    }
}

impl<T: TextureTarget> Clone for Texture<T> {
    fn clone(&self) -> Self {
        Texture {
            cell: self.cell.clone(),
            _target: PhantomData,
        }
    }
}

impl<T: TextureTarget> fmt::Debug for Texture<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Texture")
            .field("target", &T::ID)
            .field("handle", &self.cell.handle())
            .field("meta", &self.cell.meta())
            .finish()
    }
}

impl<T: TextureTarget> Sealed for Texture<T> {}

impl<T: TextureTarget> Resource for Texture<T> {
    const KIND: ObjectKind = ObjectKind::Texture;

    fn handle(&self) -> Handle {
        self.cell.handle()
    }
}

impl<T: TextureTarget> BindableTo<T> for Texture<T> {}

impl<T: TextureTarget> Initialize for Texture<T> {
    fn initialize(&mut self, gl: &Context) -> Result<()> {
        Texture::initialize(self, gl)
    }

    fn is_initialized(&self) -> bool {
        Texture::is_initialized(self)
    }

    fn describe(&self) -> Cow<'static, str> {
        Cow::Owned(format!("Texture<{:?}>", T::ID))
    }
}

impl<'a, T: TextureTarget> Bound<'a, Texture<T>, T> {
    fn tex_image(&self, image: TexImage) {
        if !check_initialized(ObjectKind::Texture, self.handle()) {
            return;
        }
        if let Some(data) = image.data {
            let [w, h, d] = image.extent;
            let expected = image.format.image_size(w, h, d);
            debug_assert_eq!(data.len(), expected, "image data size mismatch");
            if data.len() != expected {
                error!(len = data.len(), expected, "image data size mismatch, upload skipped");
                return;
            }
        }
        trace!(slot = ?self.slot(), handle = %self.handle(), level = image.level, face = ?image.face, extent = ?image.extent, "texture image");
        self.context().backend().tex_image(self.slot(), &image);
        self.resource().cell.update_meta(|info| {
            if image.level == 0 {
                info.format = Some(image.format);
                info.width = image.extent[0];
                info.height = image.extent[1];
                info.depth = image.extent[2];
            }
            info.levels = info.levels.max(image.level + 1);
        });
    }

    /// Allocates uninitialized storage for a mip level.
    ///
    /// `extent` is `[width, height, depth]`; unused dimensions must be 1. For cube maps, all six
    /// faces are allocated.
    pub fn allocate(&self, level: u32, format: PixelFormat, extent: [u32; 3]) {
        let image = |face| TexImage {
            level,
            face,
            format,
            extent,
            data: None,
        };
        if T::ID == target::TargetId::TextureCubeMap {
            for face in CubeFace::ALL {
                self.tex_image(image(Some(face)));
            }
        } else {
            self.tex_image(image(None));
        }
    }

    pub fn set_parameter(&self, param: TextureParameter) {
        if !check_initialized(ObjectKind::Texture, self.handle()) {
            return;
        }
        self.context().backend().tex_parameter(self.slot(), param);
    }

    /// Sets all sampling parameters of the texture.
    pub fn set_sampling(&self, desc: &SamplerDescription) {
        for param in desc.parameters() {
            self.set_parameter(param);
        }
    }

    /// Generates all mip levels from level 0.
    pub fn generate_mipmap(&self) {
        if !check_initialized(ObjectKind::Texture, self.handle()) {
            return;
        }
        self.context().backend().generate_mipmap(self.slot());
        let info = self.resource().cell.meta();
        let largest = info.width.max(info.height).max(info.depth).max(1);
        self.resource().cell.update_meta(|info| info.levels = 32 - largest.leading_zeros());
    }
}

impl<'a, T: Image1dTarget> Bound<'a, Texture<T>, T> {
    /// Specifies a mip level. `data` is tightly packed; `None` allocates uninitialized storage.
    pub fn upload_1d(&self, level: u32, format: PixelFormat, width: u32, data: Option<&[u8]>) {
        self.tex_image(TexImage {
            level,
            face: None,
            format,
            extent: [width, 1, 1],
            data,
        })
    }
}

impl<'a, T: Image2dTarget> Bound<'a, Texture<T>, T> {
    /// Specifies a mip level. `data` is tightly packed; `None` allocates uninitialized storage.
    ///
    /// Call again with new dimensions to reallocate the texture (e.g. when the window is resized).
    pub fn upload_2d(&self, level: u32, format: PixelFormat, width: u32, height: u32, data: Option<&[u8]>) {
        self.tex_image(TexImage {
            level,
            face: None,
            format,
            extent: [width, height, 1],
            data,
        })
    }
}

impl<'a, T: Image3dTarget> Bound<'a, Texture<T>, T> {
    /// Specifies a mip level of a 3D texture, or of all layers of an array texture.
    pub fn upload_3d(&self, level: u32, format: PixelFormat, extent: [u32; 3], data: Option<&[u8]>) {
        self.tex_image(TexImage {
            level,
            face: None,
            format,
            extent,
            data,
        })
    }
}

impl<'a> Bound<'a, TextureCube, target::TextureCubeMap> {
    /// Specifies a mip level of one face.
    pub fn upload_face(&self, face: CubeFace, level: u32, format: PixelFormat, size: u32, data: Option<&[u8]>) {
        self.tex_image(TexImage {
            level,
            face: Some(face),
            format,
            extent: [size, size, 1],
            data,
        })
    }
}
