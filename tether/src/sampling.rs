//! Texture sampling parameters.

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub enum SamplerAddressMode {
    Clamp,
    Mirror,
    Wrap,
}

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub enum Filter {
    Nearest,
    Linear,
}

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub enum SamplerMipmapMode {
    Nearest,
    Linear,
}

/// A texture parameter, set with `Bound::<Texture<T>, T>::set_parameter`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TextureParameter {
    /// Minification filter. `None` disables mipmapping.
    MinFilter(Filter, Option<SamplerMipmapMode>),
    MagFilter(Filter),
    WrapS(SamplerAddressMode),
    WrapT(SamplerAddressMode),
    WrapR(SamplerAddressMode),
    BaseLevel(u32),
    MaxLevel(u32),
    BorderColor([f32; 4]),
}

/// Complete sampling state of a texture.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplerDescription {
    pub addr_u: SamplerAddressMode,
    pub addr_v: SamplerAddressMode,
    pub addr_w: SamplerAddressMode,
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub mipmap_mode: Option<SamplerMipmapMode>,
    pub border_color: [f32; 4],
}

impl SamplerDescription {
    pub const LINEAR: SamplerDescription = SamplerDescription {
        addr_u: SamplerAddressMode::Clamp,
        addr_v: SamplerAddressMode::Clamp,
        addr_w: SamplerAddressMode::Clamp,
        mag_filter: Filter::Linear,
        min_filter: Filter::Linear,
        mipmap_mode: None,
        border_color: [0.0, 0.0, 0.0, 0.0],
    };

    pub const NEAREST: SamplerDescription = SamplerDescription {
        addr_u: SamplerAddressMode::Clamp,
        addr_v: SamplerAddressMode::Clamp,
        addr_w: SamplerAddressMode::Clamp,
        mag_filter: Filter::Nearest,
        min_filter: Filter::Nearest,
        mipmap_mode: None,
        border_color: [0.0, 0.0, 0.0, 0.0],
    };

    pub const LINEAR_MIPMAP_LINEAR: SamplerDescription = SamplerDescription {
        addr_u: SamplerAddressMode::Clamp,
        addr_v: SamplerAddressMode::Clamp,
        addr_w: SamplerAddressMode::Clamp,
        mag_filter: Filter::Linear,
        min_filter: Filter::Linear,
        mipmap_mode: Some(SamplerMipmapMode::Linear),
        border_color: [0.0, 0.0, 0.0, 0.0],
    };

    pub const WRAP_LINEAR_MIPMAP_LINEAR: SamplerDescription = SamplerDescription {
        addr_u: SamplerAddressMode::Wrap,
        addr_v: SamplerAddressMode::Wrap,
        addr_w: SamplerAddressMode::Wrap,
        mag_filter: Filter::Linear,
        min_filter: Filter::Linear,
        mipmap_mode: Some(SamplerMipmapMode::Linear),
        border_color: [0.0, 0.0, 0.0, 0.0],
    };

    /// The parameters to set on a texture to apply this description.
    pub fn parameters(&self) -> [TextureParameter; 6] {
        [
            TextureParameter::MinFilter(self.min_filter, self.mipmap_mode),
            TextureParameter::MagFilter(self.mag_filter),
            TextureParameter::WrapS(self.addr_u),
            TextureParameter::WrapT(self.addr_v),
            TextureParameter::WrapR(self.addr_w),
            TextureParameter::BorderColor(self.border_color),
        ]
    }
}
