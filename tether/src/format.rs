//! Pixel formats of textures and renderbuffers.

/// Pixel formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serializing", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    Srgb8,
    Srgb8Alpha8,
    R16F,
    Rg16F,
    Rgba16F,
    R32F,
    Rg32F,
    Rgb32F,
    Rgba32F,
    R32UI,
    Rgba32UI,
    Depth16,
    Depth24,
    Depth32F,
    Depth24Stencil8,
    Depth32FStencil8,
}

/// Information about the memory layout of a pixel format, as uploaded by the client.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FormatInfo {
    /// Number of components.
    pub num_components: u8,
    /// Size of a pixel in bytes, in client memory.
    pub byte_size: usize,
    pub depth: bool,
    pub stencil: bool,
}

impl PixelFormat {
    pub fn format_info(self) -> FormatInfo {
        use PixelFormat::*;
        let (num_components, byte_size, depth, stencil) = match self {
            R8 => (1, 1, false, false),
            Rg8 => (2, 2, false, false),
            Rgb8 | Srgb8 => (3, 3, false, false),
            Rgba8 | Srgb8Alpha8 => (4, 4, false, false),
            R16F => (1, 2, false, false),
            Rg16F => (2, 4, false, false),
            Rgba16F => (4, 8, false, false),
            R32F | R32UI => (1, 4, false, false),
            Rg32F => (2, 8, false, false),
            Rgb32F => (3, 12, false, false),
            Rgba32F | Rgba32UI => (4, 16, false, false),
            Depth16 => (1, 2, true, false),
            Depth24 => (1, 4, true, false),
            Depth32F => (1, 4, true, false),
            Depth24Stencil8 => (2, 4, true, true),
            Depth32FStencil8 => (2, 8, true, true),
        };
        FormatInfo {
            num_components,
            byte_size,
            depth,
            stencil,
        }
    }

    pub fn is_depth(self) -> bool {
        self.format_info().depth
    }

    pub fn is_stencil(self) -> bool {
        self.format_info().stencil
    }

    /// Size in bytes of an image with the given extent.
    pub fn image_size(self, width: u32, height: u32, depth: u32) -> usize {
        width as usize * height as usize * depth as usize * self.format_info().byte_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_sizes() {
        assert_eq!(PixelFormat::Rgba8.image_size(4, 4, 1), 64);
        assert_eq!(PixelFormat::Rgb32F.image_size(2, 1, 1), 24);
        assert_eq!(PixelFormat::R8.image_size(3, 3, 3), 27);
        assert!(PixelFormat::Depth24Stencil8.is_depth());
        assert!(PixelFormat::Depth24Stencil8.is_stencil());
        assert!(!PixelFormat::Depth32F.is_stencil());
    }
}
