use crate::binding::Bound;
use crate::format::PixelFormat;
use crate::handle::{check_initialized, ObjectKind, Resource};
use crate::target::{BindableTo, RenderbufferTarget};
use tracing::trace;

/// Storage last allocated for a renderbuffer.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RenderbufferInfo {
    pub format: Option<PixelFormat>,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

impl_resource_type!(
    /// Renderbuffer objects: images usable only as framebuffer attachments.
    pub struct Renderbuffer(RenderbufferInfo) = ObjectKind::Renderbuffer
);

impl BindableTo<RenderbufferTarget> for Renderbuffer {}

impl<'a> Bound<'a, Renderbuffer, RenderbufferTarget> {
    /// Allocates (or reallocates) the storage. `samples == 0` means no multisampling.
    pub fn storage(&self, format: PixelFormat, width: u32, height: u32, samples: u32) {
        if !check_initialized(Renderbuffer::KIND, self.handle()) {
            return;
        }
        trace!(handle = %self.handle(), ?format, width, height, samples, "renderbuffer storage");
        self.context()
            .backend()
            .renderbuffer_storage(format, width, height, samples);
        self.resource().cell.set_meta(RenderbufferInfo {
            format: Some(format),
            width,
            height,
            samples,
        });
    }
}
