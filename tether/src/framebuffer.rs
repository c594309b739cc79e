//! Framebuffer objects.
//!
//! An uninitialized `Framebuffer` has the null handle, so binding it selects the default
//! framebuffer of the context: `Framebuffer::new().bind::<DrawFramebuffer>(gl).clear(..)` clears
//! the window.
use crate::binding::{Bind, Bound, RestorePolicy};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::handle::{check_initialized, Handle, ObjectKind, Resource};
use crate::renderbuffer::Renderbuffer;
use crate::sampling::Filter;
use crate::target::{
    BindableTo, DrawFramebuffer, FramebufferTarget, Image2dTarget, LayeredTarget, ReadFramebuffer,
};
use crate::texture::Texture;
use bitflags::bitflags;
use tracing::{trace, warn};

/// Maximum number of color attachments.
pub const MAX_COLOR_ATTACHMENTS: u32 = 8;

/// Framebuffer attachment points.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Attachment {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

/// Result of a framebuffer completeness check.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FramebufferStatus {
    Complete,
    Undefined,
    IncompleteAttachment,
    IncompleteMissingAttachment,
    IncompleteDrawBuffer,
    IncompleteReadBuffer,
    Unsupported,
    IncompleteMultisample,
    IncompleteLayerTargets,
    /// A status code not known to this crate.
    Unknown(u32),
}

bitflags! {
    /// Buffers affected by clears and blits.
    #[derive(Default)]
    pub struct ClearMask: u32 {
        const COLOR = 0b001;
        const DEPTH = 0b010;
        const STENCIL = 0b100;
    }
}

/// Values to clear the draw framebuffer with. `None` leaves the buffer untouched.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ClearValues {
    pub color: Option<[f32; 4]>,
    pub depth: Option<f32>,
    pub stencil: Option<i32>,
}

impl ClearValues {
    pub fn color(color: [f32; 4]) -> ClearValues {
        ClearValues {
            color: Some(color),
            ..Default::default()
        }
    }

    pub fn depth(mut self, depth: f32) -> ClearValues {
        self.depth = Some(depth);
        self
    }

    pub fn stencil(mut self, stencil: i32) -> ClearValues {
        self.stencil = Some(stencil);
        self
    }

    pub fn mask(&self) -> ClearMask {
        let mut mask = ClearMask::empty();
        mask.set(ClearMask::COLOR, self.color.is_some());
        mask.set(ClearMask::DEPTH, self.depth.is_some());
        mask.set(ClearMask::STENCIL, self.stencil.is_some());
        mask
    }
}

/// A rectangle in framebuffer pixels. `(x, y)` is the lower-left corner.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Rect {
        Rect { x, y, width, height }
    }

    /// Rectangle at the origin.
    pub fn from_size(width: i32, height: i32) -> Rect {
        Rect::new(0, 0, width, height)
    }
}

/// Attachments last set on a framebuffer, and the result of the last completeness check.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FramebufferInfo {
    /// Bit `i` is set if color attachment `i` is in use.
    pub color_attachments: u8,
    pub depth: bool,
    pub stencil: bool,
    pub status: Option<FramebufferStatus>,
}

impl FramebufferInfo {
    fn set_attachment(&mut self, attachment: Attachment, present: bool) {
        match attachment {
            Attachment::Color(i) => {
                if present {
                    self.color_attachments |= 1 << i;
                } else {
                    self.color_attachments &= !(1 << i);
                }
            }
            Attachment::Depth => self.depth = present,
            Attachment::Stencil => self.stencil = present,
            Attachment::DepthStencil => {
                self.depth = present;
                self.stencil = present;
            }
        }
        self.status = None;
    }
}

impl_resource_type!(
    /// Framebuffer objects.
    pub struct Framebuffer(FramebufferInfo) = ObjectKind::Framebuffer
);

impl<T: FramebufferTarget> BindableTo<T> for Framebuffer {}

fn check_attachment(attachment: Attachment) {
    if let Attachment::Color(i) = attachment {
        assert!(i < MAX_COLOR_ATTACHMENTS, "color attachment index out of range: {}", i);
    }
}

impl<'a, T: FramebufferTarget> Bound<'a, Framebuffer, T> {
    /// Attaches a level of a 2D texture.
    pub fn attach_texture<U: Image2dTarget>(&self, attachment: Attachment, texture: &Texture<U>, level: u32) {
        self.attach_texture_raw(attachment, texture.handle(), level, None)
    }

    /// Attaches one layer of a layered texture (3D, 2D array or cube map face).
    pub fn attach_texture_layer<U: LayeredTarget>(
        &self,
        attachment: Attachment,
        texture: &Texture<U>,
        level: u32,
        layer: u32,
    ) {
        self.attach_texture_raw(attachment, texture.handle(), level, Some(layer))
    }

    fn attach_texture_raw(&self, attachment: Attachment, texture: Handle, level: u32, layer: Option<u32>) {
        if !check_initialized(Framebuffer::KIND, self.handle()) {
            return;
        }
        check_attachment(attachment);
        trace!(handle = %self.handle(), ?attachment, %texture, level, ?layer, "attach texture");
        self.context()
            .backend()
            .framebuffer_texture(T::ID, attachment, texture, level, layer);
        self.resource()
            .cell
            .update_meta(|info| info.set_attachment(attachment, !texture.is_null()));
    }

    pub fn attach_renderbuffer(&self, attachment: Attachment, renderbuffer: &Renderbuffer) {
        if !check_initialized(Framebuffer::KIND, self.handle()) {
            return;
        }
        check_attachment(attachment);
        trace!(handle = %self.handle(), ?attachment, renderbuffer = %renderbuffer.handle(), "attach renderbuffer");
        self.context()
            .backend()
            .framebuffer_renderbuffer(T::ID, attachment, renderbuffer.handle());
        self.resource()
            .cell
            .update_meta(|info| info.set_attachment(attachment, renderbuffer.is_initialized()));
    }

    /// Removes whatever is attached at `attachment`.
    pub fn detach(&self, attachment: Attachment) {
        self.attach_texture_raw(attachment, Handle::NULL, 0, None)
    }

    /// Checks framebuffer completeness.
    pub fn check_status(&self) -> Result<()> {
        if !check_initialized(Framebuffer::KIND, self.handle()) {
            return Err(Error::NotInitialized {
                kind: Framebuffer::KIND,
            });
        }
        let status = self.context().backend().framebuffer_status(T::ID);
        self.resource().cell.update_meta(|info| info.status = Some(status));
        if status == FramebufferStatus::Complete {
            Ok(())
        } else {
            warn!(handle = %self.handle(), ?status, "framebuffer incomplete");
            Err(Error::FramebufferIncomplete(status))
        }
    }
}

impl<'a> Bound<'a, Framebuffer, DrawFramebuffer> {
    /// Selects the color attachments written by the fragment shader outputs, in output order.
    pub fn draw_buffers(&self, attachments: &[Attachment]) {
        if !check_initialized(Framebuffer::KIND, self.handle()) {
            return;
        }
        assert!(attachments.len() <= MAX_COLOR_ATTACHMENTS as usize);
        debug_assert!(
            attachments.iter().all(|a| matches!(a, Attachment::Color(_))),
            "draw buffers must be color attachments"
        );
        self.context().backend().draw_buffers(attachments);
    }

    /// Clears the framebuffer. Works on the default framebuffer too.
    pub fn clear(&self, values: &ClearValues) {
        if values.mask().is_empty() {
            return;
        }
        trace!(handle = %self.handle(), ?values, "clear");
        self.context().backend().clear(values);
    }
}

/// Copies a region of `read` to a region of `draw`.
///
/// `filter` must be `Nearest` if `mask` includes depth or stencil.
pub fn blit(
    read: &Bound<Framebuffer, ReadFramebuffer>,
    draw: &Bound<Framebuffer, DrawFramebuffer>,
    src: Rect,
    dst: Rect,
    mask: ClearMask,
    filter: Filter,
) {
    debug_assert!(
        read.context().same_context(draw.context()),
        "blit between framebuffers of different contexts"
    );
    debug_assert!(
        filter == Filter::Nearest || !mask.intersects(ClearMask::DEPTH | ClearMask::STENCIL),
        "depth and stencil blits must use nearest filtering"
    );
    if mask.is_empty() {
        return;
    }
    trace!(read = %read.handle(), draw = %draw.handle(), ?src, ?dst, ?mask, "blit");
    draw.context().backend().blit_framebuffer(src, dst, mask, filter);
}

#[derive(Copy, Clone)]
enum AttachmentSource<'a> {
    Texture(Handle),
    Renderbuffer(&'a Renderbuffer),
}

/// Builds a complete framebuffer from textures and renderbuffers.
///
/// Color attachments are numbered in the order they are added, and are all enabled as draw
/// buffers.
#[derive(Default)]
pub struct FramebufferBuilder<'a> {
    color_attachments: Vec<AttachmentSource<'a>>,
    depth_attachment: Option<(Attachment, AttachmentSource<'a>)>,
}

impl<'a> FramebufferBuilder<'a> {
    pub fn color_texture<T: Image2dTarget>(&mut self, texture: &'a Texture<T>) -> &mut Self {
        self.color_attachments.push(AttachmentSource::Texture(texture.handle()));
        self
    }

    pub fn color_renderbuffer(&mut self, renderbuffer: &'a Renderbuffer) -> &mut Self {
        self.color_attachments.push(AttachmentSource::Renderbuffer(renderbuffer));
        self
    }

    pub fn depth_texture<T: Image2dTarget>(&mut self, texture: &'a Texture<T>) -> &mut Self {
        self.depth_attachment = Some((Attachment::Depth, AttachmentSource::Texture(texture.handle())));
        self
    }

    pub fn depth_renderbuffer(&mut self, renderbuffer: &'a Renderbuffer) -> &mut Self {
        self.depth_attachment = Some((Attachment::Depth, AttachmentSource::Renderbuffer(renderbuffer)));
        self
    }

    /// Uses a combined depth/stencil renderbuffer.
    pub fn depth_stencil_renderbuffer(&mut self, renderbuffer: &'a Renderbuffer) -> &mut Self {
        self.depth_attachment = Some((Attachment::DepthStencil, AttachmentSource::Renderbuffer(renderbuffer)));
        self
    }

    /// Creates the framebuffer and checks its completeness.
    ///
    /// The draw framebuffer binding is left as it was.
    pub fn build(&self, gl: &Context) -> Result<Framebuffer> {
        assert!(self.color_attachments.len() <= MAX_COLOR_ATTACHMENTS as usize);

        let mut framebuffer = Framebuffer::new();
        framebuffer.initialize(gl)?;
        {
            let bound = framebuffer.bind_with::<DrawFramebuffer>(gl, RestorePolicy::RestorePrevious);
            let attach = |attachment: Attachment, source: AttachmentSource| match source {
                AttachmentSource::Texture(texture) => bound.attach_texture_raw(attachment, texture, 0, None),
                AttachmentSource::Renderbuffer(renderbuffer) => bound.attach_renderbuffer(attachment, renderbuffer),
            };
            for (index, &source) in self.color_attachments.iter().enumerate() {
                attach(Attachment::Color(index as u32), source);
            }
            if let Some((attachment, source)) = self.depth_attachment {
                attach(attachment, source);
            }
            let draw_buffers: Vec<_> = (0..self.color_attachments.len() as u32)
                .map(Attachment::Color)
                .collect();
            bound.draw_buffers(&draw_buffers);
            bound.check_status()?;
        }
        Ok(framebuffer)
    }
}

impl Framebuffer {
    pub fn builder<'a>() -> FramebufferBuilder<'a> {
        FramebufferBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_mask_follows_values() {
        assert_eq!(ClearValues::default().mask(), ClearMask::empty());
        assert_eq!(
            ClearValues::color([0.0; 4]).depth(1.0).mask(),
            ClearMask::COLOR | ClearMask::DEPTH
        );
        assert_eq!(
            ClearValues::default().stencil(0).mask(),
            ClearMask::STENCIL
        );
    }

    #[test]
    fn attachment_bookkeeping() {
        let mut info = FramebufferInfo::default();
        info.set_attachment(Attachment::Color(0), true);
        info.set_attachment(Attachment::Color(3), true);
        info.set_attachment(Attachment::DepthStencil, true);
        assert_eq!(info.color_attachments, 0b1001);
        assert!(info.depth && info.stencil);
        info.set_attachment(Attachment::Color(0), false);
        info.set_attachment(Attachment::Stencil, false);
        assert_eq!(info.color_attachments, 0b1000);
        assert!(info.depth && !info.stencil);
    }
}
