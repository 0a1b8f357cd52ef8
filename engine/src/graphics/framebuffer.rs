use std::mem::ManuallyDrop;
use std::sync::Arc;

use smallvec::SmallVec;

use super::gpu::Device as _;
use super::gpu::Framebuffer as _;
use super::gpu::{
    ClearRect,
    FramebufferAttachmentInfo,
    FramebufferInfo,
    GPUError,
};
use super::*;

/// One mip level of one array layer of a texture.
pub struct FramebufferAttachment<B: GPUBackend> {
    pub texture: Arc<Texture<B>>,
    pub mip_level: u32,
    pub array_layer: u32,
}

impl<B: GPUBackend> FramebufferAttachment<B> {
    pub fn new(texture: &Arc<Texture<B>>) -> Self {
        Self {
            texture: texture.clone(),
            mip_level: 0,
            array_layer: 0,
        }
    }
}

impl<B: GPUBackend> Clone for FramebufferAttachment<B> {
    fn clone(&self) -> Self {
        Self {
            texture: self.texture.clone(),
            mip_level: self.mip_level,
            array_layer: self.array_layer,
        }
    }
}

pub struct Framebuffer<B: GPUBackend> {
    framebuffer: ManuallyDrop<B::Framebuffer>,
    color_targets: SmallVec<[FramebufferAttachment<B>; 4]>,
    depth_target: Option<FramebufferAttachment<B>>,
    tracker: Arc<ReferenceTracker>,
    destroyer: Arc<DeferredDestroyer<B>>,
}

impl<B: GPUBackend> Drop for Framebuffer<B> {
    fn drop(&mut self) {
        let framebuffer = unsafe { ManuallyDrop::take(&mut self.framebuffer) };
        let attachments = self
            .color_targets
            .drain(..)
            .chain(self.depth_target.take())
            .map(|attachment| attachment.texture)
            .collect();
        self.destroyer.retire(
            self.tracker.clone(),
            RetiredResource::Framebuffer {
                framebuffer,
                attachments,
            },
        );
    }
}

impl<B: GPUBackend> Framebuffer<B> {
    pub(super) fn new(
        device: &B::Device,
        destroyer: &Arc<DeferredDestroyer<B>>,
        color_targets: &[FramebufferAttachment<B>],
        depth_target: Option<&FramebufferAttachment<B>>,
    ) -> Result<Self, GPUError> {
        if color_targets.is_empty() && depth_target.is_none() {
            return Err(GPUError::Unsupported("framebuffer without attachments"));
        }
        let native_color_targets: SmallVec<[FramebufferAttachmentInfo<B>; 4]> = color_targets
            .iter()
            .map(|attachment| FramebufferAttachmentInfo {
                texture: attachment.texture.handle(),
                mip_level: attachment.mip_level,
                array_layer: attachment.array_layer,
            })
            .collect();
        let framebuffer = unsafe {
            device.create_framebuffer(&FramebufferInfo {
                color_targets: &native_color_targets,
                depth_target: depth_target.map(|attachment| FramebufferAttachmentInfo {
                    texture: attachment.texture.handle(),
                    mip_level: attachment.mip_level,
                    array_layer: attachment.array_layer,
                }),
            })?
        };

        Ok(Self {
            framebuffer: ManuallyDrop::new(framebuffer),
            color_targets: color_targets.iter().cloned().collect(),
            depth_target: depth_target.cloned(),
            tracker: Arc::new(ReferenceTracker::new()),
            destroyer: destroyer.clone(),
        })
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.framebuffer.width()
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.framebuffer.height()
    }

    pub fn color_targets(&self) -> &[FramebufferAttachment<B>] {
        &self.color_targets
    }

    pub fn color_target_count(&self) -> u32 {
        self.color_targets.len() as u32
    }

    pub fn depth_target(&self) -> Option<&FramebufferAttachment<B>> {
        self.depth_target.as_ref()
    }

    pub fn has_depth_target(&self) -> bool {
        self.depth_target.is_some()
    }

    /// The whole renderable area of every attachment.
    pub fn full_rect(&self) -> ClearRect {
        ClearRect {
            x: 0,
            y: 0,
            width: self.width(),
            height: self.height(),
            base_array_layer: 0,
            layer_count: 1,
        }
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::Framebuffer {
        &self.framebuffer
    }
}

impl<B: GPUBackend> TrackedResource for Framebuffer<B> {
    fn reference_tracker(&self) -> &Arc<ReferenceTracker> {
        &self.tracker
    }
}
