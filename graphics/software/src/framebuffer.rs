use std::sync::Arc;

use emberline_core::gpu::*;

use crate::liveness::{
    Liveness,
    ResourceProbe,
};
use crate::texture::TextureStorage;
use crate::SoftwareBackend;

pub(crate) struct AttachmentStorage {
    pub(crate) texture: Arc<TextureStorage>,
    pub(crate) mip_level: u32,
    pub(crate) array_layer: u32,
}

impl AttachmentStorage {
    fn new(info: &FramebufferAttachmentInfo<SoftwareBackend>) -> Self {
        Self {
            texture: info.texture.storage().clone(),
            mip_level: info.mip_level,
            array_layer: info.array_layer,
        }
    }

    pub(crate) fn subresource(&self) -> u32 {
        self.texture.info.subresource_index(self.mip_level, self.array_layer)
    }
}

pub(crate) struct FramebufferStorage {
    pub(crate) color_targets: Vec<AttachmentStorage>,
    pub(crate) depth_target: Option<AttachmentStorage>,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) liveness: Arc<Liveness>,
}

impl FramebufferStorage {
    pub(crate) fn attachments(&self) -> impl Iterator<Item = &AttachmentStorage> {
        self.color_targets.iter().chain(self.depth_target.iter())
    }
}

pub struct SoftwareFramebuffer {
    storage: Arc<FramebufferStorage>,
}

impl SoftwareFramebuffer {
    pub(crate) fn new(id: u64, info: &FramebufferInfo<SoftwareBackend>) -> Result<Self, GPUError> {
        let color_targets: Vec<AttachmentStorage> = info.color_targets.iter().map(AttachmentStorage::new).collect();
        let depth_target = info.depth_target.as_ref().map(AttachmentStorage::new);

        // The renderable area is the intersection of all attachments.
        let mut extent: Option<(u32, u32)> = None;
        for attachment in color_targets.iter().chain(depth_target.iter()) {
            let mip_extent = attachment.texture.info.mip_extent(attachment.mip_level);
            extent = Some(match extent {
                Some((width, height)) => (width.min(mip_extent.width), height.min(mip_extent.height)),
                None => (mip_extent.width, mip_extent.height),
            });
        }
        let (width, height) = extent.ok_or(GPUError::Unsupported("framebuffer without attachments"))?;

        Ok(Self {
            storage: Arc::new(FramebufferStorage {
                color_targets,
                depth_target,
                width,
                height,
                liveness: Liveness::new(id, "framebuffer"),
            }),
        })
    }

    pub(crate) fn storage(&self) -> &Arc<FramebufferStorage> {
        &self.storage
    }

    pub fn probe(&self) -> ResourceProbe {
        ResourceProbe::new(&self.storage.liveness)
    }
}

impl Drop for SoftwareFramebuffer {
    fn drop(&mut self) {
        self.storage.liveness.mark_destroyed();
    }
}

impl Framebuffer for SoftwareFramebuffer {
    fn width(&self) -> u32 {
        self.storage.width
    }

    fn height(&self) -> u32 {
        self.storage.height
    }

    fn color_target_count(&self) -> u32 {
        self.storage.color_targets.len() as u32
    }

    fn has_depth_target(&self) -> bool {
        self.storage.depth_target.is_some()
    }
}
