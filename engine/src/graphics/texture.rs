use std::mem::ManuallyDrop;
use std::sync::Arc;

use super::gpu::Device as _;
use super::gpu::Texture as _;
use super::gpu::{
    GPUError,
    TextureInfo,
    TextureViewInfo,
};
use super::*;

pub struct Texture<B: GPUBackend> {
    texture: ManuallyDrop<B::Texture>,
    tracker: Arc<ReferenceTracker>,
    destroyer: Arc<DeferredDestroyer<B>>,
    name: Option<String>,
}

impl<B: GPUBackend> Drop for Texture<B> {
    fn drop(&mut self) {
        let texture = unsafe { ManuallyDrop::take(&mut self.texture) };
        self.destroyer
            .retire(self.tracker.clone(), RetiredResource::Texture(texture));
    }
}

impl<B: GPUBackend> Texture<B> {
    pub(super) fn new(
        device: &B::Device,
        destroyer: &Arc<DeferredDestroyer<B>>,
        info: &TextureInfo,
        name: Option<&str>,
    ) -> Result<Self, GPUError> {
        let texture = unsafe { device.create_texture(info, name)? };
        Ok(Self {
            texture: ManuallyDrop::new(texture),
            tracker: Arc::new(ReferenceTracker::new()),
            destroyer: destroyer.clone(),
            name: name.map(str::to_string),
        })
    }

    #[inline(always)]
    pub fn info(&self) -> &TextureInfo {
        self.texture.info()
    }

    #[inline(always)]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::Texture {
        &self.texture
    }
}

impl<B: GPUBackend> TrackedResource for Texture<B> {
    fn reference_tracker(&self) -> &Arc<ReferenceTracker> {
        &self.tracker
    }
}

/// Keeps its texture alive until the view itself is destroyed.
pub struct TextureView<B: GPUBackend> {
    view: ManuallyDrop<B::TextureView>,
    texture: Arc<Texture<B>>,
    info: TextureViewInfo,
    tracker: Arc<ReferenceTracker>,
    destroyer: Arc<DeferredDestroyer<B>>,
}

impl<B: GPUBackend> Drop for TextureView<B> {
    fn drop(&mut self) {
        let view = unsafe { ManuallyDrop::take(&mut self.view) };
        self.destroyer.retire(
            self.tracker.clone(),
            RetiredResource::TextureView {
                view,
                texture: self.texture.clone(),
            },
        );
    }
}

impl<B: GPUBackend> TextureView<B> {
    pub(super) fn new(
        device: &B::Device,
        destroyer: &Arc<DeferredDestroyer<B>>,
        texture: &Arc<Texture<B>>,
        info: &TextureViewInfo,
        name: Option<&str>,
    ) -> Result<Self, GPUError> {
        let view = unsafe { device.create_texture_view(texture.handle(), info, name)? };
        Ok(Self {
            view: ManuallyDrop::new(view),
            texture: texture.clone(),
            info: *info,
            tracker: Arc::new(ReferenceTracker::new()),
            destroyer: destroyer.clone(),
        })
    }

    #[inline(always)]
    pub fn texture(&self) -> &Arc<Texture<B>> {
        &self.texture
    }

    #[inline(always)]
    pub fn info(&self) -> &TextureViewInfo {
        &self.info
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::TextureView {
        &self.view
    }
}

impl<B: GPUBackend> TrackedResource for TextureView<B> {
    fn reference_tracker(&self) -> &Arc<ReferenceTracker> {
        &self.tracker
    }
}
