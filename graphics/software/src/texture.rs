use std::sync::Arc;

use emberline_core::gpu::*;
use parking_lot::Mutex;

use crate::liveness::{
    Liveness,
    ResourceProbe,
};

pub(crate) struct TextureStorage {
    pub(crate) info: TextureInfo,
    /// Tightly packed texels, indexed by `TextureInfo::subresource_index`.
    pub(crate) subresources: Vec<Mutex<Vec<u8>>>,
    pub(crate) layouts: Mutex<Vec<TextureLayout>>,
    pub(crate) liveness: Arc<Liveness>,
}

impl TextureStorage {
    pub(crate) fn row_pitch(&self, mip_level: u32) -> usize {
        self.info.mip_extent(mip_level).width as usize * self.info.format.element_size() as usize
    }

    pub(crate) fn slice_pitch(&self, mip_level: u32) -> usize {
        self.row_pitch(mip_level) * self.info.mip_extent(mip_level).height as usize
    }

    pub(crate) fn mip_of(&self, subresource: u32) -> u32 {
        subresource % self.info.mip_levels
    }
}

pub struct SoftwareTexture {
    storage: Arc<TextureStorage>,
}

impl SoftwareTexture {
    pub(crate) fn new(id: u64, info: &TextureInfo) -> Self {
        let mut subresources = Vec::with_capacity(info.subresource_count() as usize);
        for _layer in 0..info.array_length {
            for mip in 0..info.mip_levels {
                let extent = info.mip_extent(mip);
                let size = extent.width as usize
                    * extent.height as usize
                    * extent.depth as usize
                    * info.format.element_size() as usize;
                subresources.push(Mutex::new(vec![0u8; size]));
            }
        }

        Self {
            storage: Arc::new(TextureStorage {
                info: *info,
                subresources,
                layouts: Mutex::new(vec![TextureLayout::Undefined; info.subresource_count() as usize]),
                liveness: Liveness::new(id, "texture"),
            }),
        }
    }

    pub(crate) fn storage(&self) -> &Arc<TextureStorage> {
        &self.storage
    }

    pub fn probe(&self) -> ResourceProbe {
        ResourceProbe::new(&self.storage.liveness)
    }
}

impl Drop for SoftwareTexture {
    fn drop(&mut self) {
        self.storage.liveness.mark_destroyed();
    }
}

impl Texture for SoftwareTexture {
    fn info(&self) -> &TextureInfo {
        &self.storage.info
    }

    unsafe fn map_subresource(&self, subresource: u32) -> Option<MappedSubresource> {
        if !self.storage.info.is_staging() {
            return None;
        }
        let mip_level = self.storage.mip_of(subresource);
        let mut data = self.storage.subresources.get(subresource as usize)?.lock();
        Some(MappedSubresource {
            data: data.as_mut_ptr(),
            size: data.len() as u64,
            row_pitch: self.storage.row_pitch(mip_level) as u64,
            depth_pitch: self.storage.slice_pitch(mip_level) as u64,
        })
    }

    unsafe fn unmap_subresource(&self, _subresource: u32) {}
}

pub(crate) struct TextureViewStorage {
    pub(crate) texture: Arc<TextureStorage>,
    pub(crate) info: TextureViewInfo,
    pub(crate) liveness: Arc<Liveness>,
}

pub struct SoftwareTextureView {
    storage: Arc<TextureViewStorage>,
}

impl SoftwareTextureView {
    pub(crate) fn new(id: u64, texture: &SoftwareTexture, info: &TextureViewInfo) -> Self {
        Self {
            storage: Arc::new(TextureViewStorage {
                texture: texture.storage().clone(),
                info: *info,
                liveness: Liveness::new(id, "texture view"),
            }),
        }
    }

    pub(crate) fn storage(&self) -> &Arc<TextureViewStorage> {
        &self.storage
    }

    pub fn info(&self) -> &TextureViewInfo {
        &self.storage.info
    }

    pub fn probe(&self) -> ResourceProbe {
        ResourceProbe::new(&self.storage.liveness)
    }
}

impl Drop for SoftwareTextureView {
    fn drop(&mut self) {
        self.storage.liveness.mark_destroyed();
    }
}

pub(crate) struct SamplerStorage {
    pub(crate) info: SamplerInfo,
    pub(crate) liveness: Arc<Liveness>,
}

pub struct SoftwareSampler {
    storage: Arc<SamplerStorage>,
}

impl SoftwareSampler {
    pub(crate) fn new(id: u64, info: &SamplerInfo) -> Self {
        Self {
            storage: Arc::new(SamplerStorage {
                info: info.clone(),
                liveness: Liveness::new(id, "sampler"),
            }),
        }
    }

    pub(crate) fn storage(&self) -> &Arc<SamplerStorage> {
        &self.storage
    }

    pub fn info(&self) -> &SamplerInfo {
        &self.storage.info
    }

    pub fn probe(&self) -> ResourceProbe {
        ResourceProbe::new(&self.storage.liveness)
    }
}

impl Drop for SoftwareSampler {
    fn drop(&mut self) {
        self.storage.liveness.mark_destroyed();
    }
}
