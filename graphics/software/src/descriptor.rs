use std::sync::Arc;

use emberline_core::gpu::*;

use crate::buffer::BufferStorage;
use crate::liveness::{
    Liveness,
    ResourceProbe,
};
use crate::texture::{
    SamplerStorage,
    TextureViewStorage,
};
use crate::SoftwareBackend;

pub(crate) struct ResourceLayoutStorage {
    pub(crate) elements: Vec<ResourceLayoutElement>,
    pub(crate) liveness: Arc<Liveness>,
}

pub struct SoftwareResourceLayout {
    storage: Arc<ResourceLayoutStorage>,
}

impl SoftwareResourceLayout {
    pub(crate) fn new(id: u64, info: &ResourceLayoutInfo) -> Self {
        Self {
            storage: Arc::new(ResourceLayoutStorage {
                elements: info.elements.to_vec(),
                liveness: Liveness::new(id, "resource layout"),
            }),
        }
    }

    pub fn elements(&self) -> &[ResourceLayoutElement] {
        &self.storage.elements
    }
}

impl Drop for SoftwareResourceLayout {
    fn drop(&mut self) {
        self.storage.liveness.mark_destroyed();
    }
}

pub(crate) enum SoftwareBinding {
    Buffer(Arc<BufferStorage>),
    TextureView(Arc<TextureViewStorage>),
    Sampler(Arc<SamplerStorage>),
}

pub(crate) struct ResourceSetStorage {
    pub(crate) layout: Arc<ResourceLayoutStorage>,
    pub(crate) bindings: Vec<SoftwareBinding>,
    pub(crate) liveness: Arc<Liveness>,
}

impl ResourceSetStorage {
    /// Describes the first object this set needs that no longer exists.
    pub(crate) fn find_destroyed(&self) -> Option<String> {
        if self.liveness.is_destroyed() {
            return Some(self.liveness.describe());
        }
        if self.layout.liveness.is_destroyed() {
            return Some(self.layout.liveness.describe());
        }
        self.bindings.iter().find_map(|binding| {
            let liveness = match binding {
                SoftwareBinding::Buffer(buffer) => &buffer.liveness,
                SoftwareBinding::TextureView(view) => {
                    if view.texture.liveness.is_destroyed() {
                        return Some(view.texture.liveness.describe());
                    }
                    &view.liveness
                }
                SoftwareBinding::Sampler(sampler) => &sampler.liveness,
            };
            liveness.is_destroyed().then(|| liveness.describe())
        })
    }
}

pub struct SoftwareResourceSet {
    storage: Arc<ResourceSetStorage>,
}

impl SoftwareResourceSet {
    pub(crate) fn new(
        id: u64,
        layout: &SoftwareResourceLayout,
        resources: &[BindingResource<SoftwareBackend>],
    ) -> Result<Self, GPUError> {
        if resources.len() != layout.storage.elements.len() {
            return Err(GPUError::Backend(format!(
                "resource set has {} resources, its layout expects {}",
                resources.len(),
                layout.storage.elements.len()
            )));
        }

        let mut bindings = Vec::with_capacity(resources.len());
        for (element, resource) in layout.storage.elements.iter().zip(resources) {
            if element.kind != resource.kind() {
                return Err(GPUError::Backend(format!(
                    "resource of kind {:?} bound to a {:?} slot",
                    resource.kind(),
                    element.kind
                )));
            }
            bindings.push(match resource {
                BindingResource::UniformBuffer { buffer, .. }
                | BindingResource::StorageBuffer { buffer, .. } => {
                    SoftwareBinding::Buffer(buffer.storage().clone())
                }
                BindingResource::SampledTexture(view) | BindingResource::StorageTexture(view) => {
                    SoftwareBinding::TextureView(view.storage().clone())
                }
                BindingResource::Sampler(sampler) => SoftwareBinding::Sampler(sampler.storage().clone()),
            });
        }

        Ok(Self {
            storage: Arc::new(ResourceSetStorage {
                layout: layout.storage.clone(),
                bindings,
                liveness: Liveness::new(id, "resource set"),
            }),
        })
    }

    pub(crate) fn storage(&self) -> &Arc<ResourceSetStorage> {
        &self.storage
    }

    pub fn probe(&self) -> ResourceProbe {
        ResourceProbe::new(&self.storage.liveness)
    }
}

impl Drop for SoftwareResourceSet {
    fn drop(&mut self) {
        self.storage.liveness.mark_destroyed();
    }
}
