use std::mem::ManuallyDrop;
use std::sync::Arc;

use smallvec::SmallVec;

use super::gpu::Device as _;
use super::gpu::{
    BindingResource,
    GPUError,
    ResourceKind,
    ResourceLayoutElement,
    ResourceLayoutInfo,
};
use super::*;

pub struct ResourceLayout<B: GPUBackend> {
    layout: ManuallyDrop<B::ResourceLayout>,
    elements: Vec<ResourceLayoutElement>,
    tracker: Arc<ReferenceTracker>,
    destroyer: Arc<DeferredDestroyer<B>>,
}

impl<B: GPUBackend> Drop for ResourceLayout<B> {
    fn drop(&mut self) {
        let layout = unsafe { ManuallyDrop::take(&mut self.layout) };
        self.destroyer
            .retire(self.tracker.clone(), RetiredResource::ResourceLayout(layout));
    }
}

impl<B: GPUBackend> ResourceLayout<B> {
    pub(super) fn new(
        device: &B::Device,
        destroyer: &Arc<DeferredDestroyer<B>>,
        info: &ResourceLayoutInfo,
    ) -> Result<Self, GPUError> {
        let layout = unsafe { device.create_resource_layout(info)? };
        Ok(Self {
            layout: ManuallyDrop::new(layout),
            elements: info.elements.to_vec(),
            tracker: Arc::new(ReferenceTracker::new()),
            destroyer: destroyer.clone(),
        })
    }

    pub fn elements(&self) -> &[ResourceLayoutElement] {
        &self.elements
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::ResourceLayout {
        &self.layout
    }
}

/// A resource bound into a [`ResourceSet`]. The set holds on to it for as
/// long as the set itself exists.
pub enum ResourceBinding<B: GPUBackend> {
    UniformBuffer {
        buffer: Arc<Buffer<B>>,
        offset: u64,
        length: u64,
    },
    StorageBuffer {
        buffer: Arc<Buffer<B>>,
        offset: u64,
        length: u64,
    },
    SampledTexture(Arc<TextureView<B>>),
    StorageTexture(Arc<TextureView<B>>),
    Sampler(Arc<Sampler<B>>),
}

impl<B: GPUBackend> Clone for ResourceBinding<B> {
    fn clone(&self) -> Self {
        match self {
            ResourceBinding::UniformBuffer { buffer, offset, length } => ResourceBinding::UniformBuffer {
                buffer: buffer.clone(),
                offset: *offset,
                length: *length,
            },
            ResourceBinding::StorageBuffer { buffer, offset, length } => ResourceBinding::StorageBuffer {
                buffer: buffer.clone(),
                offset: *offset,
                length: *length,
            },
            ResourceBinding::SampledTexture(view) => ResourceBinding::SampledTexture(view.clone()),
            ResourceBinding::StorageTexture(view) => ResourceBinding::StorageTexture(view.clone()),
            ResourceBinding::Sampler(sampler) => ResourceBinding::Sampler(sampler.clone()),
        }
    }
}

impl<B: GPUBackend> ResourceBinding<B> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceBinding::UniformBuffer { .. } => ResourceKind::UniformBuffer,
            ResourceBinding::StorageBuffer { .. } => ResourceKind::StorageBuffer,
            ResourceBinding::SampledTexture(_) => ResourceKind::SampledTexture,
            ResourceBinding::StorageTexture(_) => ResourceKind::StorageTexture,
            ResourceBinding::Sampler(_) => ResourceKind::Sampler,
        }
    }

    fn reference_tracker(&self) -> &Arc<ReferenceTracker> {
        match self {
            ResourceBinding::UniformBuffer { buffer, .. } | ResourceBinding::StorageBuffer { buffer, .. } => {
                buffer.reference_tracker()
            }
            ResourceBinding::SampledTexture(view) | ResourceBinding::StorageTexture(view) => {
                view.reference_tracker()
            }
            ResourceBinding::Sampler(sampler) => sampler.reference_tracker(),
        }
    }

    fn as_native(&self) -> BindingResource<'_, B> {
        match self {
            ResourceBinding::UniformBuffer { buffer, offset, length } => BindingResource::UniformBuffer {
                buffer: buffer.handle(),
                offset: *offset,
                length: *length,
            },
            ResourceBinding::StorageBuffer { buffer, offset, length } => BindingResource::StorageBuffer {
                buffer: buffer.handle(),
                offset: *offset,
                length: *length,
            },
            ResourceBinding::SampledTexture(view) => BindingResource::SampledTexture(view.handle()),
            ResourceBinding::StorageTexture(view) => BindingResource::StorageTexture(view.handle()),
            ResourceBinding::Sampler(sampler) => BindingResource::Sampler(sampler.handle()),
        }
    }
}

/// A set of resources bound together.
///
/// Every bound resource stays referenced for as long as the native set
/// exists, including while the set itself waits for in-flight submissions
/// after its handle was dropped.
pub struct ResourceSet<B: GPUBackend> {
    set: ManuallyDrop<B::ResourceSet>,
    layout: Arc<ResourceLayout<B>>,
    bindings: SmallVec<[ResourceBinding<B>; 8]>,
    tracker: Arc<ReferenceTracker>,
    destroyer: Arc<DeferredDestroyer<B>>,
}

impl<B: GPUBackend> Drop for ResourceSet<B> {
    fn drop(&mut self) {
        let set = unsafe { ManuallyDrop::take(&mut self.set) };
        self.destroyer.retire(
            self.tracker.clone(),
            RetiredResource::ResourceSet(RetiredResourceSet {
                set,
                bindings: std::mem::take(&mut self.bindings),
                _layout: self.layout.clone(),
            }),
        );
    }
}

impl<B: GPUBackend> ResourceSet<B> {
    pub(super) fn new(
        device: &B::Device,
        destroyer: &Arc<DeferredDestroyer<B>>,
        layout: &Arc<ResourceLayout<B>>,
        bindings: &[ResourceBinding<B>],
    ) -> Result<Self, GPUError> {
        let native_bindings: SmallVec<[BindingResource<B>; 8]> =
            bindings.iter().map(ResourceBinding::as_native).collect();
        let set = unsafe { device.create_resource_set(layout.handle(), &native_bindings)? };

        for binding in bindings {
            binding.reference_tracker().increment();
        }

        Ok(Self {
            set: ManuallyDrop::new(set),
            layout: layout.clone(),
            bindings: bindings.iter().cloned().collect(),
            tracker: Arc::new(ReferenceTracker::new()),
            destroyer: destroyer.clone(),
        })
    }

    pub fn layout(&self) -> &Arc<ResourceLayout<B>> {
        &self.layout
    }

    pub fn bindings(&self) -> &[ResourceBinding<B>] {
        &self.bindings
    }

    #[inline(always)]
    pub fn handle(&self) -> &B::ResourceSet {
        &self.set
    }
}

impl<B: GPUBackend> TrackedResource for ResourceSet<B> {
    fn reference_tracker(&self) -> &Arc<ReferenceTracker> {
        &self.tracker
    }
}

pub(super) struct RetiredResourceSet<B: GPUBackend> {
    set: B::ResourceSet,
    bindings: SmallVec<[ResourceBinding<B>; 8]>,
    _layout: Arc<ResourceLayout<B>>,
}

impl<B: GPUBackend> Drop for RetiredResourceSet<B> {
    fn drop(&mut self) {
        for binding in &self.bindings {
            binding.reference_tracker().decrement();
        }
    }
}
