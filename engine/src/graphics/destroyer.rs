use std::sync::Arc;

use log::trace;
use parking_lot::Mutex;
use smallvec::SmallVec;

use super::*;

/// A native object whose application handle is gone.
///
/// Objects that depend on other wrappers keep them alive; enum fields drop in
/// declaration order, so the native object always goes first.
pub(super) enum RetiredResource<B: GPUBackend> {
    Buffer(B::Buffer),
    Texture(B::Texture),
    TextureView {
        view: B::TextureView,
        texture: Arc<Texture<B>>,
    },
    Sampler(B::Sampler),
    ResourceLayout(B::ResourceLayout),
    ResourceSet(RetiredResourceSet<B>),
    Framebuffer {
        framebuffer: B::Framebuffer,
        attachments: SmallVec<[Arc<Texture<B>>; 5]>,
    },
    Pipeline(B::Pipeline),
}

impl<B: GPUBackend> RetiredResource<B> {
    fn kind(&self) -> &'static str {
        match self {
            RetiredResource::Buffer(_) => "buffer",
            RetiredResource::Texture(_) => "texture",
            RetiredResource::TextureView { .. } => "texture view",
            RetiredResource::Sampler(_) => "sampler",
            RetiredResource::ResourceLayout(_) => "resource layout",
            RetiredResource::ResourceSet(_) => "resource set",
            RetiredResource::Framebuffer { .. } => "framebuffer",
            RetiredResource::Pipeline(_) => "pipeline",
        }
    }
}

pub(super) struct DeferredDestroyer<B: GPUBackend> {
    retired: Mutex<Vec<(Arc<ReferenceTracker>, RetiredResource<B>)>>,
}

impl<B: GPUBackend> DeferredDestroyer<B> {
    pub(super) fn new() -> Self {
        Self {
            retired: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn retire(&self, tracker: Arc<ReferenceTracker>, resource: RetiredResource<B>) {
        trace!(
            "Retiring {}, still referenced by {} submissions",
            resource.kind(),
            tracker.count()
        );
        self.retired.lock().push((tracker, resource));
    }

    /// Destroys every retired object that no submitted recording references anymore.
    /// Returns the number of destroyed objects.
    pub(super) fn destroy_unused(&self) -> usize {
        let mut destroyed = 0usize;
        loop {
            let unused: Vec<RetiredResource<B>> = {
                let mut guard = self.retired.lock();
                let mut unused = Vec::new();
                let mut index = 0;
                while index < guard.len() {
                    if guard[index].0.is_referenced() {
                        index += 1;
                    } else {
                        unused.push(guard.swap_remove(index).1);
                    }
                }
                unused
            };

            if unused.is_empty() {
                return destroyed;
            }
            destroyed += unused.len();
            for resource in &unused {
                trace!("Destroying {}", resource.kind());
            }
            // Destroying a resource set or view can retire the wrappers it kept
            // alive, so this runs without the lock and repeats.
            drop(unused);
        }
    }

    pub(super) fn retired_count(&self) -> usize {
        self.retired.lock().len()
    }
}

impl<B: GPUBackend> Drop for DeferredDestroyer<B> {
    fn drop(&mut self) {
        self.destroy_unused();
        debug_assert!(
            self.retired.get_mut().is_empty(),
            "Device destroyed while resources were still referenced by submissions"
        );
    }
}
