use std::sync::atomic::{
    AtomicU32,
    Ordering,
};
use std::sync::Arc;

use super::gpu::{
    GPUMaybeSend,
    GPUMaybeSync,
};

/// Counts the submitted recordings that still reference a resource.
///
/// A count of zero is necessary but not sufficient for destruction: the
/// application also has to drop its handle.
#[derive(Debug, Default)]
pub struct ReferenceTracker {
    count: AtomicU32,
}

impl ReferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    #[inline(always)]
    pub fn decrement(&self) {
        let result = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| count.checked_sub(1));
        debug_assert!(result.is_ok(), "Reference count would drop below zero");
    }

    #[inline(always)]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn is_referenced(&self) -> bool {
        self.count() != 0
    }
}

/// Anything a recording can capture.
pub trait TrackedResource: GPUMaybeSend + GPUMaybeSync {
    fn reference_tracker(&self) -> &Arc<ReferenceTracker>;
}
