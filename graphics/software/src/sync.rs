use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::Arc;

use crate::liveness::Liveness;

pub(crate) struct EventStorage {
    pub(crate) signaled: AtomicBool,
    pub(crate) liveness: Arc<Liveness>,
}

impl EventStorage {
    pub(crate) fn set(&self) {
        self.signaled.store(true, Ordering::Release);
    }
}

pub struct SoftwareEvent {
    storage: Arc<EventStorage>,
}

impl SoftwareEvent {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            storage: Arc::new(EventStorage {
                signaled: AtomicBool::new(false),
                liveness: Liveness::new(id, "event"),
            }),
        }
    }

    pub(crate) fn storage(&self) -> &Arc<EventStorage> {
        &self.storage
    }

    pub(crate) fn is_set(&self) -> bool {
        self.storage.signaled.load(Ordering::Acquire)
    }

    pub(crate) fn reset(&self) {
        self.storage.signaled.store(false, Ordering::Release);
    }
}

impl Drop for SoftwareEvent {
    fn drop(&mut self) {
        self.storage.liveness.mark_destroyed();
    }
}
