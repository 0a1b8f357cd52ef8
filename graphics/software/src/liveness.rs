use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::Arc;

use log::trace;

pub(crate) struct Liveness {
    id: u64,
    kind: &'static str,
    destroyed: AtomicBool,
}

impl Liveness {
    pub(crate) fn new(id: u64, kind: &'static str) -> Arc<Self> {
        Arc::new(Self {
            id,
            kind,
            destroyed: AtomicBool::new(false),
        })
    }

    pub(crate) fn mark_destroyed(&self) {
        trace!("Destroying software {} {}", self.kind, self.id);
        let was_destroyed = self.destroyed.swap(true, Ordering::AcqRel);
        debug_assert!(!was_destroyed);
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub(crate) fn describe(&self) -> String {
        format!("{} {}", self.kind, self.id)
    }
}

/// Observes whether the native object behind a handle was destroyed,
/// without keeping that object alive.
#[derive(Clone)]
pub struct ResourceProbe {
    liveness: Arc<Liveness>,
}

impl ResourceProbe {
    pub(crate) fn new(liveness: &Arc<Liveness>) -> Self {
        Self {
            liveness: liveness.clone(),
        }
    }

    pub fn id(&self) -> u64 {
        self.liveness.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.liveness.is_destroyed()
    }
}
