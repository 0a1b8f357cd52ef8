use std::collections::HashSet;
use std::sync::Arc;

use log::trace;

use super::gpu::CommandBuffer as _;
use super::gpu::Device as _;
use super::gpu::GPUError;
use super::*;

/// The resources one recording touched, plus the event that tells when the
/// device is done with them.
///
/// While recording, captured resources are kept alive by strong handles.
/// Once submitted, the record only holds their reference trackers and the
/// native command buffer until the event fires.
pub(super) struct SubmissionRecord<B: GPUBackend> {
    event: B::Event,
    pinned: Vec<Arc<dyn TrackedResource>>,
    pinned_trackers: HashSet<usize>,
    referenced: Vec<Arc<ReferenceTracker>>,
    command_buffer: Option<B::CommandBuffer>,
}

impl<B: GPUBackend> SubmissionRecord<B> {
    fn new(device: &B::Device) -> Result<Self, GPUError> {
        Ok(Self {
            event: unsafe { device.create_event()? },
            pinned: Vec::new(),
            pinned_trackers: HashSet::new(),
            referenced: Vec::new(),
            command_buffer: None,
        })
    }

    #[inline(always)]
    pub(super) fn event(&self) -> &B::Event {
        &self.event
    }

    /// Captures a resource once, no matter how often it is used.
    pub(super) fn capture<T: TrackedResource + 'static>(&mut self, resource: &Arc<T>) {
        let key = Arc::as_ptr(resource.reference_tracker()) as usize;
        if self.pinned_trackers.insert(key) {
            self.pinned.push(resource.clone());
        }
    }

    pub(super) fn captured_count(&self) -> usize {
        self.pinned.len()
    }

    fn on_submitted(&mut self, command_buffer: B::CommandBuffer) {
        debug_assert!(self.referenced.is_empty());
        for resource in self.pinned.drain(..) {
            let tracker = resource.reference_tracker();
            tracker.increment();
            self.referenced.push(tracker.clone());
        }
        self.pinned_trackers.clear();
        self.command_buffer = Some(command_buffer);
    }

    /// Drops everything captured during a recording that never got submitted.
    fn discard(&mut self) {
        self.pinned.clear();
        self.pinned_trackers.clear();
    }

    fn release(&mut self) -> Option<B::CommandBuffer> {
        for tracker in self.referenced.drain(..) {
            tracker.decrement();
        }
        self.command_buffer.take()
    }
}

/// The records and native command buffers of one command recorder.
pub(super) struct SubmissionRecords<B: GPUBackend> {
    submitted: Vec<SubmissionRecord<B>>,
    available: Vec<SubmissionRecord<B>>,
    free_command_buffers: Vec<B::CommandBuffer>,
    event_count: usize,
}

impl<B: GPUBackend> SubmissionRecords<B> {
    pub(super) fn new() -> Self {
        Self {
            submitted: Vec::new(),
            available: Vec::new(),
            free_command_buffers: Vec::new(),
            event_count: 0,
        }
    }

    /// Moves every record whose event fired back to the available list.
    /// Returns the number of reclaimed records.
    pub(super) fn sweep(&mut self, device: &B::Device) -> usize {
        let mut reclaimed = 0usize;
        let mut index = 0;
        while index < self.submitted.len() {
            if !unsafe { device.is_event_set(self.submitted[index].event()) } {
                index += 1;
                continue;
            }

            let mut record = self.submitted.remove(index);
            if let Some(command_buffer) = record.release() {
                self.recycle_command_buffer(command_buffer);
            }
            unsafe {
                device.reset_event(record.event());
            }
            self.available.push(record);
            reclaimed += 1;
        }
        if reclaimed != 0 {
            trace!("Reclaimed {} submission records", reclaimed);
        }
        reclaimed
    }

    pub(super) fn acquire(&mut self, device: &B::Device) -> Result<SubmissionRecord<B>, GPUError> {
        if let Some(record) = self.available.pop() {
            return Ok(record);
        }
        self.sweep(device);
        if let Some(record) = self.available.pop() {
            return Ok(record);
        }
        let record = SubmissionRecord::new(device)?;
        self.event_count += 1;
        trace!("Created submission record, {} in total", self.event_count);
        Ok(record)
    }

    pub(super) fn archive(&mut self, mut record: SubmissionRecord<B>, command_buffer: B::CommandBuffer) {
        record.on_submitted(command_buffer);
        self.submitted.push(record);
    }

    pub(super) fn discard(&mut self, mut record: SubmissionRecord<B>) {
        record.discard();
        self.available.push(record);
    }

    pub(super) fn command_buffer(&mut self, device: &B::Device) -> Result<B::CommandBuffer, GPUError> {
        if let Some(command_buffer) = self.free_command_buffers.pop() {
            return Ok(command_buffer);
        }
        unsafe { device.create_command_buffer() }
    }

    pub(super) fn recycle_command_buffer(&mut self, mut command_buffer: B::CommandBuffer) {
        unsafe {
            command_buffer.reset();
        }
        self.free_command_buffers.push(command_buffer);
    }

    pub(super) fn in_flight(&self) -> usize {
        self.submitted.len()
    }

    pub(super) fn available(&self) -> usize {
        self.available.len()
    }

    /// Number of events ever created, the high-water mark of records in use.
    pub(super) fn event_count(&self) -> usize {
        self.event_count
    }
}
