use log::debug;

use super::gpu::Buffer as _;
use super::gpu::Device as _;
use super::gpu::{
    BufferInfo,
    BufferUsage,
    GPUError,
    MemoryUsage,
};
use super::*;

/// A host visible transfer buffer and the event that tells when the copy
/// reading from it has finished.
pub(super) struct StagingBufferToken<B: GPUBackend> {
    buffer: B::Buffer,
    available: B::Event,
}

impl<B: GPUBackend> StagingBufferToken<B> {
    #[inline(always)]
    pub(super) fn buffer(&self) -> &B::Buffer {
        &self.buffer
    }

    #[inline(always)]
    pub(super) fn available_event(&self) -> &B::Event {
        &self.available
    }

    fn capacity(&self) -> u64 {
        self.buffer.info().size
    }
}

pub(super) struct StagingBufferPool<B: GPUBackend> {
    available: Vec<StagingBufferToken<B>>,
    in_use: Vec<StagingBufferToken<B>>,
    /// Tokens at the end of `in_use` acquired by the current recording.
    recording: usize,
}

impl<B: GPUBackend> StagingBufferPool<B> {
    pub(super) fn new() -> Self {
        Self {
            available: Vec::new(),
            in_use: Vec::new(),
            recording: 0,
        }
    }

    /// Hands out the first available buffer that is larger than `min_size`,
    /// allocates one of exactly `min_size` bytes if there is none.
    pub(super) fn acquire(&mut self, device: &B::Device, min_size: u64) -> Result<&StagingBufferToken<B>, GPUError> {
        let token = match self.available.iter().position(|token| token.capacity() > min_size) {
            Some(index) => self.available.remove(index),
            None => {
                debug!(
                    "Allocating staging buffer of {} bytes, {} already pooled",
                    min_size,
                    self.available.len() + self.in_use.len()
                );
                let buffer = unsafe {
                    device.create_buffer(
                        &BufferInfo {
                            size: min_size,
                            usage: BufferUsage::COPY_SRC,
                            memory_usage: MemoryUsage::CPUToGPU,
                        },
                        Some("StagingBuffer"),
                    )?
                };
                let available = unsafe { device.create_event()? };
                StagingBufferToken { buffer, available }
            }
        };
        self.in_use.push(token);
        self.recording += 1;
        Ok(&self.in_use[self.in_use.len() - 1])
    }

    /// The current recording was submitted, its tokens come back once their
    /// events are set.
    pub(super) fn on_submitted(&mut self) {
        self.recording = 0;
    }

    /// The current recording will never execute, so its events will never be
    /// set. Its tokens are available again right away.
    pub(super) fn discard_recording(&mut self) {
        let start = self.in_use.len() - self.recording;
        self.available.extend(self.in_use.drain(start..));
        self.recording = 0;
    }

    /// Returns every buffer whose copy has finished to the pool.
    pub(super) fn reclaim(&mut self, device: &B::Device) -> usize {
        debug_assert_eq!(self.recording, 0);
        let mut reclaimed = 0usize;
        let mut index = 0;
        while index < self.in_use.len() {
            if unsafe { device.is_event_set(self.in_use[index].available_event()) } {
                let token = self.in_use.remove(index);
                unsafe {
                    device.reset_event(token.available_event());
                }
                self.available.push(token);
                reclaimed += 1;
            } else {
                index += 1;
            }
        }
        reclaimed
    }

    pub(super) fn available_count(&self) -> usize {
        self.available.len()
    }

    pub(super) fn in_use_count(&self) -> usize {
        self.in_use.len()
    }

    pub(super) fn capacities(&self) -> Vec<u64> {
        self.available
            .iter()
            .chain(self.in_use.iter())
            .map(|token| token.capacity())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use emberline_software::{
        SoftwareBackend,
        SoftwareDevice,
    };

    use super::super::gpu::Device as _;
    use super::super::testing::signal;
    use super::StagingBufferPool;

    fn signal_in_use(device: &SoftwareDevice, pool: &StagingBufferPool<SoftwareBackend>) {
        let events: Vec<_> = pool.in_use.iter().map(|token| token.available_event()).collect();
        signal(device, &events);
    }

    #[test]
    fn acquire_takes_the_first_strictly_larger_buffer() {
        let device = SoftwareDevice::new();
        let mut pool = StagingBufferPool::<SoftwareBackend>::new();
        for size in [100, 300, 200] {
            assert_eq!(pool.acquire(&device, size).unwrap().capacity(), size);
        }
        pool.on_submitted();
        signal_in_use(&device, &pool);
        assert_eq!(pool.reclaim(&device), 3);

        // 100 is not larger than 100, 300 is the first one that is.
        assert_eq!(pool.acquire(&device, 100).unwrap().capacity(), 300);
        // Neither 100 nor 200 is larger than 200.
        assert_eq!(pool.acquire(&device, 200).unwrap().capacity(), 200);
        assert_eq!(pool.capacities().len(), 4);
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.in_use_count(), 2);
    }

    #[test]
    fn reclaim_waits_for_the_event_and_resets_it() {
        let device = SoftwareDevice::new();
        let mut pool = StagingBufferPool::<SoftwareBackend>::new();
        pool.acquire(&device, 64).unwrap();
        pool.on_submitted();
        assert_eq!(pool.reclaim(&device), 0);
        assert_eq!(pool.in_use_count(), 1);

        signal_in_use(&device, &pool);
        assert_eq!(pool.reclaim(&device), 1);
        assert_eq!(pool.available_count(), 1);
        assert!(!unsafe { device.is_event_set(pool.available[0].available_event()) });
    }

    #[test]
    fn discarded_recording_returns_only_its_own_buffers() {
        let device = SoftwareDevice::new();
        let mut pool = StagingBufferPool::<SoftwareBackend>::new();
        pool.acquire(&device, 64).unwrap();
        pool.on_submitted();

        pool.acquire(&device, 32).unwrap();
        pool.acquire(&device, 16).unwrap();
        pool.discard_recording();
        assert_eq!(pool.in_use_count(), 1);
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.in_use[0].capacity(), 64);

        // The submitted one still waits for its event.
        assert_eq!(pool.reclaim(&device), 0);
        assert_eq!(pool.in_use_count(), 1);
    }
}
