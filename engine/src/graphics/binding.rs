use std::ops::Range;
use std::sync::Arc;

use smallvec::SmallVec;

use super::gpu::BindPoint;
use super::gpu::CommandBuffer as _;
use super::*;

/// Splits the dirty slots into the fewest contiguous ranges.
pub(super) fn batch_dirty_ranges(dirty: &[bool]) -> SmallVec<[Range<u32>; 4]> {
    let mut ranges = SmallVec::<[Range<u32>; 4]>::new();
    let mut run_start: Option<u32> = None;
    for (slot, is_dirty) in dirty.iter().enumerate() {
        let slot = slot as u32;
        match (*is_dirty, run_start) {
            (true, None) => run_start = Some(slot),
            (false, Some(start)) => {
                ranges.push(start..slot);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        ranges.push(start..dirty.len() as u32);
    }
    ranges
}

/// The resource sets bound to one bind point.
pub(super) struct BindingSlots<B: GPUBackend> {
    bind_point: BindPoint,
    sets: Vec<Option<Arc<ResourceSet<B>>>>,
    dirty: Vec<bool>,
}

impl<B: GPUBackend> BindingSlots<B> {
    pub(super) fn new(bind_point: BindPoint) -> Self {
        Self {
            bind_point,
            sets: Vec::new(),
            dirty: Vec::new(),
        }
    }

    /// Unbinds everything and resizes to the set count of a new pipeline.
    pub(super) fn reset(&mut self, count: u32) {
        self.sets.clear();
        self.sets.resize(count as usize, None);
        self.dirty.clear();
        self.dirty.resize(count as usize, false);
    }

    /// Returns whether the slot changed.
    pub(super) fn set(&mut self, slot: u32, set: &Arc<ResourceSet<B>>) -> Result<bool, CommandError> {
        let count = self.sets.len() as u32;
        let Some(current) = self.sets.get_mut(slot as usize) else {
            return Err(CommandError::ResourceSetSlotOutOfRange { slot, count });
        };
        if current.as_ref().is_some_and(|current| Arc::ptr_eq(current, set)) {
            return Ok(false);
        }
        *current = Some(set.clone());
        self.dirty[slot as usize] = true;
        Ok(true)
    }

    pub(super) fn is_dirty(&self) -> bool {
        self.dirty.iter().any(|dirty| *dirty)
    }

    /// Binds every dirty slot, one native call per contiguous run.
    pub(super) unsafe fn flush(&mut self, command_buffer: &mut B::CommandBuffer, pipeline: &B::Pipeline) {
        if !self.is_dirty() {
            return;
        }
        for range in batch_dirty_ranges(&self.dirty) {
            let sets: SmallVec<[&B::ResourceSet; 8]> = self.sets[range.start as usize..range.end as usize]
                .iter()
                .filter_map(|set| set.as_ref().map(|set| set.handle()))
                .collect();
            debug_assert_eq!(sets.len(), range.len());
            command_buffer.bind_resource_sets(self.bind_point, pipeline, range.start, &sets);
        }
        self.dirty.iter_mut().for_each(|dirty| *dirty = false);
    }
}

#[cfg(test)]
mod tests {
    use super::batch_dirty_ranges;

    #[test]
    fn all_dirty_is_one_range() {
        assert_eq!(batch_dirty_ranges(&[true; 6]).as_slice(), &[0..6]);
    }

    #[test]
    fn nothing_dirty_binds_nothing() {
        assert!(batch_dirty_ranges(&[false; 6]).is_empty());
        assert!(batch_dirty_ranges(&[]).is_empty());
    }

    #[test]
    fn alternating_slots_bind_one_by_one() {
        let dirty = [true, false, true, false, true, false];
        assert_eq!(batch_dirty_ranges(&dirty).as_slice(), &[0..1, 2..3, 4..5]);

        let dirty = [false, true, false, true];
        assert_eq!(batch_dirty_ranges(&dirty).as_slice(), &[1..2, 3..4]);
    }

    #[test]
    fn single_run_in_the_middle() {
        let dirty = [false, false, true, true, true, false, false];
        assert_eq!(batch_dirty_ranges(&dirty).as_slice(), &[2..5]);
    }

    #[test]
    fn trailing_run_is_flushed() {
        let dirty = [true, false, false, true, true];
        assert_eq!(batch_dirty_ranges(&dirty).as_slice(), &[0..1, 3..5]);
    }
}
