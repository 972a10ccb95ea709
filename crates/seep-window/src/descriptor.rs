//! Memory descriptor shared by all window machines.
//!
//! [`WindowDesc`] fixes the buffer geometry at construction (`spatial_size`
//! columns per time slab, `temporal_size` slabs, `allocated` total elements)
//! and carries the one mutable piece of state every machine owns
//! independently: the `window` counter of time slabs considered filled.

/// Immutable buffer geometry plus the filled-window counter.
///
/// The pusher and the extractor of an allocator each hold their own copy;
/// their `window` counters advance independently (the pusher counts pushes,
/// the extractor counts slabs admitted into the live read range).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowDesc {
    spatial_size: usize,
    temporal_size: usize,
    allocated: usize,
    window: usize,
}

impl WindowDesc {
    /// Build a descriptor for `temporal_size` slabs of `spatial_size`
    /// columns each.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn new(spatial_size: usize, temporal_size: usize) -> Self {
        assert!(spatial_size > 0, "spatial_size must be positive");
        assert!(temporal_size > 0, "temporal_size must be positive");
        Self {
            spatial_size,
            temporal_size,
            allocated: spatial_size * temporal_size,
            window: 0,
        }
    }

    /// Columns per time slab (number of source segments).
    pub fn spatial_size(&self) -> usize {
        self.spatial_size
    }

    /// Total number of pre-allocated time slabs.
    pub fn temporal_size(&self) -> usize {
        self.temporal_size
    }

    /// Total buffer length, `spatial_size * temporal_size`. Never changes.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Number of time slabs considered filled by this machine.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Admit one more slab into the filled window.
    pub(crate) fn bump_window(&mut self) {
        self.window += 1;
    }
}
