//! Allocator pairs bundling one pusher and one extractor.
//!
//! An allocator owns both machines over the same buffer geometry and is the
//! unit the kernel and flux containers are built around. Per-regime
//! constructors take the parameter lists of their regime; SmallStep is an
//! alias for the ConstStep construction.

use crate::descriptor::WindowDesc;
use crate::flux::{FluxExtractor, FluxPusher};
use crate::kernel::{KernelExtractor, KernelPusher};

/// Regime parameters carried by a kernel allocator for downstream
/// consumers (the MixStep coefficient cache in particular).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelRegime {
    /// Dense first-period history, fixed step.
    ConstStep,
    /// Two-period history with pre-averaged second period.
    MainStep {
        /// Number of split main steps in the second history period.
        m: usize,
        /// Small steps per main step.
        small_step_nmbr: usize,
        /// Extracts that make up the first history period.
        main_step_nmbr: usize,
    },
    /// Single-window regime driven by a cached coefficient pipeline.
    MixStep {
        /// Capacity of the coefficient cache.
        m: usize,
        /// Small steps per main step.
        small_step_nmbr_per_main_step: usize,
    },
}

/// One pusher plus one extractor over the same kernel buffer.
#[derive(Clone, Debug)]
pub struct KernelAllocator {
    /// Write-side machine.
    pub pusher: KernelPusher,
    /// Read-side machine.
    pub extractor: KernelExtractor,
    regime: KernelRegime,
}

impl KernelAllocator {
    /// ConstStep kernel allocator: `frame_temporal_size` slabs of
    /// `spatial_size` columns.
    pub fn const_step(spatial_size: usize, frame_temporal_size: usize) -> Self {
        let desc = WindowDesc::new(spatial_size, frame_temporal_size);
        Self {
            pusher: KernelPusher::stride(desc),
            extractor: KernelExtractor::const_step(desc),
            regime: KernelRegime::ConstStep,
        }
    }

    /// SmallStep reuses the ConstStep machines.
    pub fn small_step(spatial_size: usize, frame_temporal_size: usize) -> Self {
        Self::const_step(spatial_size, frame_temporal_size)
    }

    /// MainStep kernel allocator.
    pub fn main_step(
        spatial_size: usize,
        frame_temporal_size: usize,
        m: usize,
        small_step_nmbr: usize,
        main_step_nmbr: usize,
    ) -> Self {
        let desc = WindowDesc::new(spatial_size, frame_temporal_size);
        Self {
            pusher: KernelPusher::stride(desc),
            extractor: KernelExtractor::main_step(desc, small_step_nmbr, main_step_nmbr),
            regime: KernelRegime::MainStep {
                m,
                small_step_nmbr,
                main_step_nmbr,
            },
        }
    }

    /// MixStep kernel allocator: the full buffer is permanently live and
    /// the write slab is pinned at the head.
    pub fn mix_step(
        spatial_size: usize,
        frame_temporal_size: usize,
        small_step_nmbr_per_main_step: usize,
        m: usize,
    ) -> Self {
        let desc = WindowDesc::new(spatial_size, frame_temporal_size);
        Self {
            pusher: KernelPusher::fixed(desc),
            extractor: KernelExtractor::mix_step(desc),
            regime: KernelRegime::MixStep {
                m,
                small_step_nmbr_per_main_step,
            },
        }
    }

    /// The regime parameters this allocator was built with.
    pub fn regime(&self) -> KernelRegime {
        self.regime
    }

    /// Number of committed pushes.
    pub fn pushed_data_counter(&self) -> usize {
        self.pusher.pushed_data_counter()
    }

    /// Total number of slabs the buffer was sized for.
    pub fn push_data_nmbr(&self) -> usize {
        self.pusher.push_data_nmbr()
    }

    /// Columns per time slab.
    pub fn spatial_size(&self) -> usize {
        self.pusher.spatial_size()
    }

    /// Total buffer length.
    pub fn allocated(&self) -> usize {
        self.pusher.allocated()
    }
}

/// Regime parameters carried by a flux allocator (the MainStep averaging
/// ring reads its sub-step geometry from here).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FluxRegime {
    /// Dense first-period history, fixed step.
    ConstStep,
    /// Two-period history with running sub-step averages.
    MainStep {
        /// Small steps per main step (size of the averaging ring).
        small_step_nmbr: usize,
        /// Extracts that make up the first history period.
        main_step_nmbr: usize,
    },
    /// Single live slab.
    MixStep,
}

/// One pusher plus one extractor over the same flux buffer.
#[derive(Clone, Debug)]
pub struct FluxAllocator {
    /// Write-side machine.
    pub pusher: FluxPusher,
    /// Read-side machine.
    pub extractor: FluxExtractor,
    regime: FluxRegime,
}

impl FluxAllocator {
    /// ConstStep flux allocator.
    ///
    /// # Panics
    ///
    /// Panics if `frame_temporal_size > temporal_size`.
    pub fn const_step(
        spatial_size: usize,
        temporal_size: usize,
        frame_temporal_size: usize,
    ) -> Self {
        assert!(
            frame_temporal_size <= temporal_size,
            "frame_temporal_size ({frame_temporal_size}) must not exceed \
             temporal_size ({temporal_size})"
        );
        let desc = WindowDesc::new(spatial_size, temporal_size);
        Self {
            pusher: FluxPusher::new(desc),
            extractor: FluxExtractor::const_step(desc, frame_temporal_size),
            regime: FluxRegime::ConstStep,
        }
    }

    /// SmallStep reuses the ConstStep machines.
    pub fn small_step(
        spatial_size: usize,
        temporal_size: usize,
        frame_temporal_size: usize,
    ) -> Self {
        Self::const_step(spatial_size, temporal_size, frame_temporal_size)
    }

    /// MainStep flux allocator: the buffer holds `main_step_nmbr` slabs.
    pub fn main_step(
        spatial_size: usize,
        main_step_nmbr: usize,
        frame_temporal_size: usize,
        small_step_nmbr: usize,
    ) -> Self {
        let desc = WindowDesc::new(spatial_size, main_step_nmbr);
        Self {
            pusher: FluxPusher::new(desc),
            extractor: FluxExtractor::main_step(desc, frame_temporal_size),
            regime: FluxRegime::MainStep {
                small_step_nmbr,
                main_step_nmbr,
            },
        }
    }

    /// MixStep flux allocator: a single time slab.
    pub fn mix_step(spatial_size: usize, frame_temporal_size: usize) -> Self {
        let desc = WindowDesc::new(spatial_size, 1);
        Self {
            pusher: FluxPusher::new(desc),
            extractor: FluxExtractor::mix_step(desc, frame_temporal_size),
            regime: FluxRegime::MixStep,
        }
    }

    /// The regime parameters this allocator was built with.
    pub fn regime(&self) -> FluxRegime {
        self.regime
    }

    /// Number of committed pushes.
    pub fn pushed_data_counter(&self) -> usize {
        self.pusher.pushed_data_counter()
    }

    /// Total number of slabs the buffer was sized for.
    pub fn push_data_nmbr(&self) -> usize {
        self.pusher.push_data_nmbr()
    }

    /// Columns per time slab.
    pub fn spatial_size(&self) -> usize {
        self.pusher.spatial_size()
    }

    /// Total buffer length.
    pub fn allocated(&self) -> usize {
        self.pusher.allocated()
    }

    /// Length of the live read range.
    pub fn current_window_size(&self) -> usize {
        self.extractor.current_window_size()
    }
}
