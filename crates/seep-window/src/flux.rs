//! Window machines for the flux (source-strength) buffer.
//!
//! The flux buffer fills from the back: the newest slab always sits at a
//! stable offset from the buffer tail, which keeps the time-indexed access
//! `flux[segm + total - nt*S]` a simple affine map. The pusher slides
//! `idx_begin` down by one slab per push; the extractor mirrors it and, once
//! the external boundary is reached, forgets the oldest slab by pulling
//! `idx_end` down instead of growing the window.

use crate::descriptor::WindowDesc;

/// Flux pusher: slides the write position down from the buffer tail.
///
/// All regimes share this machine; MixStep runs it over a single-slab
/// descriptor.
#[derive(Clone, Debug)]
pub struct FluxPusher {
    desc: WindowDesc,
    begin: usize,
    need_advance: bool,
}

impl FluxPusher {
    /// Create a pusher over the given geometry. Initially `begin` points
    /// one past the allocated memory: there is no data yet.
    pub fn new(desc: WindowDesc) -> Self {
        let begin = desc.allocated();
        Self {
            desc,
            begin,
            need_advance: false,
        }
    }

    /// Commit one pushed slab: slide the write position down and clear the
    /// flag. Saturates at the buffer head.
    pub fn on_push(&mut self) {
        self.desc.bump_window();
        self.begin = self.begin.saturating_sub(self.desc.spatial_size());
        self.need_advance = false;
    }

    /// Position the next slab is written at.
    pub fn idx_begin(&self) -> usize {
        self.begin
    }

    /// End of the write frame; always the buffer tail.
    pub fn idx_end(&self) -> usize {
        self.desc.allocated()
    }

    /// Whether a push is in flight (set inside `push`, cleared by
    /// [`FluxPusher::on_push`]).
    pub fn need_advance(&self) -> bool {
        self.need_advance
    }

    /// Mark a push as in flight.
    pub fn set_need_advance(&mut self) {
        self.need_advance = true;
    }

    /// Number of committed pushes.
    pub fn pushed_data_counter(&self) -> usize {
        self.desc.window()
    }

    /// Total number of slabs the buffer was sized for.
    pub fn push_data_nmbr(&self) -> usize {
        self.desc.temporal_size()
    }

    /// Columns per time slab.
    pub fn spatial_size(&self) -> usize {
        self.desc.spatial_size()
    }

    /// Total buffer length.
    pub fn allocated(&self) -> usize {
        self.desc.allocated()
    }
}

/// Read-side state of the flux window machine.
#[derive(Clone, Debug)]
pub enum FluxExtractState {
    /// Window slides down from the tail; once the boundary is reached the
    /// oldest slab is forgotten on every extract. Shared by ConstStep and
    /// SmallStep.
    ConstStep {
        /// Start of the live read range.
        begin: usize,
        /// End of the live read range.
        end: usize,
    },
    /// ConstStep behaviour while pushes are still arriving; once the buffer
    /// has filled, no new slab appears and the window only drains.
    MainStep {
        /// Start of the live read range.
        begin: usize,
        /// End of the live read range.
        end: usize,
    },
    /// A single slab `[0, S)` is live; only the window counter advances.
    MixStep,
}

/// Flux extractor: decides which sub-vector is live for the next
/// convolution.
#[derive(Clone, Debug)]
pub struct FluxExtractor {
    desc: WindowDesc,
    frame_temporal_size: usize,
    state: FluxExtractState,
}

impl FluxExtractor {
    /// ConstStep (and SmallStep) extractor.
    ///
    /// `frame_temporal_size` is the number of time slabs that reach the
    /// external boundary; must not exceed the temporal size.
    pub fn const_step(desc: WindowDesc, frame_temporal_size: usize) -> Self {
        let edge = desc.allocated();
        Self {
            desc,
            frame_temporal_size,
            state: FluxExtractState::ConstStep {
                begin: edge,
                end: edge,
            },
        }
    }

    /// MainStep extractor.
    pub fn main_step(desc: WindowDesc, frame_temporal_size: usize) -> Self {
        let edge = desc.allocated();
        Self {
            desc,
            frame_temporal_size,
            state: FluxExtractState::MainStep {
                begin: edge,
                end: edge,
            },
        }
    }

    /// MixStep extractor over a single live slab.
    pub fn mix_step(desc: WindowDesc, frame_temporal_size: usize) -> Self {
        Self {
            desc,
            frame_temporal_size,
            state: FluxExtractState::MixStep,
        }
    }

    fn at_boundary(&self) -> bool {
        self.desc.window() == self.frame_temporal_size
    }

    /// Move the read cursor for the next convolution.
    pub fn on_extract(&mut self) {
        let spatial = self.desc.spatial_size();
        let at_boundary = self.at_boundary();
        match &mut self.state {
            FluxExtractState::ConstStep { begin, end } => {
                if at_boundary {
                    // The external boundary is reached: forget the oldest
                    // source terms.
                    if *end > *begin {
                        *end -= spatial;
                    }
                } else {
                    self.desc.bump_window();
                }
                // A new slab becomes visible at the front regardless.
                *begin = begin.saturating_sub(spatial);
            }
            FluxExtractState::MainStep { begin, end } => {
                if *begin > 0 {
                    // First history period: pushes are still outstanding,
                    // behave exactly like ConstStep.
                    if at_boundary {
                        if *end > *begin {
                            *end -= spatial;
                        }
                    } else {
                        self.desc.bump_window();
                    }
                    *begin = begin.saturating_sub(spatial);
                } else if at_boundary {
                    // Second period: no new slab arrives; drain whatever
                    // history remains.
                    if *end > *begin {
                        *end -= spatial;
                    }
                } else {
                    self.desc.bump_window();
                }
            }
            FluxExtractState::MixStep => {
                if !at_boundary {
                    self.desc.bump_window();
                }
            }
        }
    }

    /// Start of the live read range.
    pub fn idx_begin(&self) -> usize {
        match self.state {
            FluxExtractState::ConstStep { begin, .. }
            | FluxExtractState::MainStep { begin, .. } => begin,
            FluxExtractState::MixStep => 0,
        }
    }

    /// End of the live read range.
    pub fn idx_end(&self) -> usize {
        match self.state {
            FluxExtractState::ConstStep { end, .. }
            | FluxExtractState::MainStep { end, .. } => end,
            FluxExtractState::MixStep => self.desc.spatial_size(),
        }
    }

    /// Length of the live read range.
    pub fn current_window_size(&self) -> usize {
        self.idx_end() - self.idx_begin()
    }

    /// Number of slabs admitted into the live range.
    pub fn window(&self) -> usize {
        self.desc.window()
    }

    /// Number of time slabs that reach the external boundary.
    pub fn frame_temporal_size(&self) -> usize {
        self.frame_temporal_size
    }

    /// Columns per time slab.
    pub fn spatial_size(&self) -> usize {
        self.desc.spatial_size()
    }

    /// Total buffer length.
    pub fn allocated(&self) -> usize {
        self.desc.allocated()
    }
}
