//! Window machines for the kernel (influence-function) buffer.
//!
//! The kernel buffer grows from the front: slab `t` occupies columns
//! `[t*S, (t+1)*S)`. The pusher advances its write position on every
//! commit; the extractor grows the live read range `[0, end)` until it
//! covers the whole allocated buffer (the external boundary), after which
//! successive extractions convolve over the same saturated window. The
//! MainStep extractor additionally drops the oldest main-step slab once
//! per `small_step_nmbr` extracts in the second history period.

use crate::descriptor::WindowDesc;

/// Write-side state of the kernel window machine.
#[derive(Clone, Debug)]
pub enum KernelPushState {
    /// Slabs append at a moving stride. Shared by ConstStep, MainStep and
    /// SmallStep.
    Stride {
        /// End of the pushed range; the next slab is written at this column.
        end: usize,
    },
    /// A single write slab at the buffer head, rewritten every step
    /// (MixStep).
    Fixed,
}

/// Kernel pusher: decides where the next coefficient slab is written and
/// carries the need-advance flag.
#[derive(Clone, Debug)]
pub struct KernelPusher {
    desc: WindowDesc,
    need_advance: bool,
    state: KernelPushState,
}

impl KernelPusher {
    /// Moving-stride pusher (ConstStep, MainStep, SmallStep).
    pub fn stride(desc: WindowDesc) -> Self {
        Self {
            desc,
            need_advance: false,
            state: KernelPushState::Stride { end: 0 },
        }
    }

    /// Fixed-slab pusher (MixStep).
    pub fn fixed(desc: WindowDesc) -> Self {
        Self {
            desc,
            need_advance: false,
            state: KernelPushState::Fixed,
        }
    }

    /// Commit one pushed slab: move the write position and clear the flag.
    ///
    /// The caller guarantees the pre-sized buffer is not overshot; the
    /// stride advances unconditionally.
    pub fn on_push(&mut self) {
        match &mut self.state {
            KernelPushState::Stride { end } => {
                self.desc.bump_window();
                *end += self.desc.spatial_size();
            }
            KernelPushState::Fixed => {}
        }
        self.need_advance = false;
    }

    /// Start of the write frame. Always 0 for kernels.
    pub fn idx_begin(&self) -> usize {
        0
    }

    /// Column where the next slab will be written.
    pub fn idx_end(&self) -> usize {
        match self.state {
            KernelPushState::Stride { end } => end,
            KernelPushState::Fixed => 0,
        }
    }

    /// Whether a push has occurred since the last commit. Reading the
    /// kernel buffer while this is set is a contract violation.
    pub fn need_advance(&self) -> bool {
        self.need_advance
    }

    /// Mark the buffer as holding uncommitted coefficients.
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

/// Read-side state of the kernel window machine.
#[derive(Clone, Debug)]
pub enum KernelExtractState {
    /// Live range `[0, end)` grows until it covers the allocated buffer.
    ConstStep {
        /// End of the live read range.
        end: usize,
    },
    /// ConstStep behaviour through the first history period, then
    /// once-per-main-step slab rotation.
    MainStep {
        /// Start of the live read range (moves in the second period).
        begin: usize,
        /// End of the live read range.
        end: usize,
        /// Small steps per main step.
        small_step_nmbr: usize,
        /// Position within the current main step.
        small_step_counter: usize,
        /// Extracts that make up the first history period.
        main_step_nmbr: usize,
        /// Extracts performed within the first period so far.
        main_step_counter: usize,
    },
    /// The whole allocated buffer is always live; extraction is a no-op.
    MixStep,
}

/// Kernel extractor: decides which column range is live for the next
/// convolution.
#[derive(Clone, Debug)]
pub struct KernelExtractor {
    desc: WindowDesc,
    state: KernelExtractState,
}

/// Grow the live range by one slab unless it already covers the buffer.
fn grow_until_boundary(desc: &mut WindowDesc, end: &mut usize) {
    if *end != desc.allocated() {
        desc.bump_window();
        *end += desc.spatial_size();
    }
}

impl KernelExtractor {
    /// ConstStep (and SmallStep) extractor.
    pub fn const_step(desc: WindowDesc) -> Self {
        Self {
            desc,
            state: KernelExtractState::ConstStep { end: 0 },
        }
    }

    /// MainStep extractor.
    pub fn main_step(desc: WindowDesc, small_step_nmbr: usize, main_step_nmbr: usize) -> Self {
        assert!(small_step_nmbr > 0, "small_step_nmbr must be positive");
        Self {
            desc,
            state: KernelExtractState::MainStep {
                begin: 0,
                end: 0,
                small_step_nmbr,
                small_step_counter: 0,
                main_step_nmbr,
                main_step_counter: 0,
            },
        }
    }

    /// MixStep extractor: the full buffer is permanently live.
    pub fn mix_step(desc: WindowDesc) -> Self {
        Self {
            desc,
            state: KernelExtractState::MixStep,
        }
    }

    /// Move the read cursor for the next convolution.
    pub fn on_extract(&mut self) {
        match &mut self.state {
            KernelExtractState::ConstStep { end } => {
                grow_until_boundary(&mut self.desc, end);
            }
            KernelExtractState::MainStep {
                begin,
                end,
                small_step_nmbr,
                small_step_counter,
                main_step_nmbr,
                main_step_counter,
            } => {
                if *main_step_counter < *main_step_nmbr {
                    // First history period: same as ConstStep.
                    grow_until_boundary(&mut self.desc, end);
                    *main_step_counter += 1;
                } else {
                    // Second period: at the first small step of each new
                    // main step, drop the oldest slab and (until the
                    // external boundary) admit a new one. The window
                    // counter stays put.
                    if *small_step_counter == 0 {
                        if *begin < *end {
                            *begin += self.desc.spatial_size();
                        }
                        if *end != self.desc.allocated() {
                            *end += self.desc.spatial_size();
                        }
                    }
                    *small_step_counter = (*small_step_counter + 1) % *small_step_nmbr;
                }
            }
            KernelExtractState::MixStep => {}
        }
    }

    /// Start of the live read range.
    pub fn idx_begin(&self) -> usize {
        match self.state {
            KernelExtractState::ConstStep { .. } | KernelExtractState::MixStep => 0,
            KernelExtractState::MainStep { begin, .. } => begin,
        }
    }

    /// End of the live read range.
    pub fn idx_end(&self) -> usize {
        match self.state {
            KernelExtractState::ConstStep { end }
            | KernelExtractState::MainStep { end, .. } => end,
            KernelExtractState::MixStep => self.desc.allocated(),
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

    /// Columns per time slab.
    pub fn spatial_size(&self) -> usize {
        self.desc.spatial_size()
    }

    /// Total buffer length.
    pub fn allocated(&self) -> usize {
        self.desc.allocated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_desc() -> WindowDesc {
        WindowDesc::new(2, 3)
    }

    // ── pusher ──────────────────────────────────────────────────

    #[test]
    fn stride_pusher_starts_empty() {
        let pusher = KernelPusher::stride(make_desc());
        assert_eq!(pusher.idx_begin(), 0);
        assert_eq!(pusher.idx_end(), 0);
        assert!(!pusher.need_advance());
    }

    #[test]
    fn stride_pusher_appends_slabs() {
        let mut pusher = KernelPusher::stride(make_desc());
        pusher.set_need_advance();
        pusher.on_push();
        assert_eq!(pusher.idx_end(), 2);
        assert_eq!(pusher.pushed_data_counter(), 1);
        assert!(!pusher.need_advance());

        pusher.on_push();
        assert_eq!(pusher.idx_end(), 4);
        assert_eq!(pusher.pushed_data_counter(), 2);
    }

    #[test]
    fn fixed_pusher_never_moves() {
        let mut pusher = KernelPusher::fixed(make_desc());
        pusher.set_need_advance();
        pusher.on_push();
        pusher.on_push();
        assert_eq!(pusher.idx_end(), 0);
        assert_eq!(pusher.pushed_data_counter(), 0);
        assert!(!pusher.need_advance());
    }

    // ── ConstStep extractor ─────────────────────────────────────

    #[test]
    fn const_extractor_grows_to_boundary_then_freezes() {
        let mut ext = KernelExtractor::const_step(make_desc());
        assert_eq!(ext.idx_end(), 0);

        for expected in [2, 4, 6] {
            ext.on_extract();
            assert_eq!(ext.idx_begin(), 0);
            assert_eq!(ext.idx_end(), expected);
        }

        // Saturated: further extracts convolve over the same window.
        ext.on_extract();
        ext.on_extract();
        assert_eq!(ext.idx_end(), 6);
        assert_eq!(ext.window(), 3);
    }

    // ── MainStep extractor ──────────────────────────────────────

    #[test]
    fn main_extractor_follows_const_step_through_first_period() {
        let desc = WindowDesc::new(2, 5);
        let mut ext = KernelExtractor::main_step(desc, 2, 3);

        for expected in [2, 4, 6] {
            ext.on_extract();
            assert_eq!(ext.idx_begin(), 0);
            assert_eq!(ext.idx_end(), expected);
        }
    }

    #[test]
    fn main_extractor_rotates_once_per_main_step_in_second_period() {
        let desc = WindowDesc::new(2, 5);
        let mut ext = KernelExtractor::main_step(desc, 2, 3);
        for _ in 0..3 {
            ext.on_extract(); // first period
        }
        let window_before = ext.window();

        // First small step of a new main step: oldest slab dropped, new
        // slab admitted.
        ext.on_extract();
        assert_eq!(ext.idx_begin(), 2);
        assert_eq!(ext.idx_end(), 8);

        // Second small step of the same main step: cursors hold still.
        ext.on_extract();
        assert_eq!(ext.idx_begin(), 2);
        assert_eq!(ext.idx_end(), 8);

        // Next main step.
        ext.on_extract();
        assert_eq!(ext.idx_begin(), 4);
        assert_eq!(ext.idx_end(), 10);

        // The window counter never moves in the second period.
        assert_eq!(ext.window(), window_before);
    }

    #[test]
    fn main_extractor_end_freezes_at_boundary_while_begin_advances() {
        let desc = WindowDesc::new(2, 4);
        let mut ext = KernelExtractor::main_step(desc, 1, 2);
        ext.on_extract();
        ext.on_extract(); // first period done, end == 4

        ext.on_extract(); // begin 2, end 6
        ext.on_extract(); // begin 4, end 8 == boundary
        ext.on_extract(); // begin 6, end frozen
        assert_eq!(ext.idx_begin(), 6);
        assert_eq!(ext.idx_end(), 8);

        // begin never crosses end.
        ext.on_extract();
        ext.on_extract();
        assert_eq!(ext.idx_begin(), 8);
        assert_eq!(ext.idx_end(), 8);
        assert_eq!(ext.current_window_size(), 0);
    }

    // ── MixStep extractor ───────────────────────────────────────

    #[test]
    fn mix_extractor_is_a_frozen_full_window() {
        let desc = WindowDesc::new(2, 4);
        let mut ext = KernelExtractor::mix_step(desc);
        for _ in 0..10 {
            ext.on_extract();
            assert_eq!(ext.idx_begin(), 0);
            assert_eq!(ext.idx_end(), 8);
        }
    }

    // ── invariants ──────────────────────────────────────────────

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use proptest::test_runner::TestCaseError;

        fn check_invariants(
            ext: &KernelExtractor,
            spatial: usize,
        ) -> Result<(), TestCaseError> {
            let (begin, end) = (ext.idx_begin(), ext.idx_end());
            prop_assert!(begin <= end);
            prop_assert!(end <= ext.allocated());
            prop_assert_eq!(begin % spatial, 0);
            prop_assert_eq!(end % spatial, 0);
            Ok(())
        }

        proptest! {
            #[test]
            fn const_extractor_invariants_hold(
                spatial in 1usize..8,
                temporal in 1usize..12,
                extracts in 0usize..40,
            ) {
                let mut ext =
                    KernelExtractor::const_step(WindowDesc::new(spatial, temporal));
                let mut prev_end = 0;
                for _ in 0..extracts {
                    ext.on_extract();
                    check_invariants(&ext, spatial)?;
                    prop_assert!(ext.idx_end() >= prev_end);
                    prev_end = ext.idx_end();
                }
                prop_assert!(ext.idx_end() <= spatial * temporal);
            }

            #[test]
            fn main_extractor_invariants_hold(
                spatial in 1usize..6,
                temporal in 1usize..10,
                small in 1usize..5,
                main in 0usize..8,
                extracts in 0usize..60,
            ) {
                let mut ext = KernelExtractor::main_step(
                    WindowDesc::new(spatial, temporal),
                    small,
                    main,
                );
                for _ in 0..extracts {
                    ext.on_extract();
                    check_invariants(&ext, spatial)?;
                }
            }

            #[test]
            fn pusher_counts_every_push(pushes in 0usize..50) {
                let mut pusher =
                    KernelPusher::stride(WindowDesc::new(3, 100));
                for _ in 0..pushes {
                    pusher.set_need_advance();
                    pusher.on_push();
                }
                prop_assert_eq!(pusher.pushed_data_counter(), pushes);
                prop_assert_eq!(pusher.idx_end(), pushes * 3);
                prop_assert!(!pusher.need_advance());
            }
        }
    }
}
