//! MixStep well kernel: a [`SourceKernel`] fed from a coefficient cache.
//!
//! In the MixStep regime the E/P coefficients are computed ahead of time at
//! main-step resolution and cached; only the F weights arrive per small
//! step. `advance()` consumes the next cached matrix into the staging
//! buffer when a new main step begins. The last small step within each
//! main step is excluded (nothing is computed on that interval), so the
//! consumption cadence runs modulo `small_step_nmbr_per_main_step - 1`.

use nalgebra::{DMatrix, DMatrixView};
use seep_core::ConvolveError;
use seep_window::{KernelAllocator, KernelRegime};
use std::collections::VecDeque;
use tracing::trace;

use crate::kernel::SourceKernel;
use crate::traits::KernelAccess;

/// Well kernel for the MixStep regime, caching pre-computed `P_cur`
/// matrices in a bounded FIFO.
#[derive(Clone, Debug)]
pub struct MixStepWellKernel {
    inner: SourceKernel,
    p_cur_cache: VecDeque<DMatrix<f64>>,
    capacity: usize,
    /// `small_step_nmbr_per_main_step - 1`.
    effective_small_steps: usize,
    small_step_counter: usize,
}

impl MixStepWellKernel {
    /// Create a MixStep well kernel over a MixStep allocator.
    ///
    /// # Panics
    ///
    /// Panics if the allocator is not a MixStep allocator, or if
    /// `small_step_nmbr_per_main_step < 2` (at least one computed small
    /// step per main step is required).
    pub fn new(grid_nodes_count: usize, allocator: KernelAllocator) -> Self {
        let (m, small_step_nmbr_per_main_step) = match allocator.regime() {
            KernelRegime::MixStep {
                m,
                small_step_nmbr_per_main_step,
            } => (m, small_step_nmbr_per_main_step),
            other => panic!("MixStepWellKernel requires a MixStep allocator, got {other:?}"),
        };
        assert!(
            small_step_nmbr_per_main_step >= 2,
            "MixStep requires at least 2 small steps per main step"
        );
        Self {
            inner: SourceKernel::new(grid_nodes_count, allocator),
            p_cur_cache: VecDeque::with_capacity(m),
            capacity: m,
            effective_small_steps: small_step_nmbr_per_main_step - 1,
            small_step_counter: 0,
        }
    }

    /// Number of cached matrices waiting to be consumed.
    pub fn cached(&self) -> usize {
        self.p_cur_cache.len()
    }

    /// Cache one main-step `P_cur` matrix.
    pub fn push_p_cur(&mut self, matrix: DMatrix<f64>) -> Result<(), ConvolveError> {
        if self.p_cur_cache.len() == self.capacity {
            return Err(ConvolveError::CacheOverflow {
                capacity: self.capacity,
            });
        }
        self.p_cur_cache.push_back(matrix);
        Ok(())
    }

    /// Commit the staged step, consuming the next cached matrix when a
    /// new main step begins.
    pub fn advance(&mut self) -> Result<(), ConvolveError> {
        if self.small_step_counter % self.effective_small_steps == 0 {
            let next = self
                .p_cur_cache
                .pop_front()
                .ok_or(ConvolveError::CacheUnderflow)?;
            trace!(remaining = self.p_cur_cache.len(), "consumed cached P_cur matrix");
            self.inner.set_p_cur(next);
        }
        self.small_step_counter += 1;
        self.small_step_counter %= self.effective_small_steps;

        self.inner.advance();
        Ok(())
    }

    /// Stage a full column of F weights for one source segment.
    pub fn push_f_source(&mut self, col: usize, f: &[f64]) {
        self.inner.push_f_source(col, f);
    }

    /// Stage a full column of E and F coefficients.
    pub fn push_source(&mut self, col: usize, f: &[f64], e: &[f64]) {
        self.inner.push_source(col, f, e);
    }

    /// Write a full column directly into the previous-step baseline.
    pub fn push_source_prev(&mut self, col: usize, e: &[f64]) {
        self.inner.push_source_prev(col, e);
    }

    /// Guarded single-coefficient read.
    pub fn at(&self, row: usize, col: usize) -> Result<f64, ConvolveError> {
        self.inner.at(row, col)
    }

    /// Guarded read by mesh node, source segment, and time slab.
    pub fn at_source(
        &self,
        mesh_node_id: usize,
        source_node_id: usize,
        time_node: usize,
    ) -> Result<f64, ConvolveError> {
        self.inner.at_source(mesh_node_id, source_node_id, time_node)
    }

    /// The wrapped base kernel.
    pub fn inner(&self) -> &SourceKernel {
        &self.inner
    }
}

impl KernelAccess for MixStepWellKernel {
    fn advance_read_cursor(&mut self) {
        self.inner.advance_read_cursor();
    }

    fn live_view(&self) -> Result<DMatrixView<'_, f64>, ConvolveError> {
        self.inner.live_view()
    }

    fn current_window_size(&self) -> usize {
        self.inner.current_window_size()
    }
}
