//! The base kernel container and its advance pipeline.
//!
//! [`SourceKernel`] owns the column-major kernel matrix `K` (grid nodes ×
//! allocated columns) together with the staging arrays `P_cur`, `P_prev`
//! and the weights `F` (grid nodes × spatial size). Coefficients for the
//! current step accumulate in `P_cur`; `advance()` commits
//! `F .* (P_cur - P_prev)` into the next write slab of `K` and rolls the
//! staging arrays. The well-side bulk pushes write whole columns at once.

use nalgebra::{DMatrix, DMatrixView};
use seep_core::ConvolveError;
use seep_window::KernelAllocator;

use crate::traits::KernelAccess;

/// Kernel matrix container for a single linear source.
///
/// The lifecycle per simulation step is: push coefficients (any of the
/// `push_*` methods), `advance()`, then exactly one
/// [`advance_read_cursor()`](KernelAccess::advance_read_cursor) from the
/// convolve call site, followed by any number of pure reads.
#[derive(Clone, Debug)]
pub struct SourceKernel {
    /// Column-major matrix convolved with fluxes. Its columns are filled
    /// with the products `F .* (P_cur - P_prev)`.
    kernel: DMatrix<f64>,
    /// Committed coefficients of the previous step.
    p_prev: DMatrix<f64>,
    /// Staging buffer for the current step.
    p_cur: DMatrix<f64>,
    /// Weighting coefficients; 1.0 unless pushed otherwise.
    f: DMatrix<f64>,
    grid_nodes_count: usize,
    allocator: KernelAllocator,
}

impl SourceKernel {
    /// Create a kernel for `grid_nodes_count` mesh nodes over the given
    /// allocator geometry. All buffers start zeroed, `F` starts at ones.
    pub fn new(grid_nodes_count: usize, allocator: KernelAllocator) -> Self {
        let spatial = allocator.spatial_size();
        Self {
            kernel: DMatrix::zeros(grid_nodes_count, allocator.allocated()),
            p_prev: DMatrix::zeros(grid_nodes_count, spatial),
            p_cur: DMatrix::zeros(grid_nodes_count, spatial),
            f: DMatrix::from_element(grid_nodes_count, spatial, 1.0),
            grid_nodes_count,
            allocator,
        }
    }

    /// Number of rows in a write block (mesh nodes).
    pub fn block_height(&self) -> usize {
        self.grid_nodes_count
    }

    /// Number of columns in a write block (source segments).
    pub fn block_width(&self) -> usize {
        self.allocator.spatial_size()
    }

    /// Column where the next block will be written.
    pub fn block_stride_in_row(&self) -> usize {
        self.allocator.pusher.idx_end()
    }

    /// Number of rows in the kernel matrix.
    pub fn rows(&self) -> usize {
        self.grid_nodes_count
    }

    /// Number of kernel columns filled with data so far.
    pub fn cols(&self) -> usize {
        self.block_stride_in_row()
    }

    /// The allocator pair governing this kernel's windows.
    pub fn allocator(&self) -> &KernelAllocator {
        &self.allocator
    }

    fn guard(&self) -> Result<(), ConvolveError> {
        if self.allocator.pusher.need_advance() {
            return Err(ConvolveError::NeedAdvance {
                container: "SourceKernel",
            });
        }
        Ok(())
    }

    /// Stage a single coefficient: `P_cur[row, col] = e`, `F[row, col] = f`.
    pub fn push_coef(&mut self, row: usize, col: usize, e: f64, f: f64) {
        self.p_cur[(row, col)] = e;
        self.f[(row, col)] = f;
        self.allocator.pusher.set_need_advance();
    }

    /// Stage a full column of E and F coefficients for one source segment.
    pub fn push_source(&mut self, col: usize, f: &[f64], e: &[f64]) {
        self.p_cur.column_mut(col).copy_from_slice(e);
        self.push_f_source(col, f);
    }

    /// Stage a full column of F coefficients only (reflection regime:
    /// E stays untouched).
    pub fn push_f_source(&mut self, col: usize, f: &[f64]) {
        self.f.column_mut(col).copy_from_slice(f);
        self.allocator.pusher.set_need_advance();
    }

    /// Write a single coefficient directly into `P_prev`. Used when the
    /// physics regime switches between steps.
    pub fn push_coef_prev(&mut self, row: usize, col: usize, e: f64) {
        self.p_prev[(row, col)] = e;
        self.allocator.pusher.set_need_advance();
    }

    /// Write a full column directly into `P_prev`.
    pub fn push_source_prev(&mut self, col: usize, e: &[f64]) {
        self.p_prev.column_mut(col).copy_from_slice(e);
        self.allocator.pusher.set_need_advance();
    }

    /// Commit the staged step.
    ///
    /// Writes `F .* (P_cur - P_prev)` into the next write slab of the
    /// kernel matrix, rolls `P_cur` into `P_prev` (resetting `P_cur` to
    /// zero), and runs the pusher hook, which moves the stride and clears
    /// the need-advance flag.
    pub fn advance(&mut self) {
        let stride = self.block_stride_in_row();
        let block = (&self.p_cur - &self.p_prev).component_mul(&self.f);
        self.kernel
            .view_mut((0, stride), (self.block_height(), self.block_width()))
            .copy_from(&block);

        std::mem::swap(&mut self.p_prev, &mut self.p_cur);
        self.p_cur.fill(0.0);
        self.allocator.pusher.on_push();
    }

    /// Replace the staging buffer wholesale (MixStep cache consumption).
    pub(crate) fn set_p_cur(&mut self, p_cur: DMatrix<f64>) {
        self.p_cur = p_cur;
    }

    /// Guarded single-coefficient read from the kernel matrix.
    pub fn at(&self, row: usize, col: usize) -> Result<f64, ConvolveError> {
        self.guard()?;
        Ok(self.kernel[(row, col)])
    }

    /// Guarded read addressed by physical meaning: mesh node, source
    /// segment, and time slab.
    pub fn at_source(
        &self,
        mesh_node_id: usize,
        source_node_id: usize,
        time_node: usize,
    ) -> Result<f64, ConvolveError> {
        self.at(mesh_node_id, source_node_id + self.block_width() * time_node)
    }

    /// Current `P_cur` staging value.
    pub fn p_cur_at(&self, row: usize, col: usize) -> f64 {
        self.p_cur[(row, col)]
    }

    /// Committed `P_prev` value.
    pub fn p_prev_at(&self, row: usize, col: usize) -> f64 {
        self.p_prev[(row, col)]
    }

    /// Current weight value.
    pub fn f_at(&self, row: usize, col: usize) -> f64 {
        self.f[(row, col)]
    }

    /// The committed previous-step coefficient block.
    pub fn p_prev(&self) -> &DMatrix<f64> {
        &self.p_prev
    }

    /// The staging coefficient block.
    pub fn p_cur(&self) -> &DMatrix<f64> {
        &self.p_cur
    }
}

impl KernelAccess for SourceKernel {
    fn advance_read_cursor(&mut self) {
        self.allocator.extractor.on_extract();
    }

    fn live_view(&self) -> Result<DMatrixView<'_, f64>, ConvolveError> {
        self.guard()?;
        let begin = self.allocator.extractor.idx_begin();
        let len = self.allocator.extractor.current_window_size();
        Ok(self.kernel.columns(begin, len))
    }

    fn current_window_size(&self) -> usize {
        self.allocator.extractor.current_window_size()
    }
}
