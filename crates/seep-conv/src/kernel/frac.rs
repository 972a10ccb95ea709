//! Fracture kernels: accumulation instead of overwrite, and the
//! round-robin container coordinating one kernel per fracture.
//!
//! A fracture kernel sums `R .* (U - U_prev)` into its write slab across the
//! multiple pushes an outer iteration performs, so its `advance()` only
//! commits the slab position; the matrix content is already in place.

use nalgebra::{DMatrix, DMatrixView};
use seep_core::ConvolveError;
use seep_window::KernelAllocator;
use tracing::trace;

use crate::traits::KernelAccess;

/// Kernel container for a single fracture, accumulating
/// `R .* (U - U_prev)` column blocks.
#[derive(Clone, Debug)]
pub struct FracKernel {
    kernel: DMatrix<f64>,
    /// U-coefficients committed by the previous push.
    p_prev: DMatrix<f64>,
    grid_nodes_count: usize,
    allocator: KernelAllocator,
}

impl FracKernel {
    /// Create a fracture kernel for `grid_nodes_count` mesh nodes.
    pub fn new(grid_nodes_count: usize, allocator: KernelAllocator) -> Self {
        let spatial = allocator.spatial_size();
        Self {
            kernel: DMatrix::zeros(grid_nodes_count, allocator.allocated()),
            p_prev: DMatrix::zeros(grid_nodes_count, spatial),
            grid_nodes_count,
            allocator,
        }
    }

    /// Number of rows in a write block (mesh nodes).
    pub fn block_height(&self) -> usize {
        self.grid_nodes_count
    }

    /// Number of columns in a write block (fracture nodes).
    pub fn block_width(&self) -> usize {
        self.allocator.spatial_size()
    }

    /// Column where the current write slab starts.
    pub fn block_stride_in_row(&self) -> usize {
        self.allocator.pusher.idx_end()
    }

    /// The allocator pair governing this kernel's windows.
    pub fn allocator(&self) -> &KernelAllocator {
        &self.allocator
    }

    fn guard(&self) -> Result<(), ConvolveError> {
        if self.allocator.pusher.need_advance() {
            return Err(ConvolveError::NeedAdvance {
                container: "FracKernel",
            });
        }
        Ok(())
    }

    /// Accumulate one R/U push into the current write slab.
    ///
    /// `r_data` is a column of `block_height()` R-values; `u_data` is a
    /// column-major `block_height() × block_width()` U-block. The slab
    /// receives `(U - U_prev)` scaled row-wise by R, and `U` becomes the
    /// new baseline.
    pub fn push_coef(&mut self, r_data: &[f64], u_data: &[f64]) {
        let (height, width) = (self.block_height(), self.block_width());
        let u = DMatrix::from_column_slice(height, width, u_data);
        let stride = self.block_stride_in_row();

        let mut slab = self.kernel.view_mut((0, stride), (height, width));
        for col in 0..width {
            for row in 0..height {
                slab[(row, col)] += (u[(row, col)] - self.p_prev[(row, col)]) * r_data[row];
            }
        }

        self.p_prev = u;
        self.allocator.pusher.set_need_advance();
    }

    /// Seed the U baseline without touching the kernel matrix.
    pub fn push_coef_prev(&mut self, u_data: &[f64]) {
        let (height, width) = (self.block_height(), self.block_width());
        self.p_prev = DMatrix::from_column_slice(height, width, u_data);
        self.allocator.pusher.set_need_advance();
    }

    /// Commit the accumulated slab: move the stride and clear the flag.
    /// The matrix content was already summed in place by the pushes.
    pub fn advance(&mut self) {
        self.allocator.pusher.on_push();
    }

    /// Zero the kernel matrix between outer iterations.
    pub fn reset_kernel(&mut self) {
        self.kernel.fill(0.0);
    }

    /// Guarded single-coefficient read.
    pub fn at(&self, row: usize, col: usize) -> Result<f64, ConvolveError> {
        self.guard()?;
        Ok(self.kernel[(row, col)])
    }

    /// Guarded read addressed by mesh node, fracture node, and time slab.
    pub fn at_source(
        &self,
        mesh_node_id: usize,
        source_node_id: usize,
        time_node: usize,
    ) -> Result<f64, ConvolveError> {
        self.at(mesh_node_id, source_node_id + self.block_width() * time_node)
    }
}

impl KernelAccess for FracKernel {
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

/// Round-robin container of one [`FracKernel`] per fracture.
///
/// Pushing fracture coefficients is a multi-step procedure even for a
/// single fracture, so the cursor only moves when the caller signals
/// [`FracKernelContainer::push_done`].
#[derive(Clone, Debug)]
pub struct FracKernelContainer {
    children: Vec<FracKernel>,
    frac_count: usize,
    cur_frac_id: usize,
    need_advance: bool,
    /// Current time index, advanced by `push_done`.
    nt: usize,
}

impl FracKernelContainer {
    /// Build one child kernel per allocator, all over `grid_nodes_count`
    /// mesh nodes. Children are emplaced once and never move.
    pub fn new(grid_nodes_count: usize, allocators: Vec<KernelAllocator>) -> Self {
        let frac_count = allocators.len();
        let children = allocators
            .into_iter()
            .map(|alloc| FracKernel::new(grid_nodes_count, alloc))
            .collect();
        Self {
            children,
            frac_count,
            cur_frac_id: 0,
            need_advance: false,
            nt: 0,
        }
    }

    /// Number of fractures.
    pub fn len(&self) -> usize {
        self.frac_count
    }

    /// Whether the container holds no fractures.
    pub fn is_empty(&self) -> bool {
        self.frac_count == 0
    }

    /// The fracture the next push goes to.
    pub fn cur_frac_id(&self) -> usize {
        self.cur_frac_id
    }

    /// Current time index.
    pub fn nt(&self) -> usize {
        self.nt
    }

    /// Shared access to one fracture's kernel.
    pub fn child(&self, frac_id: usize) -> &FracKernel {
        &self.children[frac_id]
    }

    /// Mutable access to all children, in fracture order (the convolve
    /// call site pairs them with the per-fracture fluxes).
    pub fn children_mut(&mut self) -> &mut [FracKernel] {
        &mut self.children
    }

    /// Accumulate one R/U push into the current fracture's kernel.
    pub fn push_coef(&mut self, r_data: &[f64], u_data: &[f64]) {
        self.children[self.cur_frac_id].push_coef(r_data, u_data);
        self.need_advance = true;
    }

    /// Seed the current fracture's U baseline.
    pub fn push_coef_prev(&mut self, u_data: &[f64]) {
        self.children[self.cur_frac_id].push_coef_prev(u_data);
        self.need_advance = true;
    }

    /// Zero the current fracture's kernel matrix.
    pub fn reset_kernel(&mut self) {
        self.children[self.cur_frac_id].reset_kernel();
    }

    /// Signal that pushing to the current fracture is complete: advance
    /// the time index and rotate to the next fracture.
    pub fn push_done(&mut self) {
        self.nt += 1;
        self.cur_frac_id = (self.cur_frac_id + 1) % self.frac_count;
        if self.cur_frac_id == 0 {
            trace!(nt = self.nt, "fracture kernel push cycle complete");
        }
    }

    /// Commit the accumulated slabs of every fracture.
    pub fn advance(&mut self) {
        for kernel in &mut self.children {
            kernel.advance();
        }
        self.need_advance = false;
    }

    /// Per-fracture influence coefficient by physical address.
    pub fn irs(
        &self,
        frac_id: usize,
        frac_node: usize,
        mesh_row: usize,
        nt: usize,
    ) -> Result<f64, ConvolveError> {
        self.children[frac_id].at_source(mesh_row, frac_node, nt)
    }
}
