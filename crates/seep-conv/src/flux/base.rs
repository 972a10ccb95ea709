//! The contiguous flux buffer and the convolve entry points.
//!
//! [`FluxBuffer`] owns a column-major vector of `spatial_size *
//! temporal_size` samples, filled from the back so every time slab keeps a
//! stable address relative to the tail and the time-indexed access stays a
//! plain affine map. Convolution multiplies a kernel's live column window
//! by this buffer's live sub-vector; both windows must have the same
//! length.

use nalgebra::{DVector, DVectorView};
use rayon::prelude::*;
use seep_core::ConvolveError;
use seep_window::FluxAllocator;

use crate::traits::{FluxExtract, KernelAccess};

/// Flux sample buffer for a single linear source.
#[derive(Clone, Debug)]
pub struct FluxBuffer {
    flux: DVector<f64>,
    allocator: FluxAllocator,
}

impl FluxBuffer {
    /// Create a zeroed buffer over the given allocator geometry.
    pub fn new(allocator: FluxAllocator) -> Self {
        Self {
            flux: DVector::zeros(allocator.allocated()),
            allocator,
        }
    }

    /// The allocator pair governing this buffer's windows.
    pub fn allocator(&self) -> &FluxAllocator {
        &self.allocator
    }

    /// Number of samples in the live window.
    pub fn rows(&self) -> usize {
        self.allocator.current_window_size()
    }

    /// Length of the live read range.
    pub fn current_window_size(&self) -> usize {
        self.allocator.current_window_size()
    }

    /// Number of committed pushes.
    pub fn flux_push_counter(&self) -> usize {
        self.allocator.pushed_data_counter()
    }

    /// Total number of slabs the buffer was sized for.
    pub fn flux_push_nmbr(&self) -> usize {
        self.allocator.push_data_nmbr()
    }

    /// Push one time slab of samples (length `spatial_size`).
    ///
    /// The write position comes from the pusher after its hook has run, so
    /// the slab lands where the machine slid `idx_begin` to.
    pub fn push_slab(&mut self, data: &[f64]) {
        self.allocator.pusher.set_need_advance();
        self.allocator.pusher.on_push();
        let begin = self.allocator.pusher.idx_begin();
        let spatial = self.allocator.spatial_size();
        self.flux
            .rows_mut(begin, spatial)
            .copy_from_slice(&data[..spatial]);
    }

    /// The live sub-vector. Pure: does not move the read cursor.
    pub fn live_view(&self) -> DVectorView<'_, f64> {
        self.flux
            .rows(self.allocator.extractor.idx_begin(), self.rows())
    }

    /// Move the read cursor one step.
    pub fn advance_read_cursor(&mut self) {
        self.allocator.extractor.on_extract();
    }

    /// Sample addressed by absolute time index (`nt == 1` is the first
    /// pushed slab, at the buffer tail) and segment.
    pub fn at(&self, nt: usize, segm_id: usize) -> f64 {
        let spatial = self.allocator.spatial_size();
        self.flux[segm_id + self.flux.len() - nt * spatial]
    }

    fn check_windows<K: KernelAccess>(&self, kernel: &K) -> Result<(), ConvolveError> {
        if self.allocator.pusher.need_advance() {
            return Err(ConvolveError::NeedAdvance {
                container: "FluxBuffer",
            });
        }
        let (kw, fw) = (kernel.current_window_size(), self.current_window_size());
        if kw != fw {
            return Err(ConvolveError::WindowMismatch { kernel: kw, flux: fw });
        }
        Ok(())
    }

    /// Convolve the kernel's live window with this buffer's live window.
    ///
    /// Advances the kernel's read cursor once, which is the kernel's one
    /// extract for the step. The flux cursor is *not* moved here; call
    /// [`FluxExtract::extract`] or
    /// [`FluxBuffer::advance_read_cursor`] once per step before convolving.
    pub fn convolve<K: KernelAccess>(&self, kernel: &mut K) -> Result<DVector<f64>, ConvolveError> {
        kernel.advance_read_cursor();
        self.check_windows(kernel)?;
        let view = kernel.live_view()?;
        Ok(view * self.live_view())
    }

    /// Row-block parallel variant of [`FluxBuffer::convolve`].
    ///
    /// Splits the kernel's row range across the rayon pool and computes
    /// disjoint segments of the result. No allocator state is touched
    /// inside the parallel region; results are bitwise order-independent
    /// because each row's dot product stays sequential.
    pub fn convolve_par<K: KernelAccess>(
        &self,
        kernel: &mut K,
    ) -> Result<DVector<f64>, ConvolveError> {
        kernel.advance_read_cursor();
        self.check_windows(kernel)?;
        let view = kernel.live_view()?;
        let flux = self.live_view();

        let rows = view.nrows();
        let mut out = DVector::zeros(rows);
        if rows == 0 {
            return Ok(out);
        }
        let block = rows.div_ceil(rayon::current_num_threads()).max(1);
        out.as_mut_slice()
            .par_chunks_mut(block)
            .enumerate()
            .for_each(|(chunk_id, chunk)| {
                let start = chunk_id * block;
                let partial = view.rows(start, chunk.len()) * flux;
                chunk.copy_from_slice(partial.as_slice());
            });
        Ok(out)
    }
}

impl FluxExtract for FluxBuffer {
    fn extract(&mut self) -> &FluxBuffer {
        self.advance_read_cursor();
        self
    }
}
