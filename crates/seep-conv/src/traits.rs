//! Access traits at the kernel/flux seam.
//!
//! The convolve call sites are generic over these so that one flux snapshot
//! can be multiplied against any kernel family (plain, accumulating, or
//! cached) and the multi-container layers can coordinate any flux family.

use nalgebra::DMatrixView;
use seep_core::ConvolveError;

use crate::flux::FluxBuffer;

/// Read access to a kernel's live column window.
pub trait KernelAccess {
    /// Move the read cursor one step. Called exactly once per driver step
    /// per kernel, by the convolve call site.
    fn advance_read_cursor(&mut self);

    /// The live sub-matrix. Pure: does not move the cursor. Fails with
    /// [`ConvolveError::NeedAdvance`] while pushed coefficients are
    /// uncommitted.
    fn live_view(&self) -> Result<DMatrixView<'_, f64>, ConvolveError>;

    /// Length of the live column window.
    fn current_window_size(&self) -> usize;
}

/// Extraction interface shared by the flux containers.
pub trait FluxExtract {
    /// Advance the read state once for this driver step and return the
    /// buffer to convolve against.
    fn extract(&mut self) -> &FluxBuffer;
}

/// Push interface shared by the per-fracture flux containers.
pub trait FracturePush {
    /// Push one slab of fracture flux samples, divided by the
    /// permeability-thickness product.
    fn push_coef(&mut self, cur_qzf: &[f64], value: f64);
}
