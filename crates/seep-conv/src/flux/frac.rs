//! Fracture flux: samples are qzf divided by the scalar
//! permeability-thickness product.

use nalgebra::DVector;
use seep_window::FluxAllocator;

use crate::flux::FluxBuffer;
use crate::traits::{FluxExtract, FracturePush};

/// Compute the fracture flux slab `qzf[i] / value` over `spatial_size`
/// entries.
pub fn frac_coef(cur_qzf: &[f64], value: f64, spatial_size: usize) -> DVector<f64> {
    DVector::from_fn(spatial_size, |i, _| cur_qzf[i] / value)
}

/// Flux container for a single fracture.
#[derive(Clone, Debug)]
pub struct FracFlux {
    buf: FluxBuffer,
}

impl FracFlux {
    /// Create a fracture flux over the given allocator geometry.
    pub fn new(allocator: FluxAllocator) -> Self {
        Self {
            buf: FluxBuffer::new(allocator),
        }
    }

    /// Sample addressed by absolute time index (`nt == 1` is the first
    /// pushed slab) and segment.
    pub fn at(&self, nt: usize, segm_id: usize) -> f64 {
        self.buf.at(nt, segm_id)
    }

    /// Number of committed pushes.
    pub fn flux_push_counter(&self) -> usize {
        self.buf.flux_push_counter()
    }

    /// The underlying sample buffer.
    pub fn buffer(&self) -> &FluxBuffer {
        &self.buf
    }
}

impl FracturePush for FracFlux {
    fn push_coef(&mut self, cur_qzf: &[f64], value: f64) {
        let spatial = self.buf.allocator().spatial_size();
        let coef = frac_coef(cur_qzf, value, spatial);
        self.buf.push_slab(coef.as_slice());
    }
}

impl FluxExtract for FracFlux {
    fn extract(&mut self) -> &FluxBuffer {
        self.buf.extract()
    }
}
