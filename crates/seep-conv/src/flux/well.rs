//! Well flux: samples are the flux-log divided element-wise by the
//! permeability-log.

use nalgebra::DVector;
use seep_window::FluxAllocator;

use crate::flux::FluxBuffer;
use crate::traits::FluxExtract;

/// Compute the well flux slab `qzi[i] / perm[i]` over `spatial_size`
/// entries.
pub fn well_coef(cur_qzi: &[f64], perm: &[f64], spatial_size: usize) -> DVector<f64> {
    DVector::from_fn(spatial_size, |i, _| cur_qzi[i] / perm[i])
}

/// Flux container for a well source.
#[derive(Clone, Debug)]
pub struct WellFlux {
    buf: FluxBuffer,
}

impl WellFlux {
    /// Create a well flux over the given allocator geometry.
    pub fn new(allocator: FluxAllocator) -> Self {
        Self {
            buf: FluxBuffer::new(allocator),
        }
    }

    /// Push the qzi/permeability ratio at a new time moment.
    pub fn push_coef(&mut self, cur_qzi: &[f64], perm: &[f64]) {
        let spatial = self.buf.allocator().spatial_size();
        let coef = well_coef(cur_qzi, perm, spatial);
        self.buf.push_slab(coef.as_slice());
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

    /// Total number of slabs the buffer was sized for.
    pub fn flux_push_nmbr(&self) -> usize {
        self.buf.flux_push_nmbr()
    }

    /// The underlying sample buffer.
    pub fn buffer(&self) -> &FluxBuffer {
        &self.buf
    }
}

impl FluxExtract for WellFlux {
    fn extract(&mut self) -> &FluxBuffer {
        self.buf.extract()
    }
}
