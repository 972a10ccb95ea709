//! Convolve one flux snapshot against an array of kernels.
//!
//! The read cursors move once per driver step. [`FluxMulti::convolve`]
//! upholds this by extracting the flux exactly once and passing the
//! resulting view into each per-kernel convolution; each kernel's own
//! cursor advances inside its convolve.

use nalgebra::DVector;
use seep_core::ConvolveError;

use crate::traits::{FluxExtract, KernelAccess};

/// A flux container paired with one result vector per kernel.
#[derive(Clone, Debug)]
pub struct FluxMulti<F> {
    flux: F,
    results: Vec<DVector<f64>>,
}

impl<F: FluxExtract> FluxMulti<F> {
    /// Wrap a flux container, reserving `array_size` result slots.
    pub fn new(flux: F, array_size: usize) -> Self {
        Self {
            flux,
            results: vec![DVector::zeros(0); array_size],
        }
    }

    /// Number of result slots.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether there are no result slots.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The wrapped flux container.
    pub fn flux(&self) -> &F {
        &self.flux
    }

    /// Mutable access to the wrapped flux container (pushes go through
    /// here).
    pub fn flux_mut(&mut self) -> &mut F {
        &mut self.flux
    }

    /// Convolve the same flux snapshot against every kernel.
    ///
    /// Calls `extract()` exactly once; the flux cursor must not fire per
    /// kernel.
    ///
    /// # Panics
    ///
    /// Panics if `kernels.len()` differs from the number of result slots.
    pub fn convolve<K: KernelAccess>(
        &mut self,
        kernels: &mut [K],
    ) -> Result<&[DVector<f64>], ConvolveError> {
        assert_eq!(
            kernels.len(),
            self.results.len(),
            "kernel count must match the result-slot count"
        );
        let view = self.flux.extract();
        for (result, kernel) in self.results.iter_mut().zip(kernels.iter_mut()) {
            *result = view.convolve(kernel)?;
        }
        Ok(&self.results)
    }

    /// One component of one result vector.
    pub fn result(&self, idx: usize, data_id: usize) -> f64 {
        self.results[data_id][idx]
    }

    /// Length of one result vector.
    pub fn result_len(&self, data_id: usize) -> usize {
        self.results[data_id].len()
    }

    /// One result vector.
    pub fn result_vec(&self, data_id: usize) -> &DVector<f64> {
        &self.results[data_id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux::FluxBuffer;
    use crate::kernel::SourceKernel;
    use approx::assert_relative_eq;
    use seep_window::{FluxAllocator, KernelAllocator};

    fn make_kernels(count: usize) -> Vec<SourceKernel> {
        (0..count)
            .map(|id| {
                let mut kernel = SourceKernel::new(2, KernelAllocator::const_step(2, 3));
                kernel.push_coef(0, 0, (id + 1) as f64, 1.0);
                kernel.push_coef(1, 1, (id + 1) as f64, 1.0);
                kernel.advance();
                kernel
            })
            .collect()
    }

    #[test]
    fn convolve_extracts_the_flux_exactly_once() {
        let flux = FluxBuffer::new(FluxAllocator::const_step(2, 3, 3));
        let mut multi = FluxMulti::new(flux, 3);
        multi.flux_mut().push_slab(&[1.0, 1.0]);

        let mut kernels = make_kernels(3);
        multi.convolve(&mut kernels).unwrap();

        // One driver step advanced the flux window by one slab, not three.
        assert_eq!(multi.flux().current_window_size(), 2);
    }

    #[test]
    fn results_match_individual_convolves() {
        let flux = FluxBuffer::new(FluxAllocator::const_step(2, 3, 3));
        let mut multi = FluxMulti::new(flux, 2);
        multi.flux_mut().push_slab(&[2.0, 5.0]);

        let mut kernels = make_kernels(2);
        let results = multi.convolve(&mut kernels).unwrap().to_vec();

        // Reference: the same snapshot convolved individually, with the
        // single-extract convention applied by hand.
        let mut reference = FluxBuffer::new(FluxAllocator::const_step(2, 3, 3));
        reference.push_slab(&[2.0, 5.0]);
        let mut ref_kernels = make_kernels(2);
        reference.advance_read_cursor();
        for (result, kernel) in results.iter().zip(ref_kernels.iter_mut()) {
            let expected = reference.convolve(kernel).unwrap();
            for row in 0..2 {
                assert_relative_eq!(result[row], expected[row]);
            }
        }

        // Spot values: kernel k scales the unit slab by k+1.
        assert_relative_eq!(multi.result(0, 0), 2.0);
        assert_relative_eq!(multi.result(1, 1), 10.0);
        assert_eq!(multi.result_len(0), 2);
    }
}
