//! Per-fracture round-robin flux container.
//!
//! One child flux per fracture, pushed in round-robin order. Convolution is
//! gated on a complete cycle: every fracture must have received its push
//! for the step before the summed convolve may run.

use nalgebra::DVector;
use seep_core::ConvolveError;
use tracing::trace;

use crate::traits::{FluxExtract, FracturePush, KernelAccess};

/// Container of per-fracture flux children with a single
/// "ready to advance" gate.
#[derive(Clone, Debug)]
pub struct FracturesFluxContainer<F> {
    children: Vec<F>,
    frac_count: usize,
    cur_frac_id: usize,
    need_advance: bool,
    /// Sum of the per-fracture convolutions from the last convolve.
    convolved: DVector<f64>,
}

impl<F> FracturesFluxContainer<F> {
    /// Build the container from one pre-constructed child per fracture.
    /// Children are emplaced once and never move.
    pub fn new(children: Vec<F>) -> Self {
        let frac_count = children.len();
        Self {
            children,
            frac_count,
            cur_frac_id: 0,
            need_advance: false,
            convolved: DVector::zeros(0),
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

    /// Shared access to one fracture's flux.
    pub fn child(&self, frac_id: usize) -> &F {
        &self.children[frac_id]
    }

    /// Result of the last convolve for one mesh node; 0 when the container
    /// is empty.
    pub fn result(&self, idx: usize) -> f64 {
        if self.frac_count > 0 {
            self.convolved[idx]
        } else {
            0.0
        }
    }
}

impl<F: FracturePush> FracturesFluxContainer<F> {
    /// Push qzf samples to the current fracture and rotate to the next.
    ///
    /// Pushing flux data is a single-step process, so the rotation happens
    /// on every push (unlike the kernel container's explicit `push_done`).
    pub fn push_coef(&mut self, cur_qzf: &[f64], value: f64) {
        self.children[self.cur_frac_id].push_coef(cur_qzf, value);
        self.need_advance = true;
        self.cur_frac_id = (self.cur_frac_id + 1) % self.frac_count;
        if self.cur_frac_id == 0 {
            trace!(frac_count = self.frac_count, "fracture flux push cycle complete");
        }
    }
}

impl<F: FluxExtract> FracturesFluxContainer<F> {
    /// Convolve every fracture's flux with its kernel and sum the results.
    ///
    /// Fails with [`ConvolveError::FractureCycleIncomplete`] unless every
    /// fracture has been pushed this step (`cur_frac_id == 0`).
    ///
    /// # Panics
    ///
    /// Panics if `kernels.len()` differs from the fracture count.
    pub fn convolve<K: KernelAccess>(
        &mut self,
        kernels: &mut [K],
    ) -> Result<&DVector<f64>, ConvolveError> {
        if self.cur_frac_id != 0 {
            return Err(ConvolveError::FractureCycleIncomplete {
                cur_frac_id: self.cur_frac_id,
                frac_count: self.frac_count,
            });
        }
        assert_eq!(
            kernels.len(),
            self.frac_count,
            "kernel count must match the fracture count"
        );

        let mut sum: Option<DVector<f64>> = None;
        for (child, kernel) in self.children.iter_mut().zip(kernels.iter_mut()) {
            let partial = child.extract().convolve(kernel)?;
            match &mut sum {
                Some(acc) => *acc += partial,
                None => sum = Some(partial),
            }
        }
        self.convolved = sum.unwrap_or_else(|| DVector::zeros(0));
        self.need_advance = false;
        Ok(&self.convolved)
    }
}
