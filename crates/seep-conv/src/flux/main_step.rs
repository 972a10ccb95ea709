//! The MainStep averaging ring.
//!
//! While the simulation walks the first history period, every push fans out
//! into `small_step_nmbr` child buffers: the last child keeps the raw
//! sample, and child `k` keeps the interpolation
//! `ratio * x + (1 - ratio) * x_prev` with `ratio = (k+1)/N`, the sample
//! re-read at the k-th intermediate small step. In the second period the
//! driver no longer pushes; successive extracts hand out the pre-averaged
//! children in round-robin.

use nalgebra::DVector;
use seep_window::{FluxAllocator, FluxRegime};
use tracing::debug;

use crate::flux::frac::frac_coef;
use crate::flux::well::well_coef;
use crate::flux::FluxBuffer;
use crate::traits::{FluxExtract, FracturePush};

/// Ring of sub-step flux buffers with running averages.
#[derive(Clone, Debug)]
pub struct MainStepRing {
    children: Vec<FluxBuffer>,
    /// The previous raw sample (length `spatial_size`, zeroed initially).
    prev_flux: DVector<f64>,
    cur_child: usize,
    small_step_nmbr: usize,
    main_step_counter: usize,
    main_step_nmbr: usize,
}

impl MainStepRing {
    /// Build the ring from a MainStep flux allocator; every child shares
    /// its geometry.
    ///
    /// # Panics
    ///
    /// Panics if the allocator is not a MainStep allocator.
    pub fn new(allocator: FluxAllocator) -> Self {
        let (small_step_nmbr, main_step_nmbr) = match allocator.regime() {
            FluxRegime::MainStep {
                small_step_nmbr,
                main_step_nmbr,
            } => (small_step_nmbr, main_step_nmbr),
            other => panic!("MainStepRing requires a MainStep allocator, got {other:?}"),
        };
        let children = (0..small_step_nmbr)
            .map(|_| FluxBuffer::new(allocator.clone()))
            .collect();
        Self {
            children,
            prev_flux: DVector::zeros(allocator.spatial_size()),
            // The raw (unaveraged) child serves convolution initially.
            cur_child: small_step_nmbr - 1,
            small_step_nmbr,
            main_step_counter: 0,
            main_step_nmbr,
        }
    }

    /// Number of sub-step children.
    pub fn small_step_nmbr(&self) -> usize {
        self.small_step_nmbr
    }

    /// Index of the child currently serving convolution.
    pub fn cur_child(&self) -> usize {
        self.cur_child
    }

    /// The child currently serving convolution.
    pub fn current(&self) -> &FluxBuffer {
        &self.children[self.cur_child]
    }

    /// Point the ring at a particular child.
    ///
    /// # Panics
    ///
    /// Panics if `step_id` is out of range.
    pub fn switch_child(&mut self, step_id: usize) {
        assert!(step_id < self.small_step_nmbr, "child index out of range");
        self.cur_child = step_id;
    }

    /// Number of committed pushes on the current child.
    pub fn flux_push_counter(&self) -> usize {
        self.current().flux_push_counter()
    }

    /// Total number of slabs each child was sized for.
    pub fn flux_push_nmbr(&self) -> usize {
        self.current().flux_push_nmbr()
    }

    /// Fan one raw sample slab out into the ring.
    pub fn push_slab(&mut self, x: &DVector<f64>) {
        let n = self.small_step_nmbr;
        // The last child keeps the raw, unaveraged sample.
        self.children[n - 1].push_slab(x.as_slice());
        for k in 0..n - 1 {
            let ratio = (k + 1) as f64 / n as f64;
            let blended = x.zip_map(&self.prev_flux, |cur, prev| {
                ratio * cur + (1.0 - ratio) * prev
            });
            self.children[k].push_slab(blended.as_slice());
        }
        self.prev_flux.copy_from(x);
    }

    /// Advance the read state once for this driver step.
    ///
    /// First period: all children move their cursors in lockstep and the
    /// raw child keeps serving. Second period: no child cursor moves;
    /// the ring rotates to the next pre-averaged child.
    pub fn extract(&mut self) -> &FluxBuffer {
        if self.main_step_counter < self.main_step_nmbr {
            self.main_step_counter += 1;
            for child in &mut self.children {
                child.advance_read_cursor();
            }
            if self.main_step_counter == self.main_step_nmbr {
                debug!(
                    main_step_nmbr = self.main_step_nmbr,
                    "first history period complete; rotating pre-averaged sub-step buffers"
                );
            }
        } else {
            self.cur_child = (self.cur_child + 1) % self.small_step_nmbr;
        }
        &self.children[self.cur_child]
    }

    /// Sample addressed by absolute time index and segment.
    ///
    /// First-period times (`nt - 1 < main_step_nmbr`) read the raw child;
    /// second-period times read the pre-averaged child for that sub-step
    /// at its live front.
    pub fn at(&self, nt: usize, segm_id: usize) -> f64 {
        if nt - 1 < self.main_step_nmbr {
            self.children[self.small_step_nmbr - 1].at(nt, segm_id)
        } else {
            let child = &self.children[(nt - 1 - self.main_step_nmbr) % self.small_step_nmbr];
            child.live_view()[segm_id]
        }
    }
}

impl FluxExtract for MainStepRing {
    fn extract(&mut self) -> &FluxBuffer {
        MainStepRing::extract(self)
    }
}

/// MainStep averaging ring fed with well samples (qzi/permeability).
#[derive(Clone, Debug)]
pub struct WellFluxMainStep {
    ring: MainStepRing,
}

impl WellFluxMainStep {
    /// Create the ring over a MainStep flux allocator.
    pub fn new(allocator: FluxAllocator) -> Self {
        Self {
            ring: MainStepRing::new(allocator),
        }
    }

    /// Push the qzi/permeability ratio at a new time moment, fanning the
    /// running averages out into the ring.
    pub fn push_coef(&mut self, cur_qzi: &[f64], perm: &[f64]) {
        let spatial = self.ring.current().allocator().spatial_size();
        let x = well_coef(cur_qzi, perm, spatial);
        self.ring.push_slab(&x);
    }

    /// The underlying averaging ring.
    pub fn ring(&self) -> &MainStepRing {
        &self.ring
    }

    /// Sample addressed by absolute time index and segment.
    pub fn at(&self, nt: usize, segm_id: usize) -> f64 {
        self.ring.at(nt, segm_id)
    }

    /// Number of committed pushes on the current child.
    pub fn flux_push_counter(&self) -> usize {
        self.ring.flux_push_counter()
    }

    /// Total number of slabs each child was sized for.
    pub fn flux_push_nmbr(&self) -> usize {
        self.ring.flux_push_nmbr()
    }
}

impl FluxExtract for WellFluxMainStep {
    fn extract(&mut self) -> &FluxBuffer {
        self.ring.extract()
    }
}

/// MainStep averaging ring fed with fracture samples (qzf/value).
#[derive(Clone, Debug)]
pub struct FracFluxMainStep {
    ring: MainStepRing,
}

impl FracFluxMainStep {
    /// Create the ring over a MainStep flux allocator.
    pub fn new(allocator: FluxAllocator) -> Self {
        Self {
            ring: MainStepRing::new(allocator),
        }
    }

    /// The underlying averaging ring.
    pub fn ring(&self) -> &MainStepRing {
        &self.ring
    }

    /// Sample addressed by absolute time index and segment.
    pub fn at(&self, nt: usize, segm_id: usize) -> f64 {
        self.ring.at(nt, segm_id)
    }
}

impl FracturePush for FracFluxMainStep {
    fn push_coef(&mut self, cur_qzf: &[f64], value: f64) {
        let spatial = self.ring.current().allocator().spatial_size();
        let x = frac_coef(cur_qzf, value, spatial);
        self.ring.push_slab(&x);
    }
}

impl FluxExtract for FracFluxMainStep {
    fn extract(&mut self) -> &FluxBuffer {
        self.ring.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// S=1, three sub-steps, four main steps, frame of four.
    fn make_ring() -> MainStepRing {
        MainStepRing::new(FluxAllocator::main_step(1, 4, 4, 3))
    }

    #[test]
    fn push_interpolates_between_samples() {
        let mut ring = make_ring();

        ring.push_slab(&DVector::from_element(1, 9.0));
        // Against a zero previous sample: thirds of 9.
        assert_relative_eq!(ring.children[0].at(1, 0), 3.0);
        assert_relative_eq!(ring.children[1].at(1, 0), 6.0);
        assert_relative_eq!(ring.children[2].at(1, 0), 9.0);

        ring.push_slab(&DVector::from_element(1, 3.0));
        // Against the previous raw sample of 9; the second push lands at
        // the absolute time index 2.
        assert_relative_eq!(ring.children[0].at(2, 0), 7.0);
        assert_relative_eq!(ring.children[1].at(2, 0), 5.0);
        assert_relative_eq!(ring.children[2].at(2, 0), 3.0);
    }

    #[test]
    fn first_period_extracts_children_in_lockstep() {
        let mut ring = make_ring();
        ring.push_slab(&DVector::from_element(1, 6.0));

        let cur = ring.extract();
        assert_eq!(cur.current_window_size(), 1);
        // The raw child keeps serving through the first period.
        assert_eq!(ring.cur_child(), 2);
        for child in &ring.children {
            assert_eq!(child.current_window_size(), 1);
        }
    }

    #[test]
    fn second_period_rotates_without_extracting() {
        let mut ring = make_ring();
        for step in 0..4 {
            ring.push_slab(&DVector::from_element(1, step as f64 + 1.0));
            ring.extract();
        }
        let windows: Vec<usize> = ring
            .children
            .iter()
            .map(|c| c.current_window_size())
            .collect();

        // First period over: rotation starts at child 0.
        ring.extract();
        assert_eq!(ring.cur_child(), 0);
        ring.extract();
        assert_eq!(ring.cur_child(), 1);
        ring.extract();
        assert_eq!(ring.cur_child(), 2);
        ring.extract();
        assert_eq!(ring.cur_child(), 0);

        // No child cursor moved during rotation.
        let after: Vec<usize> = ring
            .children
            .iter()
            .map(|c| c.current_window_size())
            .collect();
        assert_eq!(windows, after);
    }

    #[test]
    fn switch_child_repoints_the_ring() {
        let mut ring = make_ring();
        ring.switch_child(1);
        assert_eq!(ring.cur_child(), 1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn switch_child_rejects_bad_index() {
        make_ring().switch_child(3);
    }

    #[test]
    fn time_indexed_access_spans_both_periods() {
        let mut ring = make_ring();
        for step in 0..4 {
            ring.push_slab(&DVector::from_element(1, (step + 1) as f64 * 10.0));
            ring.extract();
        }

        // First-period times read the raw child by absolute index.
        assert_relative_eq!(ring.at(1, 0), 10.0);
        assert_relative_eq!(ring.at(2, 0), 20.0);
        assert_relative_eq!(ring.at(4, 0), 40.0);

        // Second-period times walk the averaged children at their fronts.
        // Child 0 front: (1/3)*40 + (2/3)*30 = 100/3.
        assert_relative_eq!(ring.at(5, 0), 100.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn well_ring_applies_the_permeability_ratio() {
        let mut flux = WellFluxMainStep::new(FluxAllocator::main_step(2, 3, 3, 2));
        flux.push_coef(&[4.0, 6.0], &[2.0, 3.0]);
        // Raw child holds [2, 2].
        assert_relative_eq!(flux.at(1, 0), 2.0);
        assert_relative_eq!(flux.at(1, 1), 2.0);
    }

    #[test]
    fn frac_ring_applies_the_scalar_ratio() {
        let mut flux = FracFluxMainStep::new(FluxAllocator::main_step(2, 3, 3, 2));
        flux.push_coef(&[4.0, 6.0], 2.0);
        assert_relative_eq!(flux.at(1, 0), 2.0);
        assert_relative_eq!(flux.at(1, 1), 3.0);
    }

    #[test]
    #[should_panic(expected = "MainStep allocator")]
    fn const_step_allocator_is_rejected() {
        MainStepRing::new(FluxAllocator::const_step(1, 3, 3));
    }
}
