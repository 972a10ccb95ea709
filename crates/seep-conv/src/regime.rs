//! Per-regime allocator bundles for one well plus a set of fractures.
//!
//! A regime fixes the window geometry for every container a driver step
//! touches: the well kernel and flux allocators, and one kernel/flux
//! allocator pair per fracture (`frac_ny[f]` nodes along fracture `f`).
//! The containers themselves are built from these by the caller, which
//! keeps buffer ownership where the physics wants it.

use seep_window::{FluxAllocator, KernelAllocator};
use tracing::debug;

/// Allocator bundle for the ConstStep regime.
#[derive(Clone, Debug)]
pub struct ConstStepRegime {
    /// Window geometry for the well kernel.
    pub well_kernel: KernelAllocator,
    /// Window geometry for the well flux.
    pub well_flux: FluxAllocator,
    /// Per-fracture kernel geometries.
    pub frac_kernels: Vec<KernelAllocator>,
    /// Per-fracture flux geometries.
    pub frac_fluxes: Vec<FluxAllocator>,
}

impl ConstStepRegime {
    /// Build the bundle.
    ///
    /// `frame_temporal_size` slabs reach the external boundary (kernel
    /// allocation); fluxes keep `temporal_size` slabs with
    /// `frame_temporal_size <= temporal_size`.
    pub fn new(
        well_spatial_size: usize,
        frame_temporal_size: usize,
        temporal_size: usize,
        frac_ny: &[usize],
    ) -> Self {
        debug!(
            well_spatial_size,
            frame_temporal_size,
            temporal_size,
            frac_count = frac_ny.len(),
            "building ConstStep regime"
        );
        Self {
            well_kernel: KernelAllocator::const_step(well_spatial_size, frame_temporal_size),
            well_flux: FluxAllocator::const_step(
                well_spatial_size,
                temporal_size,
                frame_temporal_size,
            ),
            frac_kernels: frac_ny
                .iter()
                .map(|&ny| KernelAllocator::const_step(ny, frame_temporal_size))
                .collect(),
            frac_fluxes: frac_ny
                .iter()
                .map(|&ny| FluxAllocator::const_step(ny, temporal_size, frame_temporal_size))
                .collect(),
        }
    }
}

/// The SmallStep regime reuses the ConstStep geometry (only its time
/// policy differs).
pub type SmallStepRegime = ConstStepRegime;

/// Allocator bundle for the MainStep regime.
#[derive(Clone, Debug)]
pub struct MainStepRegime {
    /// Window geometry for the well kernel.
    pub well_kernel: KernelAllocator,
    /// Window geometry for the well flux (averaging-ring children).
    pub well_flux: FluxAllocator,
    /// Per-fracture kernel geometries.
    pub frac_kernels: Vec<KernelAllocator>,
    /// Per-fracture flux geometries.
    pub frac_fluxes: Vec<FluxAllocator>,
}

impl MainStepRegime {
    /// Build the bundle. Kernels keep `frame_temporal_size` slabs; fluxes
    /// keep `main_step_nmbr` slabs and fan out over `small_step_nmbr`
    /// averaging children.
    pub fn new(
        well_spatial_size: usize,
        frame_temporal_size: usize,
        m: usize,
        small_step_nmbr: usize,
        main_step_nmbr: usize,
        frac_ny: &[usize],
    ) -> Self {
        debug!(
            well_spatial_size,
            frame_temporal_size,
            m,
            small_step_nmbr,
            main_step_nmbr,
            frac_count = frac_ny.len(),
            "building MainStep regime"
        );
        let kernel = |spatial: usize| {
            KernelAllocator::main_step(
                spatial,
                frame_temporal_size,
                m,
                small_step_nmbr,
                main_step_nmbr,
            )
        };
        let flux = |spatial: usize| {
            FluxAllocator::main_step(spatial, main_step_nmbr, frame_temporal_size, small_step_nmbr)
        };
        Self {
            well_kernel: kernel(well_spatial_size),
            well_flux: flux(well_spatial_size),
            frac_kernels: frac_ny.iter().map(|&ny| kernel(ny)).collect(),
            frac_fluxes: frac_ny.iter().map(|&ny| flux(ny)).collect(),
        }
    }
}

/// Allocator bundle for the MixStep regime.
///
/// A single time slab participates in the convolution; the kernel history
/// is carried by the coefficient cache instead of the buffer.
#[derive(Clone, Debug)]
pub struct MixStepRegime {
    /// Window geometry for the well kernel.
    pub well_kernel: KernelAllocator,
    /// Window geometry for the well flux.
    pub well_flux: FluxAllocator,
    /// Per-fracture kernel geometries.
    pub frac_kernels: Vec<KernelAllocator>,
    /// Per-fracture flux geometries.
    pub frac_fluxes: Vec<FluxAllocator>,
}

impl MixStepRegime {
    /// Number of time slabs in the live window; only the newest term
    /// participates in a MixStep convolution.
    pub const FRAME_TEMPORAL_SIZE: usize = 1;

    /// Build the bundle with `m` split main steps in the second history
    /// period.
    pub fn new(
        well_spatial_size: usize,
        small_step_nmbr_per_main_step: usize,
        m: usize,
        frac_ny: &[usize],
    ) -> Self {
        debug!(
            well_spatial_size,
            small_step_nmbr_per_main_step,
            m,
            frac_count = frac_ny.len(),
            "building MixStep regime"
        );
        let frame = Self::FRAME_TEMPORAL_SIZE;
        Self {
            well_kernel: KernelAllocator::mix_step(
                well_spatial_size,
                frame,
                small_step_nmbr_per_main_step,
                m,
            ),
            well_flux: FluxAllocator::mix_step(well_spatial_size, frame),
            frac_kernels: frac_ny
                .iter()
                .map(|&ny| {
                    KernelAllocator::mix_step(ny, frame, small_step_nmbr_per_main_step, m)
                })
                .collect(),
            frac_fluxes: frac_ny
                .iter()
                .map(|&ny| FluxAllocator::mix_step(ny, frame))
                .collect(),
        }
    }
}
