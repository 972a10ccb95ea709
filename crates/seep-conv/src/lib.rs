//! Kernel and flux containers for the seep convolution engine.
//!
//! At each simulation step the outer driver pushes one time slab of kernel
//! coefficients into a kernel container and one slab of flux samples into a
//! flux container, commits the kernel slab with `advance()`, and asks the
//! flux container to convolve against the kernel. Both sides share a live
//! window governed by the allocators in [`seep_window`]; the product of the
//! live kernel sub-matrix and the live flux sub-vector is the convolution
//! result for the step.
//!
//! The read cursor is moved by an explicit `advance_read_cursor()`, once
//! per driver step, while `live_view()` stays pure. [`flux::FluxMulti`]
//! and [`flux::FracturesFluxContainer`] uphold the once-per-step rule when
//! one flux snapshot feeds several kernels or several fractures sum into
//! one result.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod flux;
pub mod kernel;
pub mod regime;
pub mod traits;

pub use flux::{
    FluxBuffer, FluxMulti, FracFlux, FracFluxMainStep, FracturesFluxContainer, MainStepRing,
    WellFlux, WellFluxMainStep,
};
pub use kernel::{FracKernel, FracKernelContainer, MixStepWellKernel, SourceKernel};
pub use regime::{ConstStepRegime, MainStepRegime, MixStepRegime, SmallStepRegime};
pub use traits::{FluxExtract, FracturePush, KernelAccess};
