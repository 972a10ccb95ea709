//! Flux containers: source-strength buffers and the coordination layers
//! that convolve them against kernels.

pub mod base;
pub mod frac;
pub mod fractures;
pub mod main_step;
pub mod multi;
pub mod well;

pub use base::FluxBuffer;
pub use frac::FracFlux;
pub use fractures::FracturesFluxContainer;
pub use main_step::{FracFluxMainStep, MainStepRing, WellFluxMainStep};
pub use multi::FluxMulti;
pub use well::WellFlux;
