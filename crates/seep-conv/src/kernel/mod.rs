//! Kernel containers: influence-function matrices and their advance
//! pipelines.

pub mod frac;
pub mod mix;
pub mod source;

pub use frac::{FracKernel, FracKernelContainer};
pub use mix::MixStepWellKernel;
pub use source::SourceKernel;
