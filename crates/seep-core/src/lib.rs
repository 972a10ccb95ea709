//! Core types for the seep convolution engine.
//!
//! This is the leaf crate with zero internal seep dependencies. It defines
//! the error type shared by the kernel and flux containers, and the time
//! policies that pace a simulation through its history regimes.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod time;

pub use error::ConvolveError;
pub use time::{ConstStepTime, MainStepTime, MixStepTime, SmallStepTime, TimePolicy};
