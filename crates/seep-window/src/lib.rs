//! History-window allocators for the seep convolution engine.
//!
//! A sliding-window temporal convolution keeps its kernel coefficients and
//! flux samples in fixed contiguous buffers, packed as spatial-size column
//! slabs per time step. The types in this crate are the index-arithmetic
//! state machines that decide, per simulation step, where the next slab is
//! written and which `[idx_begin, idx_end)` range is live for the next
//! convolution, including the transitions at the external boundary (old
//! contributions are discarded) and into the coarser second history period.
//!
//! Each allocator is a pair of machines over the same geometry: a *pusher*
//! (write side, carrying the need-advance flag) and an *extractor* (read
//! side). Regime variants are expressed as data-carrying enums dispatched
//! by variant; the regimes are ConstStep, MainStep, and MixStep, with
//! SmallStep reusing the ConstStep machines.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod alloc;
pub mod descriptor;
pub mod flux;
pub mod kernel;

pub use alloc::{FluxAllocator, FluxRegime, KernelAllocator, KernelRegime};
pub use descriptor::WindowDesc;
pub use flux::{FluxExtractState, FluxExtractor, FluxPusher};
pub use kernel::{KernelExtractState, KernelExtractor, KernelPushState, KernelPusher};
