//! Error type for the convolution containers.
//!
//! Every variant is a caller bug upstream of the engine: the containers are
//! a numerical inner loop with no retry, partial failure, or recovery. The
//! driver propagates these to terminate the computation with a diagnostic.

use std::error::Error;
use std::fmt;

/// Errors surfaced by kernel and flux containers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConvolveError {
    /// A buffer was read while its need-advance flag was set: coefficients
    /// were pushed but `advance()` has not committed them.
    NeedAdvance {
        /// Name of the container whose state is pending.
        container: &'static str,
    },
    /// Kernel and flux live windows have different lengths at convolve time.
    WindowMismatch {
        /// Live-window length on the kernel side.
        kernel: usize,
        /// Live-window length on the flux side.
        flux: usize,
    },
    /// A multi-fracture convolve was requested before every fracture had
    /// received its push for the current step.
    FractureCycleIncomplete {
        /// The fracture the next push would go to.
        cur_frac_id: usize,
        /// Total number of fractures in the container.
        frac_count: usize,
    },
    /// The MixStep coefficient cache is full.
    CacheOverflow {
        /// Fixed capacity of the cache.
        capacity: usize,
    },
    /// The MixStep coefficient cache was drained before `advance()` needed
    /// its next entry.
    CacheUnderflow,
}

impl fmt::Display for ConvolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NeedAdvance { container } => {
                write!(
                    f,
                    "{container}: data cannot be read before the pushed \
                     coefficients are fixed with advance()"
                )
            }
            Self::WindowMismatch { kernel, flux } => {
                write!(
                    f,
                    "live-window mismatch: kernel has {kernel} columns, flux has {flux} rows"
                )
            }
            Self::FractureCycleIncomplete {
                cur_frac_id,
                frac_count,
            } => {
                write!(
                    f,
                    "data was not pushed into every fracture \
                     (next push goes to {cur_frac_id} of {frac_count}); cannot convolve safely"
                )
            }
            Self::CacheOverflow { capacity } => {
                write!(f, "coefficient cache is full (capacity {capacity})")
            }
            Self::CacheUnderflow => {
                write!(f, "next cached coefficient matrix is not available")
            }
        }
    }
}

impl Error for ConvolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_container() {
        let err = ConvolveError::NeedAdvance {
            container: "SourceKernel",
        };
        assert!(err.to_string().contains("SourceKernel"));
        assert!(err.to_string().contains("advance()"));
    }

    #[test]
    fn display_reports_both_window_lengths() {
        let err = ConvolveError::WindowMismatch { kernel: 6, flux: 4 };
        let msg = err.to_string();
        assert!(msg.contains('6'));
        assert!(msg.contains('4'));
    }

    #[test]
    fn fracture_cycle_reports_position() {
        let err = ConvolveError::FractureCycleIncomplete {
            cur_frac_id: 2,
            frac_count: 3,
        };
        assert!(err.to_string().contains("2 of 3"));
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn Error> = Box::new(ConvolveError::CacheUnderflow);
        assert!(err.source().is_none());
    }
}
