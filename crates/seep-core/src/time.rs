//! Time policies pacing the simulation clock.
//!
//! A policy holds the pair `(previous_time_real, current_time)` and advances
//! both on [`TimePolicy::set_interval`]. The constant-step policy moves both
//! by a fixed `ht`; the mix-step policy advances `current_time` once per
//! main step while `previous_time_real` walks the small steps underneath.

/// Common interface of the per-regime time policies.
pub trait TimePolicy {
    /// Advance the time pair by one simulation step.
    fn set_interval(&mut self);

    /// The current (end-of-step) simulation time.
    fn current_time(&self) -> f64;

    /// The real time of the previous step boundary.
    fn previous_time_real(&self) -> f64;
}

/// Fixed-increment policy for the ConstStep regime.
///
/// Starts at `previous = -ht`, `current = 0` so that the first
/// `set_interval()` lands the pair on `(0, ht)`.
#[derive(Clone, Debug)]
pub struct ConstStepTime {
    previous_time_real: f64,
    current_time: f64,
    ht: f64,
}

impl ConstStepTime {
    /// Create a policy with time step `ht`.
    pub fn new(ht: f64) -> Self {
        Self {
            previous_time_real: -ht,
            current_time: 0.0,
            ht,
        }
    }

    /// The fixed step size.
    pub fn ht(&self) -> f64 {
        self.ht
    }
}

impl TimePolicy for ConstStepTime {
    fn set_interval(&mut self) {
        self.current_time += self.ht;
        self.previous_time_real += self.ht;
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn previous_time_real(&self) -> f64 {
        self.previous_time_real
    }
}

/// The MainStep regime paces time exactly like ConstStep.
pub type MainStepTime = ConstStepTime;

/// The SmallStep regime paces time exactly like ConstStep.
pub type SmallStepTime = ConstStepTime;

/// Two-scale policy for the MixStep regime.
///
/// `current_time` jumps by `main_step` when a new main step begins;
/// `previous_time_real` advances by `small_step = main_step / n` on every
/// call, where `n` is the number of small steps per main step.
#[derive(Clone, Debug)]
pub struct MixStepTime {
    previous_time_real: f64,
    current_time: f64,
    small_step_nmbr_per_main_step: usize,
    main_step: f64,
    small_step: f64,
    small_step_counter_within_main_step: usize,
}

impl MixStepTime {
    /// Create a policy splitting `main_step` into
    /// `small_step_nmbr_per_main_step` small steps.
    ///
    /// # Panics
    ///
    /// Panics if `small_step_nmbr_per_main_step == 0`.
    pub fn new(small_step_nmbr_per_main_step: usize, main_step: f64) -> Self {
        assert!(
            small_step_nmbr_per_main_step > 0,
            "MixStepTime requires at least one small step per main step"
        );
        Self {
            previous_time_real: 0.0,
            current_time: 0.0,
            small_step_nmbr_per_main_step,
            main_step,
            small_step: main_step / small_step_nmbr_per_main_step as f64,
            small_step_counter_within_main_step: 0,
        }
    }
}

impl TimePolicy for MixStepTime {
    fn set_interval(&mut self) {
        if self.small_step_counter_within_main_step % self.small_step_nmbr_per_main_step == 0 {
            self.current_time += self.main_step;
        }
        self.previous_time_real += self.small_step;

        self.small_step_counter_within_main_step += 1;
        self.small_step_counter_within_main_step %= self.small_step_nmbr_per_main_step;
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn previous_time_real(&self) -> f64 {
        self.previous_time_real
    }
}
