//! Wait-time strategies between retries.
//!
//! Every strategy is a pure mapping from the number of retries already
//! performed to the time to wait before the next one. The orchestrator holds
//! them behind [`BackoffStrategy`], so the curve can be replaced without
//! touching the retry decision logic.
//!
//! The exponential defaults are calibrated to two observed points:
//! 1.5 s before the first retry and 7.5 s after two prior retries.

use std::time::Duration;

/// Wait before the first retry of an exponential reason.
pub const EXPONENTIAL_BASE: Duration = Duration::from_millis(1_500);
/// Growth per retry; `base * multiplier^2` lands on 7.5 s.
pub const EXPONENTIAL_MULTIPLIER: f64 = 2.236_067_977_499_79;
/// Upper bound applied to exponential waits by default.
pub const EXPONENTIAL_CAP: Duration = Duration::from_secs(60);
/// Fixed wait used for controlled backoff.
pub const CONTROLLED_WAIT: Duration = Duration::from_secs(1);
/// Linear growth per retry for [`StepBackoff`]; `1.5 s + 2 * 3 s` lands on 7.5 s.
pub const STEP_INCREMENT: Duration = Duration::from_secs(3);

/// Maps the number of retries already performed to a wait duration.
pub trait BackoffStrategy: Send + Sync {
    fn compute_wait(&self, attempt: u32) -> Duration;
}

impl<F> BackoffStrategy for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn compute_wait(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

/// Fixed wait regardless of attempt count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlledBackoff {
    pub wait: Duration,
}

impl ControlledBackoff {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

impl Default for ControlledBackoff {
    fn default() -> Self {
        Self::new(CONTROLLED_WAIT)
    }
}

impl BackoffStrategy for ControlledBackoff {
    fn compute_wait(&self, _attempt: u32) -> Duration {
        self.wait
    }
}

/// Randomisation applied on top of a computed wait.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Jitter {
    /// Wait exactly the computed value.
    #[default]
    None,
    /// Uniform in `[0, wait]`.
    Full,
    /// `wait / 2` plus uniform in `[0, wait / 2]`.
    Equal,
}

impl Jitter {
    fn apply(self, secs: f64) -> f64 {
        match self {
            Self::None => secs,
            Self::Full => fastrand::f64() * secs,
            Self::Equal => secs / 2.0 + fastrand::f64() * (secs / 2.0),
        }
    }
}

/// `base * multiplier^attempt`, optionally capped and jittered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub multiplier: f64,
    pub cap: Option<Duration>,
    pub jitter: Jitter,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, multiplier: f64) -> Self {
        Self {
            base,
            multiplier,
            cap: None,
            jitter: Jitter::None,
        }
    }

    pub fn with_cap(mut self, cap: Duration) -> Self {
        self.cap = Some(cap);
        self
    }

    pub fn without_cap(mut self) -> Self {
        self.cap = None;
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(EXPONENTIAL_BASE, EXPONENTIAL_MULTIPLIER).with_cap(EXPONENTIAL_CAP)
    }
}

impl BackoffStrategy for ExponentialBackoff {
    fn compute_wait(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let mut secs = self.base.as_secs_f64() * self.multiplier.max(1.0).powi(exp);
        if let Some(cap) = self.cap {
            secs = secs.min(cap.as_secs_f64());
        }
        let secs = self.jitter.apply(secs);
        Duration::try_from_secs_f64(secs).unwrap_or(self.cap.unwrap_or(Duration::MAX))
    }
}

/// `base + step * attempt`, optionally capped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepBackoff {
    pub base: Duration,
    pub step: Duration,
    pub cap: Option<Duration>,
}

impl StepBackoff {
    pub fn new(base: Duration, step: Duration) -> Self {
        Self {
            base,
            step,
            cap: None,
        }
    }

    pub fn with_cap(mut self, cap: Duration) -> Self {
        self.cap = Some(cap);
        self
    }
}

impl Default for StepBackoff {
    fn default() -> Self {
        Self::new(EXPONENTIAL_BASE, STEP_INCREMENT)
    }
}

impl BackoffStrategy for StepBackoff {
    fn compute_wait(&self, attempt: u32) -> Duration {
        let wait = self.base.saturating_add(self.step.saturating_mul(attempt));
        match self.cap {
            Some(cap) => wait.min(cap),
            None => wait,
        }
    }
}
