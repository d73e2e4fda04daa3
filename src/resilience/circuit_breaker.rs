//! # Circuit Breaker Pattern
//!
//! Prevents hammering a failing upstream by temporarily refusing calls,
//! giving the remote side time to recover.
//!
//! ## States
//! - **Closed**: Normal operation, requests pass through.
//! - **Open**: Requests are refused after `failure_threshold` consecutive failures.
//! - **HalfOpen**: After `reset_timeout`, exactly one probe request is admitted;
//!   its outcome decides between Closed and Open.
//!
//! ## Concurrency
//! All state lives in atomics; `is_open()` never takes a lock, so it is safe
//! to call from every request path concurrently.
//!
//! ## Usage
//! ```ignore
//! let breaker = CircuitBreaker::new(5, Duration::from_secs(60));
//!
//! if breaker.is_open() {
//!     return Err(FetchError::CircuitOpen);
//! }
//!
//! match do_upstream_call().await {
//!     Ok(_) => breaker.record_success(),
//!     Err(_) => breaker.record_failure(),
//! }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;
use tracing::warn;

/// State of the circuit breaker (encoded as u32 for atomic operations).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CircuitState {
    /// Normal operation - requests pass through
    Closed = 0,
    /// Refusing requests due to recent failures
    Open = 1,
    /// Cool-down elapsed, probing for recovery
    HalfOpen = 2,
}

impl CircuitState {
    fn from_u32(v: u32) -> Self {
        match v {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed, // Default to closed for safety
        }
    }

    /// Human-readable name used by the health endpoint and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Lock-free circuit breaker guarding the upstream API.
///
/// Consecutive failures trip the breaker; while open, `is_open()` answers
/// `true` without touching the network. Once the reset timeout has elapsed
/// since the last failure, a single probe call is let through: success
/// closes the circuit, failure re-opens it for another full cool-down.
pub struct CircuitBreaker {
    /// Current state: 0=Closed, 1=Open, 2=HalfOpen
    state: AtomicU32,
    /// Consecutive failure count
    failure_count: AtomicU32,
    /// Last failure time as nanoseconds since `creation_time`
    last_failure_nanos: AtomicU64,
    /// Whether the half-open probe slot is taken
    probe_taken: AtomicBool,
    /// Reference time point for computing elapsed time
    creation_time: Instant,
    /// Number of consecutive failures to trip the breaker (immutable after construction)
    failure_threshold: u32,
    /// Cool-down in nanoseconds before a probe is admitted (immutable after construction)
    reset_timeout_nanos: u64,
}

impl CircuitBreaker {
    /// Creates a new breaker.
    ///
    /// # Arguments
    /// * `failure_threshold` - Consecutive failures that trip the breaker.
    /// * `reset_timeout` - Cool-down before a recovery probe is admitted.
    pub fn new(failure_threshold: u32, reset_timeout: std::time::Duration) -> Self {
        Self {
            state: AtomicU32::new(CircuitState::Closed as u32),
            failure_count: AtomicU32::new(0),
            last_failure_nanos: AtomicU64::new(0),
            probe_taken: AtomicBool::new(false),
            creation_time: Instant::now(),
            failure_threshold,
            reset_timeout_nanos: reset_timeout.as_nanos() as u64,
        }
    }

    #[inline]
    fn elapsed_nanos(&self) -> u64 {
        self.creation_time.elapsed().as_nanos() as u64
    }

    /// Current state. Lock-free read.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u32(self.state.load(Ordering::Acquire))
    }

    /// Current consecutive failure count. Lock-free read.
    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Acquire)
    }

    /// Records a successful call, closing the circuit and clearing the count.
    pub fn record_success(&self) {
        self.state
            .store(CircuitState::Closed as u32, Ordering::Release);
        self.failure_count.store(0, Ordering::Release);
        self.probe_taken.store(false, Ordering::Release);
    }

    /// Records a failed call.
    ///
    /// In Closed state the breaker trips once the threshold is reached. In
    /// HalfOpen state the failed probe re-opens the circuit immediately,
    /// starting a fresh cool-down.
    pub fn record_failure(&self) {
        let new_count = self.failure_count.fetch_add(1, Ordering::AcqRel) + 1;

        self.last_failure_nanos
            .store(self.elapsed_nanos(), Ordering::Release);

        let current = self.state.load(Ordering::Acquire);

        if current == CircuitState::HalfOpen as u32 {
            if self
                .state
                .compare_exchange(
                    CircuitState::HalfOpen as u32,
                    CircuitState::Open as u32,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                warn!("circuit breaker probe failed, circuit re-opened");
            }
            return;
        }

        if new_count >= self.failure_threshold && current != CircuitState::Open as u32 {
            // CAS so only one thread logs the trip
            if self
                .state
                .compare_exchange(
                    current,
                    CircuitState::Open as u32,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                warn!(
                    failures = new_count,
                    "circuit breaker tripped to OPEN"
                );
            }
        }
    }

    /// Whether the circuit currently refuses calls.
    ///
    /// Returns `false` for Closed, and for the single caller that wins the
    /// half-open probe slot; every other caller sees `true` until the probe
    /// outcome is recorded. Transitions Open to HalfOpen lazily once the
    /// cool-down has elapsed.
    #[inline]
    pub fn is_open(&self) -> bool {
        match self.state.load(Ordering::Acquire) {
            0 => false, // Closed
            2 => self.probe_refused(),
            1 => {
                let last_failure = self.last_failure_nanos.load(Ordering::Acquire);
                let elapsed = self.elapsed_nanos().saturating_sub(last_failure);

                if elapsed > self.reset_timeout_nanos {
                    // Cool-down elapsed; one thread wins the CAS and frees
                    // the probe slot for this recovery round.
                    if self
                        .state
                        .compare_exchange(
                            CircuitState::Open as u32,
                            CircuitState::HalfOpen as u32,
                            Ordering::AcqRel,
                            Ordering::Acquire,
                        )
                        .is_ok()
                    {
                        self.probe_taken.store(false, Ordering::Release);
                    }
                    self.probe_refused()
                } else {
                    true // Still open, refuse traffic
                }
            }
            _ => true, // Unknown state, be conservative and refuse
        }
    }

    /// Try to take the half-open probe slot. Returns `true` (refused) when
    /// another caller already holds it.
    fn probe_refused(&self) -> bool {
        if self
            .probe_taken
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return false;
        }
        // The probe may have already closed the circuit; let traffic flow
        // instead of refusing on the stale slot flag.
        self.state.load(Ordering::Acquire) != CircuitState::Closed as u32
    }

    /// Resets the breaker to its initial closed state.
    pub fn reset(&self) {
        self.state
            .store(CircuitState::Closed as u32, Ordering::Release);
        self.failure_count.store(0, Ordering::Release);
        self.last_failure_nanos.store(0, Ordering::Release);
        self.probe_taken.store(false, Ordering::Release);
    }
}
