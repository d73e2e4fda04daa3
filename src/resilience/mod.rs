//! # Resilience Module
//!
//! Reusable protection for the upstream fetch pipeline.
//!
//! ## Components
//! - `CircuitBreaker`: blocks requests after a threshold of consecutive
//!   failures, then recovers through a single probe call.
//! - `UpstreamGate`: token-bucket admission control keeping the process
//!   under the upstream's tolerated request rate.

pub mod circuit_breaker;
pub mod rate_limit;

// Re-export for convenience
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use rate_limit::UpstreamGate;
