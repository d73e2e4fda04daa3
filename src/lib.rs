//! Resilient data service for BCRA statistics, the debtor registry and
//! Argentine fixed-income analytics.
//!
//! The [`bcra`] module carries the full fetch pipeline (cache, breaker,
//! rate limit, retry, fallback); [`markets`] covers the friendlier market
//! data feeds; [`analytics`] derives the yield, carry, inflation and
//! dual-bond tables from both; [`api`] exposes everything over HTTP.

pub mod analytics;
pub mod api;
pub mod bcra;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod markets;
pub mod metrics;
pub mod resilience;
pub mod warm;
