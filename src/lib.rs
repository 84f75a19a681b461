//! ghpd crate
//!
//! Productivity analytics over a public GitHub activity feed. The crate pages through a user's
//! public events, classifies them into contribution categories, folds them into a fixed daily
//! window and serves the resulting metrics through a bounded, time-expiring cache.
//!
//! # Module Organization
//!
//! - [`feed`]: HTTP access to the activity feed (retrying fetcher, paginator, event schema)
//! - [`metrics`]: Window construction, event classification and metric aggregation
//! - [`store`]: Key/value storage capability plus the analytics cache built on it
//! - [`router`]: Request validation and orchestration of the whole pipeline
//! - [`config`]: Tunables loaded from a TOML file
//! - [`clock`]: Injectable time source

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod clock;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod router;
pub mod store;

#[doc(hidden)]
pub mod commands;
