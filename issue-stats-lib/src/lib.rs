#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for issue-stats
//!
//! This library holds all functionality for the issue-stats tool, a periodic job that
//! reduces each registered package's GitHub activity into rolling-window statistics.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`stats`]: Repository resolution, activity fetching, window aggregation, and persistence

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod commands;
pub mod stats;

pub use crate::commands::{Host, run};
