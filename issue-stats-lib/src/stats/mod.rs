//! Rolling-window issue statistics for registered packages
//!
//! This module turns each package's repository activity into four snapshots of
//! open/closed issue and open/merged pull request counts, one per trailing window.
//!
//! # Implementation Model
//!
//! The pipeline for one package is:
//!
//! 1. [`RepoRef::resolve`] turns the declared repository URL into an owner/name pair
//! 2. [`CredentialLookup`] supplies the developer's provider token
//! 3. [`ActivitySource`] fetches every item updated within the widest window
//! 4. [`aggregate`] classifies the items and counts them into nested [`Windows`]
//! 5. [`SnapshotStore`] upserts one row per window
//!
//! [`JobRunner`] drives this for every package from the [`PackageRegistry`] and records
//! a [`PackageOutcome`] for each one, so a failing package never affects the others.
//!
//! [`Database`] provides SQLite-backed implementations of the registry, credential
//! store, and snapshot store.

mod activity_item;
mod aggregator;
mod credentials;
mod database;
pub mod hosting;
mod job;
mod registry;
mod repo_ref;
mod store;
mod window;

pub use activity_item::{ActivityItem, ItemState, PullRequestMarker};
pub use aggregator::{Counter, WindowCounts, WindowTotals, aggregate};
pub use credentials::CredentialLookup;
pub use database::Database;
pub use hosting::{ActivitySource, GitHubFetcher};
pub use job::{JobReport, JobRunner, PackageOutcome, SkipReason};
pub use registry::{Package, PackageRegistry};
pub use repo_ref::RepoRef;
pub use store::{SnapshotStore, StatSnapshot};
pub use window::{Window, Windows};
