//! Finds out the externally visible address of this machine by asking many
//! independent lookup services at once and returning as soon as enough of
//! them answered.
//!
//! ```no_run
//! # async fn example() -> anyhow::Result<()> {
//! use std::time::Duration;
//! use ipquorum::{ConfidenceTarget, Manager};
//!
//! let manager = Manager::builtin()?;
//! let target: ConfidenceTarget = "3".parse()?;
//!
//! for group in manager.fetch_strict(target, Duration::from_secs(10)).await? {
//!     println!("{group}");
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod grouping;
mod manager;
mod race;
mod target;

pub mod catalog;
pub mod probe;

use {anyhow::Result, std::time::Duration};

pub use crate::{
    catalog::{Catalog, CatalogEntry, EndpointRef, Provider, ResponseShape},
    error::{FetchError, FetchResult},
    grouping::{ResultGroup, group},
    manager::Manager,
    probe::{HttpProbe, Probe, ProbeError, ProbeOutcome},
    target::{ConfidenceTarget, ConfidenceTargetError},
};

/// Races every built-in provider and returns the grouped answers,
/// failing if none of them answered.
pub async fn resolve(target: ConfidenceTarget, timeout: Duration) -> Result<Vec<ResultGroup>> {
    Manager::builtin()?.fetch_strict(target, timeout).await
}
