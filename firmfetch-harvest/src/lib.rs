//! Collection pipeline: pick an OS filter, find package links, fetch them.
//!
//! - [`catalog`]: the OS targets to visit
//! - [`select`]: driving the OS filter on the drivers page
//! - [`scan`]: link discovery and the fallback inventory
//! - [`plan`]: mapping URLs to files under `downloads/<OS-name>/`
//! - [`prompt`]: the yes/no question asked when nothing matched
//! - [`report`]: console progress and the final summary
//! - [`collector`]: the sequential run loop tying it together
pub mod catalog;
pub mod collector;
pub mod plan;
pub mod prompt;
pub mod report;
pub mod scan;
pub mod select;

pub use collector::Collector;
pub use report::{Console, RunSummary, Tally};
