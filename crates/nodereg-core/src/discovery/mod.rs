//! Discovery and validation pipeline
//!
//! Two pure set transforms over [`NodeQuery`](crate::NodeQuery) results:
//!
//! - [`candidates`]: expand a seed list into the union of every seed and
//!   every peer those seeds report
//! - [`liveness`]: keep only candidates that currently report being caught
//!   up with the chain head
//!
//! Both stages fan out their queries concurrently under a shared permit
//! count; order of iteration never affects the result, only latency.

pub mod candidates;
pub mod liveness;

pub use candidates::{discover_candidates, discover_candidates_for_list};
pub use liveness::filter_synced;
