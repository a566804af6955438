//! Reusable "pollable resource": a recurring fetch plus an explicit
//! enable/disable gate plus a single in-flight guard.
//!
//! Every page that keeps server data fresh on a timer mounts one of these
//! instead of managing its own interval.

pub mod resource;
pub mod stats;

pub use resource::{Fetch, FnFetch, PollPhase, PollableResource, ResourceState, Trigger};
pub use stats::{PollerStats, PollerStatsSnapshot};
