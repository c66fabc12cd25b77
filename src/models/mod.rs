//! Core data models for the team tracker.

mod event;
mod ids;
mod match_summary;
mod stat_row;
mod stats;
mod team;

pub use event::*;
pub use ids::*;
pub use match_summary::*;
pub use stat_row::*;
pub use stats::*;
pub use team::*;
