//! # Volley Tracker
//!
//! Team management and match statistics for volleyball clubs.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (stat rows, events, teams, aggregates)
//! - **calculate**: Per-row formulas and team aggregation
//! - **import**: CSV stat sheet parsing and row normalisation
//! - **display**: Column labels and tooltips
//! - **roster**: Matching sheet names to team members
//! - **storage**: Filesystem data store (JSONL)
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod display;
pub mod import;
pub mod models;
pub mod roster;
pub mod storage;

pub use models::*;
