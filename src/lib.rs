//! Recurring habit tasks, stopwatch sessions and time totals.
//!
//! The scheduling and aggregation modules are pure and work on value
//! snapshots; `db` and `cli` are the storage and command line around them.

pub mod aggregate;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod schedule;
pub mod search;
pub mod stopwatch;
pub mod types;
