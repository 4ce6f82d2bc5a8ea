//! PipeWatch - sewer camera severity monitoring.
//!
//! Scores pipe camera readings on an inverted 1..5 severity scale, rolls
//! them up into fleet health, filters them and summarizes a rolling window
//! of snapshots. The `web` module serves all of it over HTTP.

pub mod camera;
pub mod config;
pub mod feed;
pub mod filter;
pub mod fleet;
pub mod insights;
pub mod severity;
pub mod web;
