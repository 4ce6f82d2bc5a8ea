//! Camera telemetry types shared by every component.

mod models;

pub use models::*;
