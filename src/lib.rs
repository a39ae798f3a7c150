//! vconv - single-job video conversion controller
//!
//! This library crate exposes the controller and configuration loading for
//! the CLI and for integration testing.

pub mod config;
pub mod controller;

pub use controller::{ControllerStats, JobController, JobHandle, ProgressSubscription, Subscription};
