//! Client library for the load-forecast pipeline.
//!
//! Uploads a load-profile file, tracks the resulting server-side job by
//! polling, and aggregates the computed artifacts (quality report and
//! forecast vector) once the job completes.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
