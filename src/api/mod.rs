//! Pipeline API boundary.

pub mod client;

pub use client::PipelineClient;
