//! Data models shared across the pipeline.

pub mod config;
pub mod result;
