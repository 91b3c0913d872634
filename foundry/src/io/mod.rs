//! Configuration, pacing and report helpers.

pub mod config;
pub mod pacer;
pub mod report;
