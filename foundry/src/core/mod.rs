//! Deterministic, pure logic for the refinement core.
//!
//! Core modules must be free of I/O side effects. Each agent is a function of
//! its inputs (plus static rules) and returns values suitable for tests.

pub mod critic;
pub mod drafter;
pub mod safety;
pub mod supervisor;
pub mod types;
