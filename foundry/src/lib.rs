//! Deterministic multi-agent refinement loop for CBT exercise drafts.
//!
//! A drafter renders an exercise from a free-text intent, a safety scanner
//! flags risk keywords, a critic applies quality heuristics and a supervisor
//! decides whether to refine again or hand the draft to a human reviewer.
//! The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic agent logic and shared types.
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Configuration, pacing (simulated latency) and report export.
//!
//! [`session`] owns all state, [`looping`] drives refinement cycles and
//! [`commands`] is the boundary a presentation layer talks to.

pub mod agents;
pub mod commands;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use commands::Foundry;
pub use error::CommandError;
