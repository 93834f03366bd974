//! services/learner/src/lib.rs
//!
//! The library half of the `learner` client. The binary in `src/bin` is a thin
//! terminal host over these modules.

pub mod adapters;
pub mod config;
pub mod error;
pub mod workspace;
