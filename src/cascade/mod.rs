//! The agent cascade.
//!
//! One run collects a result from every registry agent, a free-text
//! summary and a retrieval snippet. Every backend failure is replaced by a
//! substitute value; only an unready primary agent stops the run.

pub mod aggregator;

pub use aggregator::{Cascade, CascadeOptions};
