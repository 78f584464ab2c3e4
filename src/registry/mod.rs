//! Agent registry loading.
//!
//! The registry is read once per session and never fails: any problem
//! with the document yields the built-in fallback roster.

pub mod loader;

pub use loader::load_registry;
