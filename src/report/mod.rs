//! Report rendering and output generation.

pub mod generator;
pub mod renderer;

pub use generator::{generate_html_report, generate_json_report, generate_markdown_report};
pub use renderer::render;
