//! Report generation.

pub mod generator;

pub use generator::{generate_json_payload, generate_markdown_report, write_output};
