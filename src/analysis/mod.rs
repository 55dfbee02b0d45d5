//! Analysis modules.
//!
//! Column resolution, the chart aggregations and the payload assembler
//! that ties them together.

pub mod aggregator;
pub mod assembler;
pub mod resolver;

pub use assembler::PayloadAssembler;
pub use resolver::ColumnResolver;
