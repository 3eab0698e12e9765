//! Small helpers shared by the parse and generate stages.

pub mod attributes;
pub mod naming;
pub mod types;
