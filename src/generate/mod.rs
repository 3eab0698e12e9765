//! Code generation
//!
//! 1. **Model** (`model.rs`) - the synthesized declaration model
//! 2. **Synthesis** (`synthesis.rs`) - descriptor -> derived declaration, once
//!    `access.rs` has checked the members are reachable from the output
//! 3. **Grouping** (`grouping.rs`) - derived declarations -> one unit per namespace
//! 4. **Render** (`render.rs`) - units -> Rust source
//!
//! ```text
//! ModelDescriptor
//!     ↓ ConversionSynthesizer
//! DerivedDeclaration
//!     ↓ NamespaceGrouper / ImportAggregator
//! SynthesizedUnit
//!     ↓ Renderer
//! dtogen.rs
//! ```

pub mod access;
pub mod grouping;
pub mod model;
pub mod render;
pub mod synthesis;

pub use access::AccessChecker;
pub use grouping::{Grouped, ImportAggregator, NamespaceGrouper, SynthesizedUnit};
pub use model::{
    AssignedValue, Assignment, CastStyle, ConversionMember, DerivedDeclaration, Direction,
    HelperTransform,
};
pub use render::Renderer;
pub use synthesis::ConversionSynthesizer;
