//! Declaration parsing
//!
//! Turns a tagged struct into a normalised [`ModelDescriptor`]:
//!
//! 1. **Identifiers** (`identifier.rs`) - canonical names of structs and fields
//! 2. **Declarations** (`declaration.rs`) - a tagged struct plus where it lives
//!    (namespace, `use` items, source file)
//! 3. **Classifier** (`classifier.rs`) - buckets every field as plain, ignored,
//!    directly converted or indirectly converted
//! 4. **Descriptor** (`descriptor.rs`) - reads the type-level marker and
//!    aggregates the classifier output
//!
//! ```text
//! ModelDeclaration
//!     ↓
//! AnnotationReader (has_dto payload)      MemberClassifier (per field)
//!     ↓                                       ↓
//! ModelDescriptor  ←──────────────────────────┘
//! ```

pub mod classifier;
pub mod declaration;
pub mod descriptor;
pub mod identifier;

pub use classifier::{Classification, MemberClassifier, ModelMember};
pub use declaration::{Import, ModelDeclaration, Namespace};
pub use descriptor::ModelDescriptor;
pub use identifier::Identified;
