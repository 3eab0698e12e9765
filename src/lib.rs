//! # dtogen
//!
//! Build-time generator for transfer (DTO) types. Mark a model struct with
//! `#[has_dto]` and dtogen derives a paired struct mirroring its fields, plus
//! conversion routines in both directions.
//!
//! ## Features
//!
//! - **Per-member overrides**: drop members (`#[dto_ignore]`), swap their type
//!   (`#[has_conversion]`) or delegate to a converter (`#[has_indirect_conversion]`)
//! - **Combinable conversions**: `From` impls, static `to_*` functions and an
//!   `into_*` method, selected with flags
//! - **Batch isolation**: a broken model is reported and skipped, the rest of
//!   the crate still gets its DTOs
//! - **Deterministic output**: identical sources give byte-identical files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! // src/models.rs
//! use dtogen_macros::has_dto;
//!
//! #[has_dto(name = "[class]Dto", conversion = StaticMethods | Explicit)]
//! #[derive(Debug, Clone)]
//! pub struct User {
//!     pub id: u64,
//!     pub name: String,
//!     #[dto_ignore]
//!     pub password_hash: String,
//! }
//!
//! // build.rs
//! fn main() -> anyhow::Result<()> {
//!     let report = dtogen::generate_from_dir("src", std::env::var("OUT_DIR")?, &Default::default())?;
//!     dtogen::emit_cargo_directives(&report);
//!     Ok(())
//! }
//!
//! // src/lib.rs
//! pub mod models;
//! pub mod dto {
//!     include!(concat!(env!("OUT_DIR"), "/dtogen.rs"));
//! }
//!
//! let dto = dto::models::UserDto::to_dto(user);
//! let user = dto::models::UserDto::to_user(dto); // password_hash is empty again
//! ```

pub mod annotations;
pub mod config;
pub mod discovery;
pub mod error;
pub mod generate;
pub mod host;
pub mod orchestrator;
pub mod parse;
pub mod utils;

pub use annotations::{AnnotationKind, ConversionKind, ConversionStrategy};
pub use config::GeneratorConfig;
pub use error::{DeclarationErrors, Diagnostic, DtoGenError, DtoGenResult, Severity};
pub use generate::{DerivedDeclaration, SynthesizedUnit};
pub use host::{BuildReport, emit_cargo_directives, generate_from_dir, write_cargo_directives};
pub use orchestrator::{GenerationOutput, Generator};
pub use parse::{Import, ModelDeclaration, ModelDescriptor, Namespace};

