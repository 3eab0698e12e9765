//! Generator configuration.
//!
//! Everything about a generated DTO comes from the markers on the model; this
//! only covers where the output goes and how model types are referenced from it.

use serde::{Deserialize, Serialize};
use syn::Path;
use typed_builder::TypedBuilder;

use crate::error::{DtoGenError, DtoGenResult};
use crate::parse::Namespace;

pub const DEFAULT_RESERVED_NAMESPACE: &str = "crate::dto";
pub const DEFAULT_MODEL_ROOT: &str = "crate";
pub const DEFAULT_OUTPUT_FILE: &str = "dtogen.rs";

/// Configuration for a generation pass.
///
/// # Examples
///
/// ```
/// use dtogen::config::GeneratorConfig;
///
/// // Create with defaults
/// let config = GeneratorConfig::default();
/// assert_eq!(config.output_file, "dtogen.rs");
///
/// // Customize options
/// let config = GeneratorConfig::builder()
///     .reserved_namespace("crate::api::dto")
///     .header(false)
///     .build();
/// assert_eq!(config.model_root, "crate");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder, Serialize, Deserialize)]
#[builder(doc)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Module the generated file is included into; imports pointing into it are never emitted
    #[builder(default = DEFAULT_RESERVED_NAMESPACE.to_owned(), setter(into))]
    pub reserved_namespace: String,

    /// Path prefix under which model types are referenced from generated code
    #[builder(default = DEFAULT_MODEL_ROOT.to_owned(), setter(into))]
    pub model_root: String,

    /// File name written into the output directory
    #[builder(default = DEFAULT_OUTPUT_FILE.to_owned(), setter(into))]
    pub output_file: String,

    /// Prefix the output with an `@generated` banner
    #[builder(default = true)]
    pub header: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GeneratorConfig {
    /// The reserved namespace as absolute path segments (`crate`, `dto`).
    pub fn reserved_segments(&self) -> Vec<String> {
        Namespace::parse(&self.reserved_namespace).absolute_segments()
    }

    pub fn model_root_path(&self) -> DtoGenResult<Path> {
        syn::parse_str(&self.model_root).map_err(|e| DtoGenError::InvalidConfig {
            field: "model_root",
            message: format!("`{}` is not a path: {e}", self.model_root),
        })
    }

    /// Check every field; a pass refuses to start with an invalid configuration.
    pub fn validate(&self) -> DtoGenResult<()> {
        self.model_root_path()?;

        if Namespace::parse(&self.reserved_namespace).is_global() {
            return Err(DtoGenError::InvalidConfig {
                field: "reserved_namespace",
                message: "must name a module below the crate root".to_owned(),
            });
        }

        let output = std::path::Path::new(&self.output_file);
        if self.output_file.is_empty() || output.components().count() != 1 {
            return Err(DtoGenError::InvalidConfig {
                field: "output_file",
                message: format!("`{}` must be a plain file name", self.output_file),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.reserved_namespace, "crate::dto");
        assert_eq!(config.reserved_segments(), ["crate", "dto"]);
        assert!(config.header);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let config = GeneratorConfig::builder().model_root("not a path").build();
        assert!(matches!(
            config.validate(),
            Err(DtoGenError::InvalidConfig { field: "model_root", .. })
        ));

        let config = GeneratorConfig::builder().reserved_namespace("crate").build();
        assert!(config.validate().is_err());

        let config = GeneratorConfig::builder().output_file("../escape.rs").build();
        assert!(config.validate().is_err());
    }
}
