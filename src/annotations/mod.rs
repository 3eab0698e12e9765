//! Generator marker attributes
//!
//! This module knows which attributes belong to the generator and how their
//! arguments are read:
//!
//! 1. **Registry** (this file) - maps every accepted spelling to its logical
//!    [`AnnotationKind`], built once per process
//! 2. **Reader** (`reader.rs`) - extracts [`AnnotationPayload`]s from a
//!    declaration and reduces every argument to a [`ConstValue`]
//! 3. **Schemas** (`schema.rs`) - binds payloads to named parameters and
//!    turns them into typed marker arguments
//!
//! ```text
//! #[has_conversion(StaticMethods, "AddressDto")]
//!     ↓ registry lookup (last path segment, optional `_attribute` suffix)
//! AnnotationKind::HasConversion
//!     ↓ reader
//! AnnotationPayload { positional: [(0, Variants[StaticMethods]), (1, Str("AddressDto"))] }
//!     ↓ schema binding
//! HasConversionArgs { strategy: StaticMethods, converted_type: "AddressDto" }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use heck::ToUpperCamelCase;
use proc_macro2::Span;
use strum::{Display, EnumIter, IntoEnumIterator};
use syn::{Attribute, Path};

pub mod reader;
pub mod schema;

pub use reader::{Annotated, AnnotationReader};
pub use schema::{
    ConversionKind, ConversionStrategy, HasConversionArgs, HasDtoArgs, IndirectConversionArgs,
};

/// The logical markers the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum AnnotationKind {
    #[strum(serialize = "has_dto")]
    HasDto,
    #[strum(serialize = "dto_ignore")]
    Ignore,
    #[strum(serialize = "has_conversion")]
    HasConversion,
    #[strum(serialize = "has_indirect_conversion")]
    HasIndirectConversion,
}

impl AnnotationKind {
    /// Markers that may appear on a member.
    pub const MEMBER_KINDS: [AnnotationKind; 3] = [
        AnnotationKind::Ignore,
        AnnotationKind::HasConversion,
        AnnotationKind::HasIndirectConversion,
    ];

    /// Spellings accepted for this kind besides the snake-case and camel-case forms.
    fn legacy_spellings(self) -> &'static [&'static str] {
        match self {
            AnnotationKind::HasDto => &["HasDTO"],
            AnnotationKind::Ignore => &["DTOIgnore"],
            AnnotationKind::HasConversion | AnnotationKind::HasIndirectConversion => &[],
        }
    }

    /// Every bare spelling of this kind, without the optional suffix.
    pub fn spellings(self) -> Vec<String> {
        let snake = self.to_string();
        let camel = snake.to_upper_camel_case();
        let mut spellings = vec![snake, camel];
        spellings.extend(self.legacy_spellings().iter().map(|s| (*s).to_owned()));
        spellings
    }
}

/// Canonical mapping from accepted attribute spelling to logical kind.
#[derive(Debug)]
pub struct AnnotationRegistry {
    spellings: HashMap<String, AnnotationKind>,
}

static REGISTRY: LazyLock<AnnotationRegistry> = LazyLock::new(AnnotationRegistry::build);

impl AnnotationRegistry {
    fn build() -> Self {
        let mut spellings = HashMap::new();
        for kind in AnnotationKind::iter() {
            for bare in kind.spellings() {
                let suffix = if bare.contains('_') || bare.chars().all(|c| c.is_lowercase()) {
                    "_attribute"
                } else {
                    "Attribute"
                };
                spellings.insert(format!("{bare}{suffix}"), kind);
                spellings.insert(bare, kind);
            }
        }
        Self { spellings }
    }

    /// The process-wide registry.
    pub fn global() -> &'static AnnotationRegistry {
        &REGISTRY
    }

    /// Resolve a single spelling.
    pub fn lookup(&self, name: &str) -> Option<AnnotationKind> {
        self.spellings.get(name).copied()
    }

    /// Resolve an attribute path by its last segment (`dtogen_macros::has_dto` → `HasDto`).
    pub fn resolve_path(&self, path: &Path) -> Option<AnnotationKind> {
        path.segments
            .last()
            .and_then(|segment| self.lookup(&segment.ident.to_string()))
    }

    pub fn resolve(&self, attr: &Attribute) -> Option<AnnotationKind> {
        self.resolve_path(attr.path())
    }

    /// Whether the attribute is one of the generator's own markers.
    pub fn is_generator_attribute(&self, attr: &Attribute) -> bool {
        self.resolve(attr).is_some()
    }
}

/// A compile-time constant argument value.
///
/// Has no null variant: an argument either resolves to a constant or is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    Str(String),
    Int(i128),
    Bool(bool),
    /// One or more bare paths (`Explicit`, `conv::TagConverter`), several when
    /// combined with `|`.
    Variants(Vec<String>),
    /// Normalised textual name of a `type_of(..)` argument.
    TypeName(String),
}

impl ConstValue {
    /// Text of a string-like value (string literal or type name).
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConstValue::Str(s) | ConstValue::TypeName(s) => Some(s),
            _ => None,
        }
    }

    /// Last path segment of each variant (`ConversionKind::Explicit` -> `Explicit`).
    pub fn variant_names(&self) -> Option<Vec<&str>> {
        match self {
            ConstValue::Variants(paths) => Some(
                paths
                    .iter()
                    .map(|path| path.rsplit("::").next().unwrap_or(path).trim())
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ConstValue::Str(_) => "string",
            ConstValue::Int(_) => "integer",
            ConstValue::Bool(_) => "bool",
            ConstValue::Variants(_) => "enum constant",
            ConstValue::TypeName(_) => "type",
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Str(s) => write!(f, "{s:?}"),
            ConstValue::Int(i) => write!(f, "{i}"),
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Variants(names) => f.write_str(&names.join(" | ")),
            ConstValue::TypeName(name) => write!(f, "type_of({name})"),
        }
    }
}

/// Normalised marker found on a declaration.
#[derive(Debug, Clone)]
pub struct AnnotationPayload {
    pub kind: AnnotationKind,
    /// The spelling as written (last path segment).
    pub name: String,
    /// Identifier of the declaration carrying the marker.
    pub target: String,
    pub positional: Vec<(usize, ConstValue)>,
    pub named: BTreeMap<String, ConstValue>,
    pub span: Span,
}

impl AnnotationPayload {
    pub fn arg_count(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn positional(&self, index: usize) -> Option<&ConstValue> {
        self.positional
            .iter()
            .find(|(i, _)| *i == index)
            .map(|(_, value)| value)
    }

    pub fn named(&self, name: &str) -> Option<&ConstValue> {
        self.named.get(name)
    }
}
