//! Synthesized declaration model
//!
//! What the synthesizer produces and the renderer consumes. Nothing here knows
//! about annotations; every decision has already been made.

use std::path::PathBuf;

use proc_macro2::{Ident, Span};
use strum::Display;
use syn::{Attribute, Field, Generics, Path, Type};

use crate::parse::{Import, Namespace};

/// Which way a conversion goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Direction {
    /// Model -> derived type.
    ToDerived,
    /// Derived type -> model.
    ToModel,
}

/// Flavour of a cast-like conversion (`From` impl or `Into` call).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CastStyle {
    Explicit,
    Implicit,
}

/// Right-hand side of one field initialiser in a helper transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignedValue {
    /// `source.member`
    Copy,
    /// `From::from(source.member)` or `Into::into(source.member)`
    Cast(CastStyle),
    /// `<owner>::method(source.member)`
    Call { owner: Type, method: Ident },
    /// Empty value for a required member the source side never carries.
    Sentinel,
    /// `Default::default()` for a member that cannot be assigned.
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub member: Ident,
    pub value: AssignedValue,
}

/// A private helper that builds one side from the other, field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperTransform {
    pub name: Ident,
    pub direction: Direction,
    /// One initialiser per field of the target type, in declaration order.
    pub assignments: Vec<Assignment>,
}

impl HelperTransform {
    pub fn assignment(&self, member: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.member == member)
    }
}

/// A member of the derived type implementing a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionMember {
    Helper(HelperTransform),
    /// A `From` impl in `direction`.
    Cast { style: CastStyle, direction: Direction },
    /// An associated function delegating to the helper of `direction`.
    StaticMethod { name: Ident, direction: Direction },
    /// A `self` method rebuilding the model. There is no model -> derived counterpart.
    ReferenceMethod { name: Ident },
}

impl ConversionMember {
    /// Helpers are plumbing; everything else is a user-facing conversion operation.
    pub fn is_operation(&self) -> bool {
        !matches!(self, Self::Helper(_))
    }
}

/// The derived type synthesized for one model.
#[derive(Debug, Clone)]
pub struct DerivedDeclaration {
    pub ident: Ident,
    pub model_name: String,
    /// Absolute path of the model type, without generic arguments.
    pub model_path: Path,
    /// The model type as written in signatures (`crate::models::User<T>`).
    pub model_type: Type,
    pub namespace: Namespace,
    pub generics: Generics,
    pub attrs: Vec<Attribute>,
    /// Copied members, with converted types already substituted.
    pub fields: Vec<Field>,
    pub conversions: Vec<ConversionMember>,
    /// `use` items of the source declaration, before aggregation.
    pub imports: Vec<Import>,
    pub origin: Option<PathBuf>,
    pub span: Span,
}

impl DerivedDeclaration {
    pub fn name(&self) -> String {
        self.ident.to_string()
    }

    /// Number of user-facing conversion operations (helpers excluded).
    pub fn conversion_operations(&self) -> usize {
        self.conversions.iter().filter(|c| c.is_operation()).count()
    }

    pub fn helper(&self, direction: Direction) -> Option<&HelperTransform> {
        self.conversions.iter().find_map(|conversion| match conversion {
            ConversionMember::Helper(helper) if helper.direction == direction => Some(helper),
            _ => None,
        })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.ident.as_ref().is_some_and(|ident| ident == name))
    }
}
