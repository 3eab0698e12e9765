//! Member classification
//!
//! Walks the directly declared fields of a model in source order and decides,
//! per field, what the derived type does with it.

use std::collections::HashSet;

use proc_macro2::{Ident, Span};
use syn::{Field, Fields, ItemStruct, Type, Visibility};

use super::identifier::Identified;
use crate::annotations::schema::validate_ignore;
use crate::annotations::{
    AnnotationKind, AnnotationPayload, AnnotationReader, ConversionStrategy, HasConversionArgs,
    IndirectConversionArgs,
};
use crate::error::{DeclarationErrors, DtoGenError, DtoGenResult, ErrorCollector};
use crate::utils::{attributes::strip_markers, types};

/// What happens to one member in the derived type. Exactly one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Copied as-is.
    Plain,
    /// Dropped from the derived type.
    Ignored,
    /// Type swapped for `converted_type`, value converted with `strategy`.
    DirectConversion {
        converted_type: String,
        strategy: ConversionStrategy,
    },
    /// Type swapped for `converted_type`, value converted by calling `method`
    /// on `converter` (or on the member's own types when there is none).
    IndirectConversion {
        converter: Option<String>,
        method: String,
        converted_type: String,
    },
}

/// One directly declared field of a model.
#[derive(Debug, Clone)]
pub struct ModelMember {
    pub identifier: String,
    /// The field name as written (raw identifiers keep their `r#`).
    pub ident: Ident,
    pub declared_type: Type,
    /// Must be initialised by every constructor of the model.
    pub is_required: bool,
    /// Can be assigned by conversion code.
    pub has_mutator: bool,
    /// Visibility as declared on the model.
    pub visibility: Visibility,
    /// The field with generator markers stripped and visibility made `pub`.
    pub declaration: Field,
    pub classification: Classification,
    pub span: Span,
}

/// Buckets the fields of a model struct.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberClassifier {
    reader: AnnotationReader,
}

impl MemberClassifier {
    pub fn new(reader: AnnotationReader) -> Self {
        Self { reader }
    }

    /// Classify every field of `item`, in source order.
    ///
    /// Errors are collected per member; the model fails with all of them.
    pub fn classify(&self, item: &ItemStruct) -> Result<Vec<ModelMember>, DeclarationErrors> {
        let model = item.identifier().unwrap_or_default();
        let mut errors = ErrorCollector::new(model.as_str());

        let fields = match &item.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unnamed(_) | Fields::Unit => {
                let kind = if matches!(item.fields, Fields::Unit) { "unit" } else { "tuple" };
                errors.add(DtoGenError::InvalidModelDeclaration {
                    model,
                    reason: format!("{kind} structs have no member names; use named fields"),
                    span: item.ident.span(),
                });
                return errors.into_result_with(Vec::new());
            }
        };

        let mut seen = HashSet::new();
        let mut members = Vec::with_capacity(fields.len());
        for field in fields {
            let Some(ident) = field.ident.clone() else {
                continue;
            };
            let identifier = field.identifier().unwrap_or_else(|| ident.to_string());
            if !seen.insert(identifier.clone()) {
                log::warn!("{model}: member `{identifier}` declared twice, keeping the first");
                continue;
            }

            match self.classify_field(&model, field) {
                Ok(classification) => {
                    log::trace!("{model}.{identifier}: {classification:?}");
                    members.push(member(field, ident, identifier, classification));
                }
                Err(error) => errors.add(error),
            }
        }

        errors.into_result_with(members)
    }

    fn classify_field(&self, model: &str, field: &Field) -> DtoGenResult<Classification> {
        let payloads = self.reader.read(field, &AnnotationKind::MEMBER_KINDS)?;

        let ignore = single(&payloads, AnnotationKind::Ignore)?;
        let direct = single(&payloads, AnnotationKind::HasConversion)?;
        let indirect = single(&payloads, AnnotationKind::HasIndirectConversion)?;

        if let Some(payload) = ignore {
            validate_ignore(payload)?;
            return Ok(Classification::Ignored);
        }

        match (direct, indirect) {
            (Some(_), Some(_)) => Err(DtoGenError::ConflictingConversionAnnotations {
                model: model.to_owned(),
                member: field.identifier().unwrap_or_default(),
                span: field.identifier_span(),
            }),
            (Some(payload), None) => {
                let args = HasConversionArgs::from_payload(payload)?;
                Ok(Classification::DirectConversion {
                    converted_type: args.converted_type,
                    strategy: args.strategy,
                })
            }
            (None, Some(payload)) => {
                let args = IndirectConversionArgs::from_payload(payload)?;
                Ok(Classification::IndirectConversion {
                    converter: args.converter,
                    method: args.method,
                    converted_type: args.converted_type,
                })
            }
            (None, None) => Ok(Classification::Plain),
        }
    }
}

/// The payload of `kind`, rejecting a marker repeated on the same member.
fn single(
    payloads: &[AnnotationPayload],
    kind: AnnotationKind,
) -> DtoGenResult<Option<&AnnotationPayload>> {
    let mut matching = payloads.iter().filter(|payload| payload.kind == kind);
    let first = matching.next();
    match matching.next() {
        Some(repeated) => Err(DtoGenError::InvalidAnnotation {
            target: repeated.target.clone(),
            annotation: repeated.name.clone(),
            reason: format!("#[{kind}] given more than once on the same member"),
            span: repeated.span,
        }),
        None => Ok(first),
    }
}

fn member(field: &Field, ident: Ident, identifier: String, classification: Classification) -> ModelMember {
    let mut declaration = field.clone();
    strip_markers(&mut declaration.attrs);
    declaration.vis = Visibility::Public(Default::default());

    ModelMember {
        identifier,
        span: ident.span(),
        ident,
        declared_type: field.ty.clone(),
        is_required: !types::is_option(&field.ty),
        has_mutator: !types::is_phantom(&field.ty),
        visibility: field.vis.clone(),
        declaration,
        classification,
    }
}
