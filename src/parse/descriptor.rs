use std::path::PathBuf;

use proc_macro2::{Ident, Span};
use syn::{Attribute, Generics};

use super::classifier::{Classification, MemberClassifier, ModelMember};
use super::declaration::{Import, ModelDeclaration, Namespace};
use crate::annotations::{AnnotationKind, AnnotationReader, ConversionKind, HasDtoArgs};
use crate::error::{DeclarationErrors, DtoGenError, ErrorCollector};
use crate::utils::attributes::non_marker_attributes;

/// Normalised description of one tagged model. Immutable once built.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub model_name: String,
    pub model_ident: Ident,
    pub derived_name: String,
    pub derived_ident: Ident,
    /// The `[class]` template the derived name came from.
    pub name_template: String,
    pub namespace: Namespace,
    pub conversion: ConversionKind,
    /// Non-ignored members, in source order.
    pub members: Vec<ModelMember>,
    /// Ignored members, in source order. Required ones are reconstructed with a sentinel.
    pub ignored: Vec<ModelMember>,
    pub imports: Vec<Import>,
    /// Struct attributes other than generator markers (`derive`, `serde`, docs).
    pub attrs: Vec<Attribute>,
    pub generics: Generics,
    pub origin: Option<PathBuf>,
    pub span: Span,
}

impl ModelDescriptor {
    /// Build the descriptor of a tagged declaration.
    ///
    /// Fails when the struct carries anything but exactly one `has_dto` marker,
    /// when the marker arguments are invalid, or when any member fails to classify.
    pub fn build(declaration: &ModelDeclaration) -> Result<Self, DeclarationErrors> {
        Self::build_with(declaration, AnnotationReader::new())
    }

    pub fn build_with(
        declaration: &ModelDeclaration,
        reader: AnnotationReader,
    ) -> Result<Self, DeclarationErrors> {
        let item = &declaration.item;
        let model_name = declaration.name();
        let mut errors = ErrorCollector::new(model_name.as_str());

        let args = match reader.read(item, &[AnnotationKind::HasDto]) {
            Ok(payloads) if payloads.len() == 1 => match HasDtoArgs::from_payload(&payloads[0]) {
                Ok(args) => Some(args),
                Err(error) => {
                    errors.add(error);
                    None
                }
            },
            Ok(payloads) => {
                errors.add(DtoGenError::InvalidModelDeclaration {
                    model: model_name.clone(),
                    reason: format!(
                        "expected exactly one #[has_dto] marker, found {}",
                        payloads.len()
                    ),
                    span: payloads.get(1).map_or(item.ident.span(), |p| p.span),
                });
                None
            }
            Err(error) => {
                errors.add(error);
                None
            }
        };

        let derived = args.as_ref().and_then(|args| {
            let derived_name = args.derived_name(&model_name);
            match syn::parse_str::<Ident>(&derived_name) {
                Ok(ident) => Some((derived_name, ident)),
                Err(_) => {
                    errors.add(DtoGenError::InvalidAnnotation {
                        target: model_name.clone(),
                        annotation: AnnotationKind::HasDto.to_string(),
                        reason: format!("derived name `{derived_name}` is not a valid identifier"),
                        span: item.ident.span(),
                    });
                    None
                }
            }
        });

        let classified = match MemberClassifier::new(reader).classify(item) {
            Ok(members) => members,
            Err(member_errors) => {
                errors.extend(member_errors);
                Vec::new()
            }
        };

        let (Some(args), Some((derived_name, derived_ident))) = (args, derived) else {
            return Err(errors.into_errors());
        };

        let (ignored, members): (Vec<_>, Vec<_>) = classified
            .into_iter()
            .partition(|member| member.classification == Classification::Ignored);

        let descriptor = Self {
            model_ident: item.ident.clone(),
            model_name,
            derived_name,
            derived_ident,
            name_template: args.name_template,
            namespace: declaration.namespace.clone(),
            conversion: args.conversion,
            members,
            ignored,
            imports: declaration.imports.clone(),
            attrs: non_marker_attributes(&item.attrs),
            generics: item.generics.clone(),
            origin: declaration.origin.clone(),
            span: item.ident.span(),
        };

        log::debug!(
            "described {} -> {} ({} member(s), {} ignored, {:?})",
            descriptor.model_name,
            descriptor.derived_name,
            descriptor.members.len(),
            descriptor.ignored.len(),
            descriptor.conversion
        );
        errors.into_result_with(descriptor)
    }

    /// Names of ignored members that every model constructor must still initialise.
    pub fn ignored_required_names(&self) -> Vec<&str> {
        self.ignored
            .iter()
            .filter(|member| member.is_required)
            .map(|member| member.identifier.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn build(item: syn::ItemStruct) -> Result<ModelDescriptor, DeclarationErrors> {
        ModelDescriptor::build(&ModelDeclaration::new(item, Namespace::parse("models")))
    }

    #[test]
    fn test_build_descriptor() {
        let descriptor = build(parse_quote! {
            /// A user.
            #[derive(Debug, Clone)]
            #[has_dto(name = "[class]Dto", conversion = StaticMethods)]
            pub struct User {
                pub id: i32,
                pub name: String,
                #[dto_ignore]
                pub secret: String,
                #[dto_ignore]
                pub nickname: Option<String>,
            }
        })
        .unwrap();

        assert_eq!(descriptor.model_name, "User");
        assert_eq!(descriptor.derived_name, "UserDto");
        assert_eq!(descriptor.conversion, ConversionKind::STATIC_METHODS);
        assert_eq!(descriptor.namespace.to_string(), "crate::models");
        assert_eq!(descriptor.members.len(), 2);
        assert_eq!(descriptor.ignored_required_names(), ["secret"]);
        assert_eq!(descriptor.attrs.len(), 2);
    }

    #[test]
    fn test_missing_marker_is_invalid() {
        let errors = build(parse_quote!(struct User { id: i32 })).unwrap_err();
        assert!(matches!(
            errors.errors[0],
            DtoGenError::InvalidModelDeclaration { .. }
        ));
    }

    #[test]
    fn test_two_markers_are_invalid() {
        let errors = build(parse_quote! {
            #[has_dto]
            #[HasDTO(name = "[class]Other")]
            struct User { id: i32 }
        })
        .unwrap_err();
        assert_eq!(errors.declaration, "User");
        assert!(matches!(
            errors.errors[0],
            DtoGenError::InvalidModelDeclaration { .. }
        ));
    }

    #[test]
    fn test_invalid_derived_name() {
        let errors = build(parse_quote! {
            #[has_dto(name = "[class] Dto")]
            struct User { id: i32 }
        })
        .unwrap_err();
        assert!(matches!(errors.errors[0], DtoGenError::InvalidAnnotation { .. }));
    }

    #[test]
    fn test_member_and_marker_errors_are_reported_together() {
        let errors = build(parse_quote! {
            #[has_dto(conversion = Sideways)]
            struct User {
                #[has_conversion(Explicit, "A")]
                #[has_indirect_conversion("convert", "A")]
                a: A,
            }
        })
        .unwrap_err();
        assert_eq!(errors.errors.len(), 2);
    }
}
