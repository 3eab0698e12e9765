//! Conversion synthesis
//!
//! Turns a [`ModelDescriptor`] into a [`DerivedDeclaration`]: the copied member
//! list with converted types substituted, the two helper transforms, and the
//! conversion operations selected by the model's [`ConversionKind`] flags.

use proc_macro2::Ident;
use syn::{Path, PathSegment, Type, parse_quote};

use super::model::{
    AssignedValue, Assignment, CastStyle, ConversionMember, DerivedDeclaration, Direction,
    HelperTransform,
};
use crate::annotations::{ConversionKind, ConversionStrategy};
use crate::config::GeneratorConfig;
use crate::error::{DeclarationErrors, DtoGenError, DtoGenResult, ErrorCollector};
use crate::parse::{Classification, ModelDescriptor, ModelMember};
use crate::utils::{naming, types};

/// How one member crosses in each direction.
struct MemberPlan {
    ident: Ident,
    to_derived: AssignedValue,
    to_model: AssignedValue,
}

/// Builds derived declarations from descriptors.
#[derive(Debug, Clone)]
pub struct ConversionSynthesizer {
    model_root: Path,
}

impl Default for ConversionSynthesizer {
    fn default() -> Self {
        Self {
            model_root: parse_quote!(crate),
        }
    }
}

impl ConversionSynthesizer {
    pub fn new(model_root: Path) -> Self {
        Self { model_root }
    }

    pub fn from_config(config: &GeneratorConfig) -> DtoGenResult<Self> {
        Ok(Self::new(config.model_root_path()?))
    }

    /// Synthesize the derived type of one model.
    ///
    /// Converter references that do not resolve to a type or function name fail
    /// the member (and with it the model); the other members are still checked.
    pub fn synthesize(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<DerivedDeclaration, DeclarationErrors> {
        let mut errors = ErrorCollector::new(descriptor.model_name.as_str());

        let model_path = match self.model_path(descriptor) {
            Ok(path) => path,
            Err(error) => {
                errors.add(error);
                return Err(errors.into_errors());
            }
        };
        let (_, ty_generics, _) = descriptor.generics.split_for_impl();
        let model_type: Type = parse_quote!(#model_path #ty_generics);

        let mut fields = Vec::with_capacity(descriptor.members.len());
        let mut plans = Vec::with_capacity(descriptor.members.len());
        for member in &descriptor.members {
            match self.plan_member(descriptor, member) {
                Ok((ty, plan)) => {
                    let mut field = member.declaration.clone();
                    if let Some(ty) = ty {
                        field.ty = ty;
                    }
                    fields.push(field);
                    plans.push(plan);
                }
                Err(error) => errors.add(error),
            }
        }

        let conversions = if descriptor.conversion.is_empty() {
            Vec::new()
        } else {
            conversion_members(descriptor, &plans)
        };

        let derived = DerivedDeclaration {
            ident: descriptor.derived_ident.clone(),
            model_name: descriptor.model_name.clone(),
            model_path,
            model_type,
            namespace: descriptor.namespace.clone(),
            generics: descriptor.generics.clone(),
            attrs: descriptor.attrs.clone(),
            fields,
            conversions,
            imports: descriptor.imports.clone(),
            origin: descriptor.origin.clone(),
            span: descriptor.span,
        };

        log::debug!(
            "synthesized {} with {} conversion operation(s)",
            derived.ident,
            derived.conversion_operations()
        );
        errors.into_result_with(derived)
    }

    /// `<model_root>::<namespace>::<Model>`
    fn model_path(&self, descriptor: &ModelDescriptor) -> DtoGenResult<Path> {
        let mut path = self.model_root.clone();
        for segment in descriptor.namespace.segments() {
            let ident = naming::module_ident(segment).ok_or_else(|| DtoGenError::InvalidModelDeclaration {
                model: descriptor.model_name.clone(),
                reason: format!("namespace segment `{segment}` is not a module name"),
                span: descriptor.span,
            })?;
            path.segments.push(PathSegment::from(ident));
        }
        path.segments
            .push(PathSegment::from(descriptor.model_ident.clone()));
        Ok(path)
    }

    /// The derived field type (when it changes) and the per-direction values of one member.
    fn plan_member(
        &self,
        descriptor: &ModelDescriptor,
        member: &ModelMember,
    ) -> DtoGenResult<(Option<Type>, MemberPlan)> {
        let plan = |to_derived, to_model| MemberPlan {
            ident: member.ident.clone(),
            to_derived,
            to_model,
        };

        match &member.classification {
            Classification::Plain | Classification::Ignored if member.has_mutator => {
                Ok((None, plan(AssignedValue::Copy, AssignedValue::Copy)))
            }
            Classification::Plain | Classification::Ignored => {
                Ok((None, plan(AssignedValue::Default, AssignedValue::Default)))
            }
            Classification::DirectConversion {
                converted_type,
                strategy,
            } => {
                let converted = resolve_type(descriptor, member, converted_type, "converted type")?;
                let values = match strategy {
                    ConversionStrategy::Explicit => (
                        AssignedValue::Cast(CastStyle::Explicit),
                        AssignedValue::Cast(CastStyle::Explicit),
                    ),
                    ConversionStrategy::Implicit => (
                        AssignedValue::Cast(CastStyle::Implicit),
                        AssignedValue::Cast(CastStyle::Implicit),
                    ),
                    ConversionStrategy::StaticMethods => {
                        let declared = types::outer_type_name(&member.declared_type)
                            .ok_or_else(|| {
                                unresolved(
                                    descriptor,
                                    member,
                                    "static conversion needs a named declared type".to_owned(),
                                )
                            })?;
                        (
                            AssignedValue::Call {
                                owner: converted.clone(),
                                method: naming::static_to_derived(&descriptor.name_template),
                            },
                            AssignedValue::Call {
                                owner: converted.clone(),
                                method: naming::static_to_model(&declared),
                            },
                        )
                    }
                };
                Ok((Some(converted), plan(values.0, values.1)))
            }
            Classification::IndirectConversion {
                converter,
                method,
                converted_type,
            } => {
                let converted = resolve_type(descriptor, member, converted_type, "converted type")?;
                let method = syn::parse_str::<Ident>(method).map_err(|_| {
                    unresolved(
                        descriptor,
                        member,
                        format!("`{method}` is not a function name"),
                    )
                })?;

                let (derived_owner, model_owner) = match converter {
                    Some(converter) => {
                        let converter = resolve_type(descriptor, member, converter, "converter")?;
                        (converter.clone(), converter)
                    }
                    None => (member.declared_type.clone(), converted.clone()),
                };

                Ok((
                    Some(converted),
                    plan(
                        AssignedValue::Call {
                            owner: derived_owner,
                            method: method.clone(),
                        },
                        AssignedValue::Call {
                            owner: model_owner,
                            method,
                        },
                    ),
                ))
            }
        }
    }
}

fn conversion_members(descriptor: &ModelDescriptor, plans: &[MemberPlan]) -> Vec<ConversionMember> {
    let to_derived = HelperTransform {
        name: naming::to_derived_helper(),
        direction: Direction::ToDerived,
        assignments: plans
            .iter()
            .map(|plan| Assignment {
                member: plan.ident.clone(),
                value: plan.to_derived.clone(),
            })
            .collect(),
    };

    // The derived side never carries ignored members: required ones get the
    // sentinel, optional ones their default.
    let ignored = descriptor.ignored.iter().map(|member| Assignment {
        member: member.ident.clone(),
        value: if member.is_required {
            AssignedValue::Sentinel
        } else {
            AssignedValue::Default
        },
    });
    let to_model = HelperTransform {
        name: naming::to_model_helper(),
        direction: Direction::ToModel,
        assignments: plans
            .iter()
            .map(|plan| Assignment {
                member: plan.ident.clone(),
                value: plan.to_model.clone(),
            })
            .chain(ignored)
            .collect(),
    };

    let mut conversions = vec![
        ConversionMember::Helper(to_derived),
        ConversionMember::Helper(to_model),
    ];

    let kind = descriptor.conversion;
    for (flag, style) in [
        (ConversionKind::EXPLICIT, CastStyle::Explicit),
        (ConversionKind::IMPLICIT, CastStyle::Implicit),
    ] {
        if kind.contains(flag) {
            for direction in [Direction::ToDerived, Direction::ToModel] {
                conversions.push(ConversionMember::Cast { style, direction });
            }
        }
    }

    if kind.contains(ConversionKind::STATIC_METHODS) {
        conversions.push(ConversionMember::StaticMethod {
            name: naming::static_to_derived(&descriptor.name_template),
            direction: Direction::ToDerived,
        });
        conversions.push(ConversionMember::StaticMethod {
            name: naming::static_to_model(&descriptor.model_name),
            direction: Direction::ToModel,
        });
    }

    if kind.contains(ConversionKind::REFERENCE_METHODS) {
        conversions.push(ConversionMember::ReferenceMethod {
            name: naming::reference_to_model(&descriptor.model_name),
        });
    }

    conversions
}

fn resolve_type(
    descriptor: &ModelDescriptor,
    member: &ModelMember,
    text: &str,
    what: &str,
) -> DtoGenResult<Type> {
    if text.trim().is_empty() {
        return Err(unresolved(descriptor, member, format!("{what} is empty")));
    }
    syn::parse_str::<Type>(text)
        .map_err(|_| unresolved(descriptor, member, format!("{what} `{text}` is not a type")))
}

fn unresolved(descriptor: &ModelDescriptor, member: &ModelMember, reason: String) -> DtoGenError {
    DtoGenError::UnresolvedConverter {
        model: descriptor.model_name.clone(),
        member: member.identifier.clone(),
        reason,
        span: member.span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{ModelDeclaration, Namespace};
    use syn::ItemStruct;

    fn synthesize(item: ItemStruct) -> Result<DerivedDeclaration, DeclarationErrors> {
        let declaration = ModelDeclaration::new(item, Namespace::parse("models"));
        let descriptor = ModelDescriptor::build(&declaration).unwrap();
        ConversionSynthesizer::default().synthesize(&descriptor)
    }

    fn with_kind(kind: &str) -> DerivedDeclaration {
        let kind: syn::Expr = syn::parse_str(kind).unwrap();
        synthesize(parse_quote! {
            #[has_dto(conversion = #kind)]
            struct User { id: u64 }
        })
        .unwrap()
    }

    #[test]
    fn test_operation_counts_follow_flags() {
        assert_eq!(with_kind("Explicit | Implicit").conversion_operations(), 4);
        assert_eq!(with_kind("StaticMethods").conversion_operations(), 2);
        assert_eq!(with_kind("ReferenceMethods").conversion_operations(), 1);
        assert_eq!(with_kind("Explicit").conversion_operations(), 2);
        assert_eq!(with_kind("15").conversion_operations(), 7);
    }

    #[test]
    fn test_none_emits_no_conversions() {
        let derived = with_kind("None");
        assert!(derived.conversions.is_empty());
        assert_eq!(derived.fields.len(), 1);
    }

    #[test]
    fn test_ignored_required_member_gets_sentinel_only_towards_model() {
        let derived = synthesize(parse_quote! {
            #[has_dto(name = "[class]Dto", conversion = StaticMethods)]
            struct User {
                id: i32,
                name: String,
                #[dto_ignore]
                secret: String,
                #[dto_ignore]
                nickname: Option<String>,
            }
        })
        .unwrap();

        assert_eq!(derived.name(), "UserDto");
        assert!(derived.field("secret").is_none());

        let to_derived = derived.helper(Direction::ToDerived).unwrap();
        assert!(to_derived.assignment("secret").is_none());
        assert_eq!(to_derived.assignments.len(), 2);

        let to_model = derived.helper(Direction::ToModel).unwrap();
        assert_eq!(to_model.assignment("id").unwrap().value, AssignedValue::Copy);
        assert_eq!(
            to_model.assignment("secret").unwrap().value,
            AssignedValue::Sentinel
        );
        assert_eq!(
            to_model.assignment("nickname").unwrap().value,
            AssignedValue::Default
        );

        let names: Vec<_> = derived
            .conversions
            .iter()
            .filter_map(|c| match c {
                ConversionMember::StaticMethod { name, .. } => Some(name.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["to_dto", "to_user"]);
    }

    #[test]
    fn test_indirect_conversion_with_external_converter() {
        let derived = synthesize(parse_quote! {
            #[has_dto]
            struct Post {
                #[has_indirect_conversion(TagConverter, "convert", "Vec<TagDto>")]
                tags: Vec<String>,
            }
        })
        .unwrap();

        let field = derived.field("tags").unwrap();
        assert_eq!(crate::annotations::reader::type_name(&field.ty), "Vec<TagDto>");

        let converter: Type = parse_quote!(TagConverter);
        for direction in [Direction::ToDerived, Direction::ToModel] {
            let assignment = derived.helper(direction).unwrap().assignment("tags").unwrap();
            assert_eq!(
                assignment.value,
                AssignedValue::Call {
                    owner: converter.clone(),
                    method: parse_quote!(convert),
                }
            );
        }
    }

    #[test]
    fn test_indirect_conversion_on_member_types() {
        let derived = synthesize(parse_quote! {
            #[has_dto]
            struct Post {
                #[has_indirect_conversion("convert_tags", type_of(Vec<TagDto>))]
                tags: Vec<Tag>,
            }
        })
        .unwrap();

        let owner = |direction| match &derived.helper(direction).unwrap().assignments[0].value {
            AssignedValue::Call { owner, .. } => crate::annotations::reader::type_name(owner),
            other => panic!("expected a call, got {other:?}"),
        };
        assert_eq!(owner(Direction::ToDerived), "Vec<Tag>");
        assert_eq!(owner(Direction::ToModel), "Vec<TagDto>");
    }

    #[test]
    fn test_static_member_conversion_names() {
        let derived = synthesize(parse_quote! {
            #[has_dto(name = "[class]Dto")]
            struct User {
                #[has_conversion(StaticMethods, "AddressDto")]
                address: Address,
            }
        })
        .unwrap();

        let method = |direction| match &derived.helper(direction).unwrap().assignments[0].value {
            AssignedValue::Call { method, .. } => method.to_string(),
            other => panic!("expected a call, got {other:?}"),
        };
        assert_eq!(method(Direction::ToDerived), "to_dto");
        assert_eq!(method(Direction::ToModel), "to_address");
    }

    #[test]
    fn test_phantom_member_is_defaulted() {
        let derived = synthesize(parse_quote! {
            #[has_dto]
            struct Tagged<T> {
                id: u64,
                marker: PhantomData<T>,
            }
        })
        .unwrap();

        assert_eq!(crate::annotations::reader::type_name(&derived.model_type), "crate::models::Tagged<T>");
        let to_derived = derived.helper(Direction::ToDerived).unwrap();
        assert_eq!(
            to_derived.assignment("marker").unwrap().value,
            AssignedValue::Default
        );
    }

    #[test]
    fn test_unresolvable_converter_is_reported_per_member() {
        let errors = synthesize(parse_quote! {
            #[has_dto]
            struct Post {
                #[has_indirect_conversion("Tag Converter", "convert", "Vec<TagDto>")]
                tags: Vec<Tag>,
                #[has_conversion(Explicit, "Vec<")]
                other: Vec<u8>,
                #[has_indirect_conversion("not a fn", "u8")]
                third: u8,
            }
        })
        .unwrap_err();

        assert_eq!(errors.errors.len(), 3);
        assert!(errors
            .errors
            .iter()
            .all(|e| matches!(e, DtoGenError::UnresolvedConverter { .. })));
    }
}
