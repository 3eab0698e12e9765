//! Typed marker arguments
//!
//! Payloads are bound against a named-parameter schema first (positional
//! argument *i* fills parameter *i*, named arguments fill their parameter,
//! defaults fill the rest) and only then validated, so argument order never
//! has to be juggled by index.

use std::collections::BTreeMap;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::{AnnotationKind, AnnotationPayload, ConstValue};
use crate::error::{DtoGenError, DtoGenResult};

/// Default derived-name template.
pub const DEFAULT_NAME_TEMPLATE: &str = "[class]DTO";

/// Placeholder substituted with the model's identifier.
pub const CLASS_PLACEHOLDER: &str = "[class]";

bitflags! {
    /// Which conversion operations are synthesized for a model/derived pair.
    ///
    /// `NONE` only means "nothing" on its own; combined with other flags it
    /// contributes no bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ConversionKind: u8 {
        const NONE = 0;
        /// `From` impls in both directions (`UserDto::from(user)`).
        const EXPLICIT = 1 << 0;
        /// `From` impls used through `Into` (`let dto: UserDto = user.into()`).
        const IMPLICIT = 1 << 1;
        /// Associated functions `UserDto::to_dto(user)` / `UserDto::to_user(dto)`.
        const STATIC_METHODS = 1 << 2;
        /// `dto.into_user()` only; there is no model→derived counterpart.
        const REFERENCE_METHODS = 1 << 3;
    }
}

impl ConversionKind {
    fn from_flag_name(name: &str) -> Option<Self> {
        match name {
            "None" | "NONE" => Some(Self::NONE),
            "Explicit" | "EXPLICIT" => Some(Self::EXPLICIT),
            "Implicit" | "IMPLICIT" => Some(Self::IMPLICIT),
            "StaticMethods" | "STATIC_METHODS" => Some(Self::STATIC_METHODS),
            "ReferenceMethods" | "REFERENCE_METHODS" => Some(Self::REFERENCE_METHODS),
            _ => None,
        }
    }

    fn from_const(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Variants(_) => value
                .variant_names()
                .unwrap_or_default()
                .into_iter()
                .try_fold(Self::NONE, |acc, name| {
                    Self::from_flag_name(name)
                        .map(|flag| acc | flag)
                        .ok_or_else(|| format!("unknown conversion flag `{name}`"))
                }),
            ConstValue::Int(bits) => u8::try_from(*bits)
                .ok()
                .and_then(Self::from_bits)
                .ok_or_else(|| format!("conversion flags out of range: {bits}")),
            other => Err(format!(
                "expected conversion flags, found {}",
                other.describe()
            )),
        }
    }
}

impl Default for ConversionKind {
    fn default() -> Self {
        Self::EXPLICIT
    }
}

/// How a single member's value crosses between its declared and converted type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum ConversionStrategy {
    /// `From::from(value)`
    Explicit,
    /// `Into::into(value)`
    Implicit,
    /// The converted type's own static conversion functions.
    StaticMethods,
}

impl ConversionStrategy {
    fn from_const(value: &ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Variants(paths) if paths.len() == 1 => {
                let name = value.variant_names().unwrap_or_default().concat();
                Self::from_str(&name)
                    .map_err(|_| format!("unknown conversion strategy `{}`", paths[0]))
            }
            ConstValue::Int(0) => Ok(Self::Explicit),
            ConstValue::Int(1) => Ok(Self::Implicit),
            ConstValue::Int(2) => Ok(Self::StaticMethods),
            other => Err(format!("expected a conversion strategy, found `{other}`")),
        }
    }
}

/// One named parameter of a marker.
struct Param {
    name: &'static str,
    default: Option<fn() -> ConstValue>,
}

const fn required(name: &'static str) -> Param {
    Param {
        name,
        default: None,
    }
}

struct PayloadSchema {
    params: &'static [Param],
}

const HAS_DTO_SCHEMA: PayloadSchema = PayloadSchema {
    params: &[
        Param {
            name: "name",
            default: Some(|| ConstValue::Str(DEFAULT_NAME_TEMPLATE.to_owned())),
        },
        Param {
            name: "conversion",
            default: Some(|| ConstValue::Variants(vec!["Explicit".to_owned()])),
        },
    ],
};

const HAS_CONVERSION_SCHEMA: PayloadSchema = PayloadSchema {
    params: &[required("strategy"), required("converted_type")],
};

const INDIRECT_SCHEMA: PayloadSchema = PayloadSchema {
    params: &[required("method"), required("converted_type")],
};

const INDIRECT_EXTERNAL_SCHEMA: PayloadSchema = PayloadSchema {
    params: &[
        required("converter"),
        required("method"),
        required("converted_type"),
    ],
};

const IGNORE_SCHEMA: PayloadSchema = PayloadSchema { params: &[] };

/// Arguments bound to their parameter names.
struct BoundArgs<'p> {
    payload: &'p AnnotationPayload,
    values: BTreeMap<&'static str, ConstValue>,
}

impl PayloadSchema {
    fn bind<'p>(&self, payload: &'p AnnotationPayload) -> DtoGenResult<BoundArgs<'p>> {
        let mut values = BTreeMap::new();

        for (index, value) in &payload.positional {
            let param = self.params.get(*index).ok_or_else(|| {
                invalid(
                    payload,
                    format!(
                        "expected at most {} argument(s), found {}",
                        self.params.len(),
                        payload.arg_count()
                    ),
                )
            })?;
            values.insert(param.name, value.clone());
        }

        for (name, value) in &payload.named {
            let param = self
                .params
                .iter()
                .find(|param| param.name == name)
                .ok_or_else(|| invalid(payload, format!("unknown argument `{name}`")))?;
            if values.insert(param.name, value.clone()).is_some() {
                return Err(invalid(
                    payload,
                    format!("argument `{name}` is given both by position and by name"),
                ));
            }
        }

        for param in self.params {
            if values.contains_key(param.name) {
                continue;
            }
            match param.default {
                Some(default) => {
                    values.insert(param.name, default());
                }
                None => {
                    return Err(invalid(
                        payload,
                        format!("missing required argument `{}`", param.name),
                    ));
                }
            }
        }

        Ok(BoundArgs { payload, values })
    }
}

impl BoundArgs<'_> {
    fn value(&self, name: &'static str) -> &ConstValue {
        // bind() guarantees every schema parameter is present
        &self.values[name]
    }

    /// A string literal, `type_of(..)` name, or bare path used as a name.
    fn text(&self, name: &'static str) -> DtoGenResult<String> {
        match self.value(name) {
            ConstValue::Variants(names) if names.len() == 1 => Ok(names[0].clone()),
            value => value.as_text().map(str::to_owned).ok_or_else(|| {
                invalid(
                    self.payload,
                    format!(
                        "argument `{name}` must be a string, found {}",
                        value.describe()
                    ),
                )
            }),
        }
    }

    fn non_empty_text(&self, name: &'static str) -> DtoGenResult<String> {
        let text = self.text(name)?;
        if text.trim().is_empty() {
            return Err(invalid(
                self.payload,
                format!("argument `{name}` must not be empty"),
            ));
        }
        Ok(text)
    }
}

fn invalid(payload: &AnnotationPayload, reason: String) -> DtoGenError {
    DtoGenError::InvalidAnnotation {
        target: payload.target.clone(),
        annotation: payload.name.clone(),
        reason,
        span: payload.span,
    }
}

fn expect_kind(payload: &AnnotationPayload, kind: AnnotationKind) {
    debug_assert_eq!(payload.kind, kind, "payload bound against the wrong schema");
}

/// Arguments of the type-level `#[has_dto]` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasDtoArgs {
    pub name_template: String,
    pub conversion: ConversionKind,
}

impl HasDtoArgs {
    pub fn from_payload(payload: &AnnotationPayload) -> DtoGenResult<Self> {
        expect_kind(payload, AnnotationKind::HasDto);
        let args = HAS_DTO_SCHEMA.bind(payload)?;
        let name_template = args.non_empty_text("name")?;
        let conversion = ConversionKind::from_const(args.value("conversion"))
            .map_err(|reason| invalid(payload, reason))?;

        Ok(Self {
            name_template,
            conversion,
        })
    }

    /// Substitute the model identifier into the name template.
    pub fn derived_name(&self, model_name: &str) -> String {
        self.name_template.replace(CLASS_PLACEHOLDER, model_name)
    }
}

/// Arguments of a member-level `#[has_conversion]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasConversionArgs {
    pub strategy: ConversionStrategy,
    pub converted_type: String,
}

impl HasConversionArgs {
    pub fn from_payload(payload: &AnnotationPayload) -> DtoGenResult<Self> {
        expect_kind(payload, AnnotationKind::HasConversion);
        let args = HAS_CONVERSION_SCHEMA.bind(payload)?;
        let strategy = ConversionStrategy::from_const(args.value("strategy"))
            .map_err(|reason| invalid(payload, reason))?;

        Ok(Self {
            strategy,
            converted_type: args.non_empty_text("converted_type")?,
        })
    }
}

/// Arguments of a member-level `#[has_indirect_conversion]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndirectConversionArgs {
    /// External converter type; `None` when the conversion functions live on the
    /// member's own types.
    pub converter: Option<String>,
    pub method: String,
    pub converted_type: String,
}

impl IndirectConversionArgs {
    pub fn from_payload(payload: &AnnotationPayload) -> DtoGenResult<Self> {
        expect_kind(payload, AnnotationKind::HasIndirectConversion);
        let external = payload.arg_count() == 3 || payload.named("converter").is_some();

        if external {
            let args = INDIRECT_EXTERNAL_SCHEMA.bind(payload)?;
            Ok(Self {
                converter: Some(args.text("converter")?),
                method: args.text("method")?,
                converted_type: args.non_empty_text("converted_type")?,
            })
        } else {
            let args = INDIRECT_SCHEMA.bind(payload)?;
            Ok(Self {
                converter: None,
                method: args.text("method")?,
                converted_type: args.non_empty_text("converted_type")?,
            })
        }
    }
}

/// `#[dto_ignore]` takes no arguments.
pub fn validate_ignore(payload: &AnnotationPayload) -> DtoGenResult<()> {
    expect_kind(payload, AnnotationKind::Ignore);
    IGNORE_SCHEMA.bind(payload).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::AnnotationReader;
    use syn::{Field, ItemStruct, parse_quote};

    fn has_dto(item: ItemStruct) -> DtoGenResult<HasDtoArgs> {
        let payload = AnnotationReader::new()
            .read(&item, &[AnnotationKind::HasDto])?
            .remove(0);
        HasDtoArgs::from_payload(&payload)
    }

    fn member_payload(field: Field) -> AnnotationPayload {
        AnnotationReader::new()
            .read(&field, &AnnotationKind::MEMBER_KINDS)
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_has_dto_defaults() {
        let args = has_dto(parse_quote! {
            #[has_dto]
            struct User {}
        })
        .unwrap();
        assert_eq!(args.name_template, "[class]DTO");
        assert_eq!(args.conversion, ConversionKind::EXPLICIT);
        assert_eq!(args.derived_name("User"), "UserDTO");
    }

    #[test]
    fn test_has_dto_positional_and_named() {
        let args = has_dto(parse_quote! {
            #[has_dto("[class]Dto", conversion = StaticMethods | ReferenceMethods)]
            struct User {}
        })
        .unwrap();
        assert_eq!(args.derived_name("User"), "UserDto");
        assert_eq!(
            args.conversion,
            ConversionKind::STATIC_METHODS | ConversionKind::REFERENCE_METHODS
        );
    }

    #[test]
    fn test_none_is_absorbed_by_other_flags() {
        let args = has_dto(parse_quote! {
            #[has_dto(conversion = None | Implicit)]
            struct User {}
        })
        .unwrap();
        assert_eq!(args.conversion, ConversionKind::IMPLICIT);

        let args = has_dto(parse_quote! {
            #[has_dto(conversion = 0)]
            struct User {}
        })
        .unwrap();
        assert!(args.conversion.is_empty());
    }

    #[test]
    fn test_has_dto_rejects_bad_arguments() {
        let unknown = has_dto(parse_quote! {
            #[has_dto(flavour = "x")]
            struct User {}
        });
        assert!(matches!(unknown, Err(DtoGenError::InvalidAnnotation { .. })));

        let twice = has_dto(parse_quote! {
            #[has_dto("[class]Dto", name = "[class]Other")]
            struct User {}
        });
        assert!(matches!(twice, Err(DtoGenError::InvalidAnnotation { .. })));

        let out_of_range = has_dto(parse_quote! {
            #[has_dto(conversion = 64)]
            struct User {}
        });
        assert!(matches!(out_of_range, Err(DtoGenError::InvalidAnnotation { .. })));
    }

    #[test]
    fn test_has_conversion_binding() {
        let payload = member_payload(parse_quote! {
            #[has_conversion(converted_type = "AddressDto", strategy = Implicit)]
            address: Address
        });
        let args = HasConversionArgs::from_payload(&payload).unwrap();
        assert_eq!(args.strategy, ConversionStrategy::Implicit);
        assert_eq!(args.converted_type, "AddressDto");

        let payload = member_payload(parse_quote! {
            #[has_conversion(2, type_of(AddressDto))]
            address: Address
        });
        let args = HasConversionArgs::from_payload(&payload).unwrap();
        assert_eq!(args.strategy, ConversionStrategy::StaticMethods);
    }

    #[test]
    fn test_has_conversion_missing_argument() {
        let payload = member_payload(parse_quote! {
            #[has_conversion(Explicit)]
            address: Address
        });
        match HasConversionArgs::from_payload(&payload) {
            Err(DtoGenError::InvalidAnnotation { reason, .. }) => {
                assert!(reason.contains("converted_type"))
            }
            other => panic!("expected InvalidAnnotation, got {other:?}"),
        }
    }

    #[test]
    fn test_indirect_conversion_shapes() {
        let payload = member_payload(parse_quote! {
            #[has_indirect_conversion("to_dtos", "Vec<TagDto>")]
            tags: Vec<Tag>
        });
        let args = IndirectConversionArgs::from_payload(&payload).unwrap();
        assert_eq!(args.converter, None);
        assert_eq!(args.method, "to_dtos");

        let payload = member_payload(parse_quote! {
            #[has_indirect_conversion(TagConverter, "Convert", "List<TagDto>")]
            tags: Vec<Tag>
        });
        let args = IndirectConversionArgs::from_payload(&payload).unwrap();
        assert_eq!(args.converter.as_deref(), Some("TagConverter"));
        assert_eq!(args.method, "Convert");
        assert_eq!(args.converted_type, "List<TagDto>");

        let payload = member_payload(parse_quote! {
            #[has_indirect_conversion(method = "convert", converted_type = "Vec<TagDto>", converter = "crate::TagConverter")]
            tags: Vec<Tag>
        });
        let args = IndirectConversionArgs::from_payload(&payload).unwrap();
        assert_eq!(args.converter.as_deref(), Some("crate::TagConverter"));
    }

    #[test]
    fn test_ignore_takes_no_arguments() {
        let payload = member_payload(parse_quote! {
            #[dto_ignore("why")]
            secret: String
        });
        assert!(validate_ignore(&payload).is_err());
    }
}
