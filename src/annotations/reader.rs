//! Marker payload extraction
//!
//! Reads the generator's markers off a declaration and reduces every argument
//! expression to a [`ConstValue`]. Arguments that are not compile-time
//! constants are rejected here, before anything downstream sees them.

use std::collections::BTreeMap;

use proc_macro2::Span;
use quote::ToTokens;
use syn::{
    Attribute, BinOp, Expr, ExprBinary, ExprLit, ExprUnary, Field, Ident, ItemStruct, Lit, Meta,
    Token, Type, UnOp,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
};

use super::{AnnotationKind, AnnotationPayload, AnnotationRegistry, ConstValue};
use crate::error::{DtoGenError, DtoGenResult};
use crate::parse::identifier::Identified;

/// A declaration node that can carry markers.
pub trait Annotated: Identified {
    fn attributes(&self) -> &[Attribute];
}

impl Annotated for ItemStruct {
    fn attributes(&self) -> &[Attribute] {
        &self.attrs
    }
}

impl Annotated for Field {
    fn attributes(&self) -> &[Attribute] {
        &self.attrs
    }
}

/// Value side of one marker argument.
enum ArgExpr {
    /// `type_of(Vec<TagDto>)`
    TypeOf(Type),
    Expr(Expr),
}

impl Parse for ArgExpr {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(Ident) && input.peek2(syn::token::Paren) {
            let fork = input.fork();
            let ident: Ident = fork.parse()?;
            if ident == "type_of" {
                let _: Ident = input.parse()?;
                let content;
                syn::parenthesized!(content in input);
                return Ok(ArgExpr::TypeOf(content.parse()?));
            }
        }
        Ok(ArgExpr::Expr(input.parse()?))
    }
}

enum RawArg {
    Named(Ident, ArgExpr),
    Positional(ArgExpr),
}

impl Parse for RawArg {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(Ident) && input.peek2(Token![=]) && !input.peek2(Token![==]) {
            let name: Ident = input.parse()?;
            let _eq: Token![=] = input.parse()?;
            Ok(RawArg::Named(name, input.parse()?))
        } else {
            Ok(RawArg::Positional(input.parse()?))
        }
    }
}

/// Extracts [`AnnotationPayload`]s from declarations.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationReader {
    registry: &'static AnnotationRegistry,
}

impl Default for AnnotationReader {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationReader {
    pub fn new() -> Self {
        Self {
            registry: AnnotationRegistry::global(),
        }
    }

    pub fn registry(&self) -> &'static AnnotationRegistry {
        self.registry
    }

    /// Read every marker on `node` whose kind is in `recognized`, in source order.
    pub fn read<N: Annotated + ?Sized>(
        &self,
        node: &N,
        recognized: &[AnnotationKind],
    ) -> DtoGenResult<Vec<AnnotationPayload>> {
        let target = node
            .identifier()
            .unwrap_or_else(|| "<unnamed>".to_owned());

        node.attributes()
            .iter()
            .filter_map(|attr| {
                self.registry
                    .resolve(attr)
                    .filter(|kind| recognized.contains(kind))
                    .map(|kind| (kind, attr))
            })
            .map(|(kind, attr)| self.read_attribute(kind, attr, &target))
            .collect()
    }

    fn read_attribute(
        &self,
        kind: AnnotationKind,
        attr: &Attribute,
        target: &str,
    ) -> DtoGenResult<AnnotationPayload> {
        let name = attr
            .path()
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_else(|| kind.to_string());

        let raw_args: Vec<RawArg> = match &attr.meta {
            Meta::Path(_) => Vec::new(),
            Meta::NameValue(name_value) => {
                vec![RawArg::Positional(ArgExpr::Expr(name_value.value.clone()))]
            }
            Meta::List(list) => list
                .parse_args_with(Punctuated::<RawArg, Token![,]>::parse_terminated)
                .map_err(|e| DtoGenError::InvalidAnnotation {
                    target: target.to_owned(),
                    annotation: name.clone(),
                    reason: format!("malformed arguments: {e}"),
                    span: e.span(),
                })?
                .into_iter()
                .collect(),
        };

        let mut positional = Vec::new();
        let mut named = BTreeMap::new();
        for (index, raw) in raw_args.into_iter().enumerate() {
            match raw {
                RawArg::Positional(arg) => {
                    let value = resolve_arg(&arg, || DtoGenError::UnresolvedConstant {
                        target: target.to_owned(),
                        annotation: name.clone(),
                        argument: format!("#{index}"),
                        expression: arg_text(&arg),
                        span: arg_span(&arg),
                    })?;
                    positional.push((positional.len(), value));
                }
                RawArg::Named(arg_name, arg) => {
                    let key = arg_name.to_string();
                    let value = resolve_arg(&arg, || DtoGenError::UnresolvedConstant {
                        target: target.to_owned(),
                        annotation: name.clone(),
                        argument: key.clone(),
                        expression: arg_text(&arg),
                        span: arg_span(&arg),
                    })?;
                    if named.insert(key.clone(), value).is_some() {
                        return Err(DtoGenError::InvalidAnnotation {
                            target: target.to_owned(),
                            annotation: name,
                            reason: format!("argument `{key}` given more than once"),
                            span: arg_name.span(),
                        });
                    }
                }
            }
        }

        Ok(AnnotationPayload {
            kind,
            name,
            target: target.to_owned(),
            positional,
            named,
            span: attr.span(),
        })
    }
}

fn resolve_arg(
    arg: &ArgExpr,
    unresolved: impl FnOnce() -> DtoGenError,
) -> DtoGenResult<ConstValue> {
    match arg {
        ArgExpr::TypeOf(ty) => Ok(ConstValue::TypeName(type_name(ty))),
        ArgExpr::Expr(expr) => resolve_constant(expr).ok_or_else(unresolved),
    }
}

fn arg_text(arg: &ArgExpr) -> String {
    match arg {
        ArgExpr::TypeOf(ty) => type_name(ty),
        ArgExpr::Expr(expr) => normalize_tokens(&expr.to_token_stream().to_string()),
    }
}

fn arg_span(arg: &ArgExpr) -> Span {
    match arg {
        ArgExpr::TypeOf(ty) => ty.span(),
        ArgExpr::Expr(expr) => expr.span(),
    }
}

/// Reduce an expression to a constant, or `None` when it is computed at runtime.
pub fn resolve_constant(expr: &Expr) -> Option<ConstValue> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => match lit {
            Lit::Str(s) => Some(ConstValue::Str(s.value())),
            Lit::Char(c) => Some(ConstValue::Str(c.value().to_string())),
            Lit::Int(i) => i.base10_parse::<i128>().ok().map(ConstValue::Int),
            Lit::Bool(b) => Some(ConstValue::Bool(b.value)),
            _ => None,
        },
        Expr::Path(path) if path.qself.is_none() => Some(ConstValue::Variants(vec![
            normalize_tokens(&path.path.to_token_stream().to_string()),
        ])),
        Expr::Paren(paren) => resolve_constant(&paren.expr),
        Expr::Group(group) => resolve_constant(&group.expr),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => match resolve_constant(expr)? {
            ConstValue::Int(i) => Some(ConstValue::Int(-i)),
            _ => None,
        },
        Expr::Binary(ExprBinary {
            op: BinOp::BitOr(_),
            left,
            right,
            ..
        }) => match (resolve_constant(left)?, resolve_constant(right)?) {
            (ConstValue::Int(a), ConstValue::Int(b)) => Some(ConstValue::Int(a | b)),
            (ConstValue::Variants(mut a), ConstValue::Variants(b)) => {
                a.extend(b);
                Some(ConstValue::Variants(a))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Textual name of a type, without the token spacing `quote` inserts.
pub fn type_name(ty: &Type) -> String {
    normalize_tokens(&ty.to_token_stream().to_string())
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

/// Re-space a token string: `std :: vec :: Vec < u8 >` → `std::vec::Vec<u8>`.
pub fn normalize_tokens(tokens: &str) -> String {
    let mut out = String::with_capacity(tokens.len());
    let mut prev: Option<&str> = None;
    for token in tokens.split_whitespace() {
        if let Some(prev) = prev {
            let spaced = matches!(prev, "," | ";" | "->" | "=>" | "+" | "=" | "|" | "==")
                || matches!(token, "->" | "=>" | "+" | "=" | "|" | "==")
                || matches!(prev, "mut" | "const" | "dyn" | "impl" | "unsafe" | "extern")
                || (prev.ends_with(is_word) && token.starts_with(is_word));
            if spaced {
                out.push(' ');
            }
        }
        out.push_str(token);
        prev = Some(token);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn read(field: &Field) -> DtoGenResult<Vec<AnnotationPayload>> {
        AnnotationReader::new().read(field, &AnnotationKind::MEMBER_KINDS)
    }

    #[test]
    fn test_reads_positional_and_named_arguments() {
        let field: Field = parse_quote! {
            #[has_conversion(StaticMethods, converted_type = "AddressDto")]
            pub address: Address
        };

        let payloads = read(&field).unwrap();
        assert_eq!(payloads.len(), 1);
        let payload = &payloads[0];
        assert_eq!(payload.kind, AnnotationKind::HasConversion);
        assert_eq!(payload.target, "address");
        assert_eq!(
            payload.positional(0),
            Some(&ConstValue::Variants(vec!["StaticMethods".into()]))
        );
        assert_eq!(
            payload.named("converted_type"),
            Some(&ConstValue::Str("AddressDto".into()))
        );
    }

    #[test]
    fn test_suffixed_spelling_matches_same_kind() {
        let field: Field = parse_quote! {
            #[DTOIgnoreAttribute]
            pub secret: String
        };

        let payloads = read(&field).unwrap();
        assert_eq!(payloads[0].kind, AnnotationKind::Ignore);
        assert_eq!(payloads[0].name, "DTOIgnoreAttribute");
        assert_eq!(payloads[0].arg_count(), 0);
    }

    #[test]
    fn test_unrecognized_attributes_are_skipped() {
        let field: Field = parse_quote! {
            #[serde(rename = "id")]
            #[doc = "identifier"]
            pub id: u64
        };
        assert!(read(&field).unwrap().is_empty());

        let item: ItemStruct = parse_quote! {
            #[has_dto]
            #[dto_ignore]
            struct User {}
        };
        let payloads = AnnotationReader::new()
            .read(&item, &[AnnotationKind::HasDto])
            .unwrap();
        assert_eq!(payloads.len(), 1);
    }

    #[test]
    fn test_type_of_resolves_to_type_name() {
        let field: Field = parse_quote! {
            #[has_indirect_conversion(TagConverter, "convert", type_of(std::vec::Vec<TagDto>))]
            pub tags: Vec<Tag>
        };

        let payload = read(&field).unwrap().remove(0);
        assert_eq!(payload.positional(0), Some(&ConstValue::Variants(vec!["TagConverter".into()])));
        assert_eq!(
            payload.positional(2),
            Some(&ConstValue::TypeName("std::vec::Vec<TagDto>".into()))
        );
    }

    #[test]
    fn test_flag_combination_folds() {
        let item: ItemStruct = parse_quote! {
            #[has_dto(conversion = ConversionKind::Explicit | (Implicit))]
            struct User {}
        };
        let payload = AnnotationReader::new()
            .read(&item, &[AnnotationKind::HasDto])
            .unwrap()
            .remove(0);
        assert_eq!(
            payload.named("conversion"),
            Some(&ConstValue::Variants(vec![
                "ConversionKind::Explicit".into(),
                "Implicit".into()
            ]))
        );

        let expr: Expr = parse_quote!(1 | 4);
        assert_eq!(resolve_constant(&expr), Some(ConstValue::Int(5)));
    }

    #[test]
    fn test_runtime_expression_is_rejected() {
        let field: Field = parse_quote! {
            #[has_conversion(Explicit, make_name())]
            pub address: Address
        };

        match read(&field) {
            Err(DtoGenError::UnresolvedConstant {
                target,
                argument,
                expression,
                ..
            }) => {
                assert_eq!(target, "address");
                assert_eq!(argument, "#1");
                assert_eq!(expression, "make_name()");
            }
            other => panic!("expected UnresolvedConstant, got {other:?}"),
        }
    }

    #[test]
    fn test_repeated_named_argument_is_rejected() {
        let item: ItemStruct = parse_quote! {
            #[has_dto(name = "A", name = "B")]
            struct User {}
        };
        let result = AnnotationReader::new().read(&item, &[AnnotationKind::HasDto]);
        assert!(matches!(result, Err(DtoGenError::InvalidAnnotation { .. })));
    }

    #[test]
    fn test_normalize_tokens() {
        let ty: Type = parse_quote!(std::collections::HashMap<String, Vec<u8>>);
        assert_eq!(type_name(&ty), "std::collections::HashMap<String, Vec<u8>>");

        let ty: Type = parse_quote!(&'a mut [u8; 4]);
        assert_eq!(type_name(&ty), "&'a mut [u8; 4]");

        let ty: Type = parse_quote!(Box<dyn Fn(u8) -> u8 + Send>);
        assert_eq!(type_name(&ty), "Box<dyn Fn(u8) -> u8 + Send>");
    }
}
