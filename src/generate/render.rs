//! Rust rendering of synthesized units
//!
//! Units are nested into a module tree mirroring their namespaces and printed
//! with `prettyplease`, so identical input always produces identical text.

use std::path::PathBuf;

use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::{ItemUse, Path, PathSegment, parse_quote};

use super::grouping::SynthesizedUnit;
use super::model::{
    AssignedValue, Assignment, CastStyle, ConversionMember, DerivedDeclaration, Direction,
    HelperTransform,
};
use crate::config::GeneratorConfig;
use crate::error::{DtoGenError, DtoGenResult};
use crate::parse::Import;
use crate::utils::naming;

pub const GENERATED_HEADER: &str =
    "// @generated by dtogen from `#[has_dto]` model types. Do not edit by hand.\n\n";

/// Renders units into a single Rust source file.
#[derive(Debug, Clone)]
pub struct Renderer {
    header: bool,
    output_file: String,
    model_root: Path,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            header: true,
            output_file: crate::config::DEFAULT_OUTPUT_FILE.to_owned(),
            model_root: parse_quote!(crate),
        }
    }
}

impl Renderer {
    pub fn from_config(config: &GeneratorConfig) -> DtoGenResult<Self> {
        Ok(Self {
            header: config.header,
            output_file: config.output_file.clone(),
            model_root: config.model_root_path()?,
        })
    }

    pub fn render(&self, units: &[SynthesizedUnit]) -> DtoGenResult<String> {
        let tokens = self.render_tokens(units)?;
        let file: syn::File = syn::parse2(tokens).map_err(|e| DtoGenError::Parse {
            path: PathBuf::from(&self.output_file),
            message: e.to_string(),
            span: e.span(),
        })?;

        let body = prettyplease::unparse(&file);
        Ok(if self.header {
            format!("{GENERATED_HEADER}{body}")
        } else {
            body
        })
    }

    /// The module tree as tokens, before pretty-printing.
    pub fn render_tokens(&self, units: &[SynthesizedUnit]) -> DtoGenResult<TokenStream> {
        let mut root = ModuleNode::default();
        for unit in units {
            root.insert(unit.namespace.segments(), unit)?;
        }
        Ok(root.to_tokens(&self.model_root))
    }
}

#[derive(Default)]
struct ModuleNode<'u> {
    units: Vec<&'u SynthesizedUnit>,
    /// Child modules in insertion order.
    children: Vec<(Ident, ModuleNode<'u>)>,
}

impl<'u> ModuleNode<'u> {
    fn insert(&mut self, segments: &[String], unit: &'u SynthesizedUnit) -> DtoGenResult<()> {
        let Some((first, rest)) = segments.split_first() else {
            self.units.push(unit);
            return Ok(());
        };

        let ident = naming::module_ident(first).ok_or_else(|| DtoGenError::InvalidModelDeclaration {
            model: unit
                .declarations
                .first()
                .map(|d| d.model_name.clone())
                .unwrap_or_default(),
            reason: format!("namespace segment `{first}` is not a module name"),
            span: proc_macro2::Span::call_site(),
        })?;

        let position = match self.children.iter().position(|(name, _)| *name == ident) {
            Some(position) => position,
            None => {
                self.children.push((ident, ModuleNode::default()));
                self.children.len() - 1
            }
        };
        self.children[position].1.insert(rest, unit)
    }

    /// `model_module` is the module of the models whose namespace is this node.
    fn to_tokens(&self, model_module: &Path) -> TokenStream {
        // Items declared beside the models resolve in the generated module
        let glob = (!self.units.is_empty()).then(|| {
            quote! {
                #[allow(unused_imports)]
                use #model_module::*;
            }
        });
        let imports = self
            .units
            .iter()
            .flat_map(|unit| &unit.imports)
            .filter_map(import_tokens);
        let declarations = self
            .units
            .iter()
            .flat_map(|unit| &unit.declarations)
            .map(declaration_tokens);
        let children = self.children.iter().map(|(name, node)| {
            let mut module = model_module.clone();
            module.segments.push(PathSegment::from(name.clone()));
            let body = node.to_tokens(&module);
            quote! {
                pub mod #name {
                    #body
                }
            }
        });

        quote! {
            #glob
            #(#imports)*
            #(#declarations)*
            #(#children)*
        }
    }
}

fn import_tokens(import: &Import) -> Option<TokenStream> {
    match syn::parse_str::<ItemUse>(&format!("use {import};")) {
        Ok(item) => Some(quote! {
            #[allow(unused_imports)]
            #item
        }),
        Err(e) => {
            log::warn!("dropping import `{import}`: {e}");
            None
        }
    }
}

/// The derived struct, its inherent impl and its `From` impls.
pub fn declaration_tokens(declaration: &DerivedDeclaration) -> TokenStream {
    let DerivedDeclaration {
        ident,
        attrs,
        generics,
        fields,
        model_type,
        ..
    } = declaration;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut methods = Vec::new();
    let mut impls = Vec::new();
    for conversion in &declaration.conversions {
        match conversion {
            ConversionMember::Helper(helper) => methods.push(helper_tokens(declaration, helper)),
            ConversionMember::StaticMethod { name, direction } => {
                let helper = helper_name(*direction);
                methods.push(match direction {
                    Direction::ToDerived => quote! {
                        pub fn #name(model: #model_type) -> Self {
                            Self::#helper(model)
                        }
                    },
                    Direction::ToModel => quote! {
                        pub fn #name(dto: Self) -> #model_type {
                            Self::#helper(dto)
                        }
                    },
                });
            }
            ConversionMember::ReferenceMethod { name } => {
                let helper = naming::to_model_helper();
                methods.push(quote! {
                    pub fn #name(self) -> #model_type {
                        Self::#helper(self)
                    }
                });
            }
            ConversionMember::Cast { style, direction } => {
                let helper = helper_name(*direction);
                let doc = match style {
                    CastStyle::Explicit => "Explicit conversion.",
                    CastStyle::Implicit => "Implicit conversion, used through `Into`.",
                };
                impls.push(match direction {
                    Direction::ToDerived => quote! {
                        #[doc = #doc]
                        impl #impl_generics ::core::convert::From<#model_type> for #ident #ty_generics #where_clause {
                            fn from(model: #model_type) -> Self {
                                Self::#helper(model)
                            }
                        }
                    },
                    Direction::ToModel => quote! {
                        #[doc = #doc]
                        impl #impl_generics ::core::convert::From<#ident #ty_generics> for #model_type #where_clause {
                            fn from(dto: #ident #ty_generics) -> Self {
                                <#ident #ty_generics>::#helper(dto)
                            }
                        }
                    },
                });
            }
        }
    }

    let inherent = (!methods.is_empty()).then(|| {
        quote! {
            impl #impl_generics #ident #ty_generics #where_clause {
                #(#methods)*
            }
        }
    });

    quote! {
        #(#attrs)*
        pub struct #ident #generics #where_clause {
            #(#fields,)*
        }

        #inherent
        #(#impls)*
    }
}

fn helper_name(direction: Direction) -> Ident {
    match direction {
        Direction::ToDerived => naming::to_derived_helper(),
        Direction::ToModel => naming::to_model_helper(),
    }
}

fn helper_tokens(declaration: &DerivedDeclaration, helper: &HelperTransform) -> TokenStream {
    let name = &helper.name;
    let model_type = &declaration.model_type;
    let model_path = &declaration.model_path;

    match helper.direction {
        Direction::ToDerived => {
            let source = quote!(model);
            let inits = helper.assignments.iter().map(|a| init_tokens(&source, a));
            quote! {
                #[allow(dead_code)]
                fn #name(model: #model_type) -> Self {
                    Self {
                        #(#inits,)*
                    }
                }
            }
        }
        Direction::ToModel => {
            let source = quote!(dto);
            let inits = helper.assignments.iter().map(|a| init_tokens(&source, a));
            quote! {
                #[allow(dead_code)]
                fn #name(dto: Self) -> #model_type {
                    #model_path {
                        #(#inits,)*
                    }
                }
            }
        }
    }
}

fn init_tokens(source: &TokenStream, assignment: &Assignment) -> TokenStream {
    let member = &assignment.member;
    let value = match &assignment.value {
        AssignedValue::Copy => quote!(#source.#member),
        AssignedValue::Cast(CastStyle::Explicit) => {
            quote!(::core::convert::From::from(#source.#member))
        }
        AssignedValue::Cast(CastStyle::Implicit) => {
            quote!(::core::convert::Into::into(#source.#member))
        }
        AssignedValue::Call { owner, method } => quote!(<#owner>::#method(#source.#member)),
        AssignedValue::Sentinel | AssignedValue::Default => {
            quote!(::core::default::Default::default())
        }
    };
    quote!(#member: #value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{ConversionSynthesizer, NamespaceGrouper};
    use crate::parse::{ModelDeclaration, ModelDescriptor, Namespace};
    use syn::{ItemStruct, parse_quote};

    fn render(items: Vec<(ItemStruct, &str)>) -> String {
        let declarations = items
            .into_iter()
            .map(|(item, namespace)| {
                let declaration = ModelDeclaration::new(item, Namespace::parse(namespace))
                    .with_imports([Import::new("crate::models::Address")]);
                let descriptor = ModelDescriptor::build(&declaration).unwrap();
                ConversionSynthesizer::default().synthesize(&descriptor).unwrap()
            })
            .collect();
        let grouped = NamespaceGrouper::new(vec!["crate".into(), "dto".into()]).group(declarations);
        Renderer::default().render(&grouped.units).unwrap()
    }

    #[test]
    fn test_renders_static_methods() {
        let source = render(vec![(
            parse_quote! {
                #[derive(Debug, Clone)]
                #[has_dto(name = "[class]Dto", conversion = StaticMethods)]
                pub struct User {
                    pub id: i32,
                    name: String,
                    #[dto_ignore]
                    secret: String,
                }
            },
            "models",
        )]);

        assert!(source.starts_with("// @generated"));
        assert!(source.contains("pub mod models {"));
        assert!(source.contains("use crate::models::*;"));
        assert!(source.contains("use crate::models::Address;"));
        assert!(source.contains("#[derive(Debug, Clone)]"));
        assert!(source.contains("pub struct UserDto {"));
        assert!(source.contains("pub name: String,"));
        assert!(!source.contains("pub secret"));
        assert!(source.contains("pub fn to_dto(model: crate::models::User) -> Self"));
        assert!(source.contains("pub fn to_user(dto: Self) -> crate::models::User"));
        assert!(source.contains("secret: ::core::default::Default::default()"));
        assert!(!source.contains("impl ::core::convert::From"));
    }

    #[test]
    fn test_renders_from_impls_and_reference_method() {
        let source = render(vec![(
            parse_quote! {
                #[has_dto(conversion = Explicit | ReferenceMethods)]
                pub struct Tagged<T: Clone> {
                    pub id: u64,
                    #[has_conversion(Implicit, "AddressDto")]
                    pub address: Address,
                    pub marker: PhantomData<T>,
                }
            },
            "",
        )]);

        assert!(!source.contains("pub mod"));
        assert!(source.contains("pub struct TaggedDTO<T: Clone> {"));
        assert!(source.contains(
            "impl<T: Clone> ::core::convert::From<crate::Tagged<T>> for TaggedDTO<T>"
        ));
        assert!(source.contains(
            "impl<T: Clone> ::core::convert::From<TaggedDTO<T>> for crate::Tagged<T>"
        ));
        assert!(source.contains("pub fn into_tagged(self) -> crate::Tagged<T>"));
        assert!(source.contains("address: ::core::convert::Into::into(model.address)"));
        assert!(source.contains("pub address: AddressDto,"));
        assert!(source.contains("marker: ::core::default::Default::default()"));
    }

    #[test]
    fn test_nested_namespaces_share_parent_module() {
        let source = render(vec![
            (parse_quote!(#[has_dto] struct A { id: u8 }), "a::b"),
            (parse_quote!(#[has_dto] struct C { id: u8 }), "a"),
        ]);

        assert_eq!(source.matches("pub mod a {").count(), 1);
        assert_eq!(source.matches("pub mod b {").count(), 1);
        assert!(source.contains("crate::a::b::A"));
        assert!(source.contains("crate::a::C"));
        assert!(source.contains("use crate::a::b::*;"));
        assert!(source.contains("use crate::a::*;"));
    }

    #[test]
    fn test_glob_follows_configured_model_root() {
        let declaration = ModelDeclaration::new(
            parse_quote!(#[has_dto] pub struct User { pub id: u8 }),
            Namespace::parse("models"),
        );
        let descriptor = ModelDescriptor::build(&declaration).unwrap();
        let derived = ConversionSynthesizer::new(parse_quote!(::app))
            .synthesize(&descriptor)
            .unwrap();
        let grouped = NamespaceGrouper::new(vec!["crate".into(), "dto".into()]).group(vec![derived]);

        let config = GeneratorConfig::builder().model_root("::app").build();
        let source = Renderer::from_config(&config).unwrap().render(&grouped.units).unwrap();
        assert!(source.contains("use ::app::models::*;"));
        assert!(source.contains("fn convert_to_model(dto: Self) -> ::app::models::User"));
    }

    #[test]
    fn test_empty_batch_renders_header_only() {
        let source = Renderer::default().render(&[]).unwrap();
        assert_eq!(source.trim_end(), GENERATED_HEADER.trim_end());
    }
}
