//! Utilities for generating consistent names for conversion functions

use heck::ToSnakeCase;
use proc_macro2::Ident;
use quote::format_ident;

use crate::annotations::schema::CLASS_PLACEHOLDER;

/// Private helper building the derived value from a model (`convert_to_derived`)
pub fn to_derived_helper() -> Ident {
    format_ident!("convert_to_derived")
}

/// Private helper rebuilding the model from a derived value (`convert_to_model`)
pub fn to_model_helper() -> Ident {
    format_ident!("convert_to_model")
}

/// Snake-cased name template with the placeholder removed (`[class]Dto` -> `dto`)
pub fn template_suffix(name_template: &str) -> String {
    let suffix = name_template.replace(CLASS_PLACEHOLDER, "").to_snake_case();
    if suffix.is_empty() {
        "derived".to_owned()
    } else {
        suffix
    }
}

/// Static model -> derived function (e.g., `[class]Dto` -> to_dto)
pub fn static_to_derived(name_template: &str) -> Ident {
    format_ident!("to_{}", template_suffix(name_template))
}

/// Static derived -> model function (e.g., User -> to_user)
pub fn static_to_model(model_name: &str) -> Ident {
    format_ident!("to_{}", model_name.to_snake_case())
}

/// Instance derived -> model method (e.g., User -> into_user)
pub fn reference_to_model(model_name: &str) -> Ident {
    format_ident!("into_{}", model_name.to_snake_case())
}

/// Identifier for a module path segment, raw when it is a keyword (`type` -> r#type)
pub fn module_ident(segment: &str) -> Option<Ident> {
    syn::parse_str::<Ident>(segment)
        .or_else(|_| syn::parse_str::<Ident>(&format!("r#{segment}")))
        .ok()
}
