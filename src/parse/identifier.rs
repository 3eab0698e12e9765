use proc_macro2::Span;
use syn::{Field, ItemStruct, ext::IdentExt, spanned::Spanned};

/// A declaration node with a canonical name.
///
/// Raw identifiers are reported without their `r#` prefix (`r#type` -> `type`).
pub trait Identified {
    /// `None` for nodes without a name, such as tuple struct fields.
    fn identifier(&self) -> Option<String>;

    fn identifier_span(&self) -> Span;
}

impl Identified for ItemStruct {
    fn identifier(&self) -> Option<String> {
        Some(self.ident.unraw().to_string())
    }

    fn identifier_span(&self) -> Span {
        self.ident.span()
    }
}

impl Identified for Field {
    fn identifier(&self) -> Option<String> {
        self.ident.as_ref().map(|ident| ident.unraw().to_string())
    }

    fn identifier_span(&self) -> Span {
        match &self.ident {
            Some(ident) => ident.span(),
            None => self.ty.span(),
        }
    }
}
