use syn::{PathArguments, Type, TypePath};

/// Last path segment of a plain (non-qualified) type path, looking through groups and parens
fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(TypePath { qself: None, path }) => path.segments.last(),
        Type::Group(group) => last_segment(&group.elem),
        Type::Paren(paren) => last_segment(&paren.elem),
        _ => None,
    }
}

/// Whether the type is `Option<_>` (`std::option::Option<_>` included)
pub fn is_option(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|segment| {
        segment.ident == "Option" && matches!(segment.arguments, PathArguments::AngleBracketed(_))
    })
}

/// Whether the type is `PhantomData<_>`
pub fn is_phantom(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|segment| segment.ident == "PhantomData")
}

/// Identifier of the outermost type (`Vec<Address>` -> `Vec`, `crate::Address` -> `Address`)
pub fn outer_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Reference(reference) => outer_type_name(&reference.elem),
        _ => last_segment(ty).map(|segment| segment.ident.to_string()),
    }
}
