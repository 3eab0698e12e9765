//! Utilities for finding and stripping the generator's own marker attributes

use syn::{Attribute, Fields, ItemStruct};

use crate::annotations::{AnnotationKind, AnnotationRegistry};

/// Find the first attribute of the given kind
pub fn find_marker(attrs: &[Attribute], kind: AnnotationKind) -> Option<&Attribute> {
    let registry = AnnotationRegistry::global();
    attrs.iter().find(|attr| registry.resolve(attr) == Some(kind))
}

/// Check if attributes contain a marker of the given kind
pub fn has_marker(attrs: &[Attribute], kind: AnnotationKind) -> bool {
    find_marker(attrs, kind).is_some()
}

/// Every attribute that is not a generator marker, in source order
pub fn non_marker_attributes(attrs: &[Attribute]) -> Vec<Attribute> {
    let registry = AnnotationRegistry::global();
    attrs
        .iter()
        .filter(|attr| !registry.is_generator_attribute(attr))
        .cloned()
        .collect()
}

/// Remove generator markers in place, returning how many were removed
pub fn strip_markers(attrs: &mut Vec<Attribute>) -> usize {
    let registry = AnnotationRegistry::global();
    let before = attrs.len();
    attrs.retain(|attr| !registry.is_generator_attribute(attr));
    before - attrs.len()
}

/// Strip markers from a struct and from each of its fields so it compiles without them
pub fn strip_struct_markers(item: &mut ItemStruct) -> usize {
    let mut removed = strip_markers(&mut item.attrs);
    match &mut item.fields {
        Fields::Named(fields) => {
            for field in fields.named.iter_mut() {
                removed += strip_markers(&mut field.attrs);
            }
        }
        Fields::Unnamed(fields) => {
            for field in fields.unnamed.iter_mut() {
                removed += strip_markers(&mut field.attrs);
            }
        }
        Fields::Unit => {}
    }
    removed
}
