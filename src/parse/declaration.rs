//! Tagged declarations and their surroundings
//!
//! A [`ModelDeclaration`] is what discovery hands to the rest of the pipeline:
//! the tagged struct, the module it was declared in and the `use` items in
//! scope there.

use std::fmt;
use std::path::PathBuf;

use derive_more::{Display, From, Into};
use serde::Serialize;
use syn::{ItemStruct, ItemUse, UseTree};

use super::identifier::Identified;

/// Module path of a declaration relative to the crate root.
///
/// The crate root itself is the global namespace (no segments).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Namespace(Vec<String>);

impl Namespace {
    pub fn global() -> Self {
        Self(Vec::new())
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse `models::user` or `crate::models::user`.
    pub fn parse(path: &str) -> Self {
        let mut segments: Vec<String> = path
            .split("::")
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect();
        if segments.first().is_some_and(|first| first == "crate") {
            segments.remove(0);
        }
        Self(segments)
    }

    pub fn is_global(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Absolute path segments, starting with `crate`.
    pub fn absolute_segments(&self) -> Vec<String> {
        std::iter::once("crate".to_owned())
            .chain(self.0.iter().cloned())
            .collect()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.absolute_segments().join("::"))
    }
}

/// One flattened `use` leaf, e.g. `crate::models::Address` or `std::fmt::Display as Show`.
///
/// Imports compare by text; two spellings of the same path are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize)]
pub struct Import(String);

impl Import {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Segments of the imported path, without any `as` rename.
    pub fn segments(&self) -> Vec<&str> {
        let path = self.0.split(" as ").next().unwrap_or_default();
        path.split("::")
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    /// Whether the imported path lies in (or is) `prefix`, compared segment-wise.
    pub fn is_within(&self, prefix: &[String]) -> bool {
        let segments = self.segments();
        !prefix.is_empty()
            && segments.len() >= prefix.len()
            && segments.iter().zip(prefix).all(|(a, b)| *a == b)
    }

    /// Flatten a `use` item declared in `namespace` into one import per leaf.
    ///
    /// `self::` and `super::` prefixes are rewritten to absolute `crate::` paths so
    /// the import stays valid when emitted into another module.
    pub fn from_item_use(item: &ItemUse, namespace: &Namespace) -> Vec<Import> {
        let mut leaves = Vec::new();
        flatten(&item.tree, Vec::new(), &mut leaves);

        leaves
            .into_iter()
            .map(|leaf| {
                let rename = leaf.rename.map(|r| format!(" as {r}")).unwrap_or_default();
                let path = if item.leading_colon.is_some() {
                    format!("::{}", leaf.segments.join("::"))
                } else {
                    absolutize(leaf.segments, namespace).join("::")
                };
                Import(format!("{path}{rename}"))
            })
            .collect()
    }
}

struct UseLeaf {
    segments: Vec<String>,
    rename: Option<String>,
}

fn flatten(tree: &UseTree, prefix: Vec<String>, out: &mut Vec<UseLeaf>) {
    let with = |segment: String| {
        let mut segments = prefix.clone();
        segments.push(segment);
        segments
    };

    match tree {
        UseTree::Path(path) => flatten(&path.tree, with(path.ident.to_string()), out),
        // `a::{self}` imports `a` itself
        UseTree::Name(name) if name.ident == "self" && !prefix.is_empty() => out.push(UseLeaf {
            segments: prefix,
            rename: None,
        }),
        UseTree::Name(name) => out.push(UseLeaf {
            segments: with(name.ident.to_string()),
            rename: None,
        }),
        UseTree::Rename(rename) if rename.ident == "self" && !prefix.is_empty() => {
            out.push(UseLeaf {
                segments: prefix,
                rename: Some(rename.rename.to_string()),
            })
        }
        UseTree::Rename(rename) => out.push(UseLeaf {
            segments: with(rename.ident.to_string()),
            rename: Some(rename.rename.to_string()),
        }),
        UseTree::Glob(_) => out.push(UseLeaf {
            segments: with("*".to_owned()),
            rename: None,
        }),
        UseTree::Group(group) => {
            for tree in &group.items {
                flatten(tree, prefix.clone(), out);
            }
        }
    }
}

fn absolutize(segments: Vec<String>, namespace: &Namespace) -> Vec<String> {
    match segments.first().map(String::as_str) {
        Some("self") => namespace
            .absolute_segments()
            .into_iter()
            .chain(segments.into_iter().skip(1))
            .collect(),
        Some("super") => {
            let depth = segments.iter().take_while(|s| *s == "super").count();
            let base = namespace.segments();
            if depth > base.len() {
                return segments;
            }
            std::iter::once("crate".to_owned())
                .chain(base[..base.len() - depth].iter().cloned())
                .chain(segments.into_iter().skip(depth))
                .collect()
        }
        _ => segments,
    }
}

/// A struct carrying a `has_dto` marker, with the context it was declared in.
#[derive(Debug, Clone)]
pub struct ModelDeclaration {
    pub item: ItemStruct,
    pub namespace: Namespace,
    /// `use` items in scope at the declaration, flattened, in source order.
    pub imports: Vec<Import>,
    /// Source file, when discovered from disk.
    pub origin: Option<PathBuf>,
}

impl ModelDeclaration {
    pub fn new(item: ItemStruct, namespace: Namespace) -> Self {
        Self {
            item,
            namespace,
            imports: Vec::new(),
            origin: None,
        }
    }

    pub fn with_imports(mut self, imports: impl IntoIterator<Item = Import>) -> Self {
        self.imports.extend(imports);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn name(&self) -> String {
        self.item
            .identifier()
            .unwrap_or_else(|| self.item.ident.to_string())
    }
}
