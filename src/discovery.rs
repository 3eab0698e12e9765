//! Declaration discovery
//!
//! Finds `has_dto` structs in Rust sources. Each file is walked with a
//! [`syn::visit::Visit`] visitor that tracks inline modules and the `use`
//! items in scope, so every declaration knows its namespace and imports.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use syn::{Attribute, Item, ItemMod, ItemStruct, Meta, visit::Visit};

use crate::annotations::AnnotationKind;
use crate::error::{DtoGenError, DtoGenResult};
use crate::parse::{Import, ModelDeclaration, Namespace};
use crate::utils::attributes::has_marker;

/// Visitor collecting tagged structs from one file
pub struct DeclarationVisitor {
    namespace: Namespace,
    /// `use` items of the module being visited
    imports: Vec<Import>,
    origin: Option<PathBuf>,

    /// Collected declarations, in source order
    pub declarations: Vec<ModelDeclaration>,
}

impl DeclarationVisitor {
    pub fn new(namespace: Namespace, origin: Option<PathBuf>) -> Self {
        Self {
            namespace,
            imports: Vec::new(),
            origin,
            declarations: Vec::new(),
        }
    }

    /// Collect every tagged struct of a parsed file declared as module `namespace`
    pub fn collect(
        file: &syn::File,
        namespace: Namespace,
        origin: Option<PathBuf>,
    ) -> Vec<ModelDeclaration> {
        let mut visitor = Self::new(namespace, origin);
        visitor.visit_file(file);
        visitor.declarations
    }

    fn visit_items(&mut self, items: &[Item]) {
        let imports = items
            .iter()
            .filter_map(|item| match item {
                Item::Use(item) => Some(Import::from_item_use(item, &self.namespace)),
                _ => None,
            })
            .flatten()
            .collect();
        let outer = std::mem::replace(&mut self.imports, imports);

        for item in items {
            self.visit_item(item);
        }

        self.imports = outer;
    }
}

impl<'ast> Visit<'ast> for DeclarationVisitor {
    fn visit_file(&mut self, file: &'ast syn::File) {
        self.visit_items(&file.items);
    }

    fn visit_item_mod(&mut self, module: &'ast ItemMod) {
        // Test-only models do not exist in the build the output is compiled into
        if is_cfg_test(&module.attrs) {
            return;
        }
        let Some((_, items)) = &module.content else {
            return;
        };

        let child = self.namespace.child(module.ident.to_string());
        let parent = std::mem::replace(&mut self.namespace, child);
        self.visit_items(items);
        self.namespace = parent;
    }

    fn visit_item_struct(&mut self, item: &'ast ItemStruct) {
        if !has_marker(&item.attrs, AnnotationKind::HasDto) {
            return;
        }
        log::trace!("found #[has_dto] struct {} in {}", item.ident, self.namespace);

        let mut declaration = ModelDeclaration::new(item.clone(), self.namespace.clone())
            .with_imports(self.imports.iter().cloned());
        declaration.origin = self.origin.clone();
        self.declarations.push(declaration);
    }

    // Items nested in function bodies or impls cannot be named from other modules
    fn visit_item_fn(&mut self, _: &'ast syn::ItemFn) {}

    fn visit_item_impl(&mut self, _: &'ast syn::ItemImpl) {}

    fn visit_item_trait(&mut self, _: &'ast syn::ItemTrait) {}

    fn visit_item_const(&mut self, _: &'ast syn::ItemConst) {}

    fn visit_item_static(&mut self, _: &'ast syn::ItemStatic) {}
}

fn is_cfg_test(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && matches!(&attr.meta, Meta::List(list) if list.tokens.to_string() == "test")
    })
}

/// Module path of a source file under `src_dir` (`src/models/user.rs` -> `models::user`)
///
/// `lib.rs`, `main.rs` and `mod.rs` name their directory's module. Returns
/// `None` for files outside `src_dir` or with a non-UTF-8 path.
pub fn namespace_from_path(src_dir: &Path, file: &Path) -> Option<Namespace> {
    let relative = file.strip_prefix(src_dir).ok()?;
    let mut segments = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .map(|component| component.as_os_str().to_str().map(str::to_owned))
        .collect::<Option<Vec<_>>>()?;

    let stem = relative.file_stem()?.to_str()?;
    let root = segments.is_empty() && matches!(stem, "lib" | "main");
    if !root && stem != "mod" {
        segments.push(stem.to_owned());
    }
    Some(Namespace::new(segments))
}

/// Parse `source` and collect its tagged structs
pub fn discover_source(
    source: &str,
    namespace: Namespace,
    origin: Option<&Path>,
) -> DtoGenResult<Vec<ModelDeclaration>> {
    let file = syn::parse_file(source).map_err(|e| DtoGenError::Parse {
        path: origin.map_or_else(|| PathBuf::from("<source>"), Path::to_path_buf),
        message: e.to_string(),
        span: e.span(),
    })?;
    Ok(DeclarationVisitor::collect(
        &file,
        namespace,
        origin.map(Path::to_path_buf),
    ))
}

/// Everything found under a source directory
#[derive(Debug, Default)]
pub struct Discovery {
    pub declarations: Vec<ModelDeclaration>,
    /// Every `.rs` file visited, sorted
    pub files: Vec<PathBuf>,
    /// Files that could not be read or parsed
    pub errors: Vec<DtoGenError>,
}

/// Discover every tagged struct under `src_dir`, visiting files in sorted order
///
/// Unreadable or unparsable files are recorded in [`Discovery::errors`]; only a
/// directory that cannot be listed fails the whole call.
pub fn discover_dir(src_dir: &Path) -> Result<Discovery> {
    let mut discovery = Discovery::default();
    collect_rust_files(src_dir, &mut discovery.files)
        .with_context(|| format!("failed to list sources under {}", src_dir.display()))?;
    discovery.files.sort();

    for file in &discovery.files {
        let Some(namespace) = namespace_from_path(src_dir, file) else {
            log::warn!("skipping {}: not a module path", file.display());
            continue;
        };

        let source = match fs::read_to_string(file) {
            Ok(source) => source,
            Err(e) => {
                discovery.errors.push(DtoGenError::Io {
                    path: file.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        match discover_source(&source, namespace, Some(file)) {
            Ok(found) => {
                log::debug!("{}: {} tagged struct(s)", file.display(), found.len());
                discovery.declarations.extend(found);
            }
            Err(error) => discovery.errors.push(error),
        }
    }

    Ok(discovery)
}

fn collect_rust_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_rust_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    Ok(())
}
