//! Namespace grouping and import aggregation
//!
//! Derived declarations are grouped into one [`SynthesizedUnit`] per source
//! namespace, in order of first appearance. Each unit carries the imports of
//! the declarations contributing to it: deduplicated by text, first-seen order,
//! and never pointing into the generator's own output namespace.

use std::collections::{HashMap, HashSet};

use super::model::DerivedDeclaration;
use crate::error::DtoGenError;
use crate::parse::{Import, Namespace};

/// All derived types sharing one namespace.
#[derive(Debug, Clone)]
pub struct SynthesizedUnit {
    pub namespace: Namespace,
    pub imports: Vec<Import>,
    pub declarations: Vec<DerivedDeclaration>,
}

impl SynthesizedUnit {
    pub fn declaration(&self, name: &str) -> Option<&DerivedDeclaration> {
        self.declarations.iter().find(|d| d.ident == name)
    }
}

/// Append-only, first-seen-ordered set of imports.
///
/// Imports inside the reserved namespace are refused. Adding the same imports
/// again (in any order) never removes or reorders what is already there.
#[derive(Debug, Clone)]
pub struct ImportAggregator {
    reserved: Vec<String>,
    seen: HashSet<Import>,
    ordered: Vec<Import>,
}

impl ImportAggregator {
    /// `reserved` are the absolute segments of the generator's output namespace.
    pub fn new(reserved: Vec<String>) -> Self {
        Self {
            reserved,
            seen: HashSet::new(),
            ordered: Vec::new(),
        }
    }

    /// Whether the import points into the reserved namespace.
    pub fn is_self_import(&self, import: &Import) -> bool {
        import.is_within(&self.reserved)
    }

    /// Add one import; returns whether it was new and allowed.
    pub fn add(&mut self, import: &Import) -> bool {
        if self.is_self_import(import) {
            log::trace!("skipping self-import `{import}`");
            return false;
        }
        if !self.seen.insert(import.clone()) {
            return false;
        }
        self.ordered.push(import.clone());
        true
    }

    pub fn extend<'a>(&mut self, imports: impl IntoIterator<Item = &'a Import>) {
        for import in imports {
            self.add(import);
        }
    }

    pub fn imports(&self) -> &[Import] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn into_imports(self) -> Vec<Import> {
        self.ordered
    }
}

/// Groups derived declarations by namespace.
#[derive(Debug, Clone)]
pub struct NamespaceGrouper {
    reserved: Vec<String>,
}

/// Result of grouping a batch.
#[derive(Debug, Clone, Default)]
pub struct Grouped {
    pub units: Vec<SynthesizedUnit>,
    /// Declarations dropped because their derived name was already taken.
    pub errors: Vec<DtoGenError>,
}

impl NamespaceGrouper {
    pub fn new(reserved: Vec<String>) -> Self {
        Self { reserved }
    }

    /// Group `declarations` (in batch order) into units.
    ///
    /// Units appear in order of their namespace's first declaration; within a
    /// unit, declarations keep batch order. A derived name already used in the
    /// same namespace is a [`DtoGenError::DuplicateDerivedName`] and the later
    /// declaration is left out.
    pub fn group(&self, declarations: Vec<DerivedDeclaration>) -> Grouped {
        let mut grouped = Grouped::default();
        let mut aggregators: Vec<ImportAggregator> = Vec::new();
        let mut unit_index: HashMap<Namespace, usize> = HashMap::new();
        let mut names: HashMap<(Namespace, String), String> = HashMap::new();

        for declaration in declarations {
            let key = (declaration.namespace.clone(), declaration.name());
            if let Some(first_model) = names.get(&key) {
                grouped.errors.push(DtoGenError::DuplicateDerivedName {
                    model: declaration.model_name.clone(),
                    derived: key.1.clone(),
                    first_model: first_model.clone(),
                    namespace: key.0.to_string(),
                    span: declaration.span,
                });
                continue;
            }
            names.insert(key, declaration.model_name.clone());

            let index = *unit_index
                .entry(declaration.namespace.clone())
                .or_insert_with(|| {
                    grouped.units.push(SynthesizedUnit {
                        namespace: declaration.namespace.clone(),
                        imports: Vec::new(),
                        declarations: Vec::new(),
                    });
                    aggregators.push(ImportAggregator::new(self.reserved.clone()));
                    grouped.units.len() - 1
                });

            aggregators[index].extend(&declaration.imports);
            grouped.units[index].declarations.push(declaration);
        }

        for (unit, aggregator) in grouped.units.iter_mut().zip(aggregators) {
            unit.imports = aggregator.into_imports();
        }
        grouped
    }
}
