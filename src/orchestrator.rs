//! Generation pass
//!
//! One pass runs description -> synthesis -> grouping -> rendering over a batch of
//! declarations. A declaration that fails is reported as a [`Diagnostic`] and
//! left out; every other declaration still reaches the output.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::annotations::AnnotationReader;
use crate::config::GeneratorConfig;
use crate::error::{DeclarationErrors, Diagnostic, DtoGenError, DtoGenResult};
use crate::generate::{
    AccessChecker, ConversionSynthesizer, DerivedDeclaration, NamespaceGrouper, Renderer, SynthesizedUnit,
};
use crate::parse::{ModelDeclaration, ModelDescriptor};

/// Result of one generation pass.
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    pub units: Vec<SynthesizedUnit>,
    /// One entry per error, in batch order.
    pub diagnostics: Vec<Diagnostic>,
    /// The rendered output file.
    pub source: String,
}

impl GenerationOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Every derived declaration across all units.
    pub fn declarations(&self) -> impl Iterator<Item = &DerivedDeclaration> {
        self.units.iter().flat_map(|unit| &unit.declarations)
    }

    pub fn declaration(&self, name: &str) -> Option<&DerivedDeclaration> {
        self.declarations().find(|d| d.ident == name)
    }
}

/// Drives a generation pass.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    reader: AnnotationReader,
    access: AccessChecker,
    synthesizer: ConversionSynthesizer,
    grouper: NamespaceGrouper,
    renderer: Renderer,
}

impl Generator {
    /// Fails when the configuration is invalid.
    pub fn new(config: GeneratorConfig) -> DtoGenResult<Self> {
        config.validate()?;
        Ok(Self {
            reader: AnnotationReader::new(),
            access: AccessChecker::from_config(&config)?,
            synthesizer: ConversionSynthesizer::from_config(&config)?,
            grouper: NamespaceGrouper::new(config.reserved_segments()),
            renderer: Renderer::from_config(&config)?,
            config,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run a full pass over `declarations`.
    ///
    /// Identical batches (same declarations, same order) give byte-identical output.
    pub fn run(&self, declarations: &[ModelDeclaration]) -> GenerationOutput {
        let never = AtomicBool::new(false);
        // Only a cancelled pass returns None
        self.run_cancellable(declarations, &never)
            .unwrap_or_default()
    }

    /// Like [`Generator::run`], checking `cancel` before each declaration.
    ///
    /// Returns `None` once cancellation is observed; declarations finished up to
    /// that point are dropped untouched.
    pub fn run_cancellable(
        &self,
        declarations: &[ModelDeclaration],
        cancel: &AtomicBool,
    ) -> Option<GenerationOutput> {
        let mut diagnostics = Vec::new();
        let mut derived = Vec::with_capacity(declarations.len());

        for declaration in declarations {
            if cancel.load(Ordering::Relaxed) {
                log::debug!("generation cancelled after {} declaration(s)", derived.len());
                return None;
            }

            match self.process(declaration) {
                Ok(declaration) => derived.push(declaration),
                Err(errors) => {
                    log::debug!("{errors}");
                    report(&mut diagnostics, errors, declaration.origin.as_ref());
                }
            }
        }

        if cancel.load(Ordering::Relaxed) {
            return None;
        }

        let origins: Vec<(String, Option<PathBuf>)> = derived
            .iter()
            .map(|d| (d.model_name.clone(), d.origin.clone()))
            .collect();
        let grouped = self.grouper.group(derived);
        for error in &grouped.errors {
            let origin = origins
                .iter()
                .find(|(model, _)| Some(model.as_str()) == error.declaration())
                .and_then(|(_, origin)| origin.clone());
            diagnostics.push(Diagnostic::from_error(error, origin));
        }

        let source = match self.renderer.render(&grouped.units) {
            Ok(source) => source,
            Err(error) => {
                diagnostics.push(Diagnostic::from_error(&error, None));
                String::new()
            }
        };

        log::info!(
            "generated {} derived type(s) in {} namespace(s), {} diagnostic(s)",
            grouped.units.iter().map(|u| u.declarations.len()).sum::<usize>(),
            grouped.units.len(),
            diagnostics.len()
        );

        Some(GenerationOutput {
            units: grouped.units,
            diagnostics,
            source,
        })
    }

    fn process(
        &self,
        declaration: &ModelDeclaration,
    ) -> Result<DerivedDeclaration, DeclarationErrors> {
        let descriptor = ModelDescriptor::build_with(declaration, self.reader)?;
        let access = self.access.check(&descriptor);
        match (access, self.synthesizer.synthesize(&descriptor)) {
            (Ok(()), derived) => derived,
            (Err(errors), Ok(_)) => Err(errors),
            (Err(mut errors), Err(more)) => {
                errors.errors.extend(more);
                Err(errors)
            }
        }
    }
}

fn report(diagnostics: &mut Vec<Diagnostic>, errors: DeclarationErrors, origin: Option<&PathBuf>) {
    let declaration = errors.declaration.clone();
    diagnostics.extend(errors.into_iter().map(|error: DtoGenError| {
        Diagnostic::in_declaration(&error, &declaration, origin.cloned())
    }));
}
