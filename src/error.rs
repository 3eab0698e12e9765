use std::fmt;
use std::path::PathBuf;

use proc_macro2::Span;
use serde::Serialize;
use strum::Display;
use thiserror::Error;

pub type DtoGenResult<T> = Result<T, DtoGenError>;

/// Every failure the generator can report.
///
/// Errors are always scoped to one declaration (and, where it applies, one
/// member of it). The orchestrator turns them into [`Diagnostic`]s and keeps
/// going with the rest of the batch.
#[derive(Error, Debug, Clone)]
pub enum DtoGenError {
    #[error("argument `{argument}` of #[{annotation}] on `{target}` is not a compile-time constant: `{expression}`")]
    UnresolvedConstant {
        target: String,
        annotation: String,
        argument: String,
        expression: String,
        span: Span,
    },
    #[error("invalid model declaration `{model}`: {reason}")]
    InvalidModelDeclaration {
        model: String,
        reason: String,
        span: Span,
    },
    #[error("member `{member}` of `{model}` carries both #[has_conversion] and #[has_indirect_conversion]")]
    ConflictingConversionAnnotations {
        model: String,
        member: String,
        span: Span,
    },
    #[error("member `{member}` of `{model}`: cannot resolve converter: {reason}")]
    UnresolvedConverter {
        model: String,
        member: String,
        reason: String,
        span: Span,
    },
    #[error("derived type `{derived}` (from `{model}`) collides with the one derived from `{first_model}` in namespace `{namespace}`")]
    DuplicateDerivedName {
        model: String,
        derived: String,
        first_model: String,
        namespace: String,
        span: Span,
    },
    #[error("invalid #[{annotation}] on `{target}`: {reason}")]
    InvalidAnnotation {
        target: String,
        annotation: String,
        reason: String,
        span: Span,
    },
    #[error("failed to parse {}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        message: String,
        span: Span,
    },
    #[error("failed to read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
    #[error("invalid generator configuration `{field}`: {message}")]
    InvalidConfig { field: &'static str, message: String },
}

impl DtoGenError {
    /// Source span of the offending tokens, when there is one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnresolvedConstant { span, .. }
            | Self::InvalidModelDeclaration { span, .. }
            | Self::ConflictingConversionAnnotations { span, .. }
            | Self::UnresolvedConverter { span, .. }
            | Self::DuplicateDerivedName { span, .. }
            | Self::InvalidAnnotation { span, .. }
            | Self::Parse { span, .. } => Some(*span),
            Self::Io { .. } | Self::InvalidConfig { .. } => None,
        }
    }

    /// Name of the declaration this error belongs to.
    ///
    /// Marker errors only know their [`target`](Self::target), which is either
    /// the declaration or one of its members; they return `None` here.
    pub fn declaration(&self) -> Option<&str> {
        match self {
            Self::InvalidModelDeclaration { model, .. }
            | Self::ConflictingConversionAnnotations { model, .. }
            | Self::UnresolvedConverter { model, .. }
            | Self::DuplicateDerivedName { model, .. } => Some(model),
            Self::UnresolvedConstant { .. }
            | Self::InvalidAnnotation { .. }
            | Self::Parse { .. }
            | Self::Io { .. }
            | Self::InvalidConfig { .. } => None,
        }
    }

    /// The struct or field carrying the offending marker.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::UnresolvedConstant { target, .. } | Self::InvalidAnnotation { target, .. } => {
                Some(target)
            }
            _ => None,
        }
    }

    /// Name of the member this error belongs to, for member-scoped errors.
    pub fn member(&self) -> Option<&str> {
        match self {
            Self::ConflictingConversionAnnotations { member, .. }
            | Self::UnresolvedConverter { member, .. } => Some(member),
            _ => None,
        }
    }

    pub fn to_syn_error(&self) -> syn::Error {
        syn::Error::new(self.span().unwrap_or_else(Span::call_site), self.to_string())
    }
}

impl From<DtoGenError> for syn::Error {
    fn from(error: DtoGenError) -> Self {
        error.to_syn_error()
    }
}

/// All errors raised while describing or synthesizing one declaration.
#[derive(Error, Debug, Clone)]
#[error("{} error(s) while processing `{declaration}`", .errors.len())]
pub struct DeclarationErrors {
    pub declaration: String,
    pub errors: Vec<DtoGenError>,
}

impl DeclarationErrors {
    /// Fold every error into one `syn::Error` so a macro can report all of them at once.
    pub fn to_syn_error(&self) -> syn::Error {
        let mut iter = self.errors.iter().map(DtoGenError::to_syn_error);
        let mut combined = iter
            .next()
            .unwrap_or_else(|| syn::Error::new(Span::call_site(), self.to_string()));
        for error in iter {
            combined.combine(error);
        }
        combined
    }
}

impl IntoIterator for DeclarationErrors {
    type Item = DtoGenError;
    type IntoIter = std::vec::IntoIter<DtoGenError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Error collector for accumulating the errors of one declaration
#[derive(Debug)]
pub struct ErrorCollector {
    declaration: String,
    errors: Vec<DtoGenError>,
}

impl ErrorCollector {
    pub fn new(declaration: impl Into<String>) -> Self {
        Self {
            declaration: declaration.into(),
            errors: Vec::new(),
        }
    }

    pub fn add(&mut self, error: DtoGenError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = DtoGenError>) {
        self.errors.extend(errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Finish without a value; the declaration failed.
    pub fn into_errors(self) -> DeclarationErrors {
        DeclarationErrors {
            declaration: self.declaration,
            errors: self.errors,
        }
    }

    /// Convert into a Result with a value, failing with every collected error if any exist
    pub fn into_result_with<T>(self, value: T) -> Result<T, DeclarationErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(DeclarationErrors {
                declaration: self.declaration,
                errors: self.errors,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Where a diagnostic points in the user's sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: Option<PathBuf>,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file.display(), self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// A user-visible report attributable to one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub declaration: Option<String>,
    pub member: Option<String>,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn from_error(error: &DtoGenError, file: Option<PathBuf>) -> Self {
        let file = match error {
            DtoGenError::Parse { path, .. } | DtoGenError::Io { path, .. } => Some(path.clone()),
            _ => file,
        };
        // Line 0 means the span carries no location (e.g. call_site inside a proc macro).
        let location = error
            .span()
            .map(|span| span.start())
            .filter(|start| start.line > 0)
            .map(|start| SourceLocation {
                file: file.clone(),
                line: start.line,
                column: start.column + 1,
            })
            .or_else(|| {
                file.map(|file| SourceLocation {
                    file: Some(file),
                    line: 0,
                    column: 0,
                })
            });

        Self {
            severity: Severity::Error,
            message: error.to_string(),
            declaration: error.declaration().map(str::to_owned),
            member: error.member().map(str::to_owned),
            location,
        }
    }

    /// Diagnostic for an error raised while processing `declaration`.
    ///
    /// A marker error whose target is not the declaration itself was raised on
    /// one of its members.
    pub fn in_declaration(error: &DtoGenError, declaration: &str, file: Option<PathBuf>) -> Self {
        let member = error
            .member()
            .or_else(|| error.target().filter(|target| *target != declaration))
            .map(str::to_owned);
        Self {
            declaration: Some(declaration.to_owned()),
            member,
            ..Self::from_error(error, file)
        }
    }

    /// A problem the pass stepped around, like a source file it could not read.
    pub fn warning(error: &DtoGenError, file: Option<PathBuf>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::from_error(error, file)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) if location.line > 0 => {
                write!(f, "{}: {} ({})", self.severity, self.message, location)
            }
            _ => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}
