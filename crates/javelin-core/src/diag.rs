//! Diagnostics.
//!
//! Recoverable binding problems never abort the pipeline: they are recorded
//! into a [`DiagnosticSink`] against a source position, the offending result
//! is replaced by a sentinel, and binding continues so one run can report as
//! many problems as possible. The driver fails the compilation afterwards if
//! anything was recorded.

use std::fmt;

use crate::name::Name;
use crate::span::LineColumn;

/// The closed set of diagnostic kinds Javelin can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    SymbolNotFound,
    AmbiguousName,
    CyclicHierarchy,
    InvalidAnnotationArgument,
    TypeMismatch,
    ModuleNotFound,
    DuplicateDeclaration,
    IllegalModifier,
    BadConstantExpression,
    CannotResolveToType,
    InternalAssertion,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::SymbolNotFound => "symbol-not-found",
            DiagnosticKind::AmbiguousName => "ambiguous-name",
            DiagnosticKind::CyclicHierarchy => "cyclic-hierarchy",
            DiagnosticKind::InvalidAnnotationArgument => "invalid-annotation-argument",
            DiagnosticKind::TypeMismatch => "type-mismatch",
            DiagnosticKind::ModuleNotFound => "module-not-found",
            DiagnosticKind::DuplicateDeclaration => "duplicate-declaration",
            DiagnosticKind::IllegalModifier => "illegal-modifier",
            DiagnosticKind::BadConstantExpression => "bad-constant-expression",
            DiagnosticKind::CannotResolveToType => "cannot-resolve-to-type",
            DiagnosticKind::InternalAssertion => "internal-assertion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Path of the source file the diagnostic applies to.
    pub file: Name,
    /// 1-based line and column.
    pub position: LineColumn,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        file: Name,
        position: LineColumn,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file,
            position,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.file,
            self.position,
            self.kind.code(),
            self.message
        )
    }
}

/// Accumulates diagnostics across all pipeline stages of one compilation.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
