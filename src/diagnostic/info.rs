//! Structured diagnostic records for custom rendering.

use std::fmt;

use super::format::{format_diagnostic, DiagnosticOptions};

// ============================================================================
// Severity and Kind
// ============================================================================

/// Diagnostic severity.
///
/// Every directive problem found during composition is reported as an error;
/// the warning level is available to hosts layering their own checks onto the
/// same sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A problem that compromises the composed output.
    Error,
    /// Advisory only; the composed output is intact.
    Warning,
}

/// What went wrong on a directive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A directive whose shape is wrong, such as a pragma with the wrong
    /// word count or an include reference missing its closing delimiter.
    MalformedDirective,
    /// An include reference that is neither bracketed, quoted, nor
    /// resource-tagged.
    UnrecognizedReference,
    /// An include reference that resolved to nothing.
    UnresolvedInclude,
    /// A pragma keyword with no registered handler.
    UnregisteredPragma,
    /// A pragma instruction its handler refused.
    RejectedPragmaInstruction,
    /// A quoted include inside virtual content, which has no directory to
    /// resolve against.
    RelativeIncludeFromVirtual,
    /// A second registration for a pragma keyword that already has a handler.
    DuplicatePragma,
    /// A file name that no stage-table suffix matches.
    UnknownPipelineStage,
}

// ============================================================================
// Diagnostic
// ============================================================================

/// One reported problem, with the origin it was observed at.
///
/// Line numbers refer to physical lines of the source the problem was found
/// in, not to positions in the composed output.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Problem category.
    pub kind: DiagnosticKind,
    /// Error severity (error or warning).
    pub severity: Severity,
    /// The error message.
    pub message: String,
    /// Display path of the source (if available).
    pub path: Option<String>,
    /// Line number (1-indexed, if available).
    pub line: Option<usize>,
    /// The offending source line, for snippet rendering (if available).
    pub snippet: Option<String>,
}

impl Diagnostic {
    /// An error diagnostic with no origin attached yet.
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            path: None,
            line: None,
            snippet: None,
        }
    }

    /// A warning diagnostic with no origin attached yet.
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, message)
        }
    }

    /// Attach the display path of the source.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach the 1-indexed physical line number.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach the offending source line for snippet rendering.
    pub fn with_snippet(mut self, line: impl Into<String>) -> Self {
        self.snippet = Some(line.into());
        self
    }

    /// Format with custom options.
    pub fn with_options<'a>(&'a self, options: &'a DiagnosticOptions) -> DiagnosticDisplay<'a> {
        DiagnosticDisplay {
            diagnostic: self,
            options,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_options(&DiagnosticOptions::default()).fmt(f)
    }
}

/// Display wrapper for formatting a single diagnostic with custom options.
pub struct DiagnosticDisplay<'a> {
    diagnostic: &'a Diagnostic,
    options: &'a DiagnosticOptions,
}

impl fmt::Display for DiagnosticDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut output = String::new();
        format_diagnostic(&mut output, self.diagnostic, self.options);
        f.write_str(&output)
    }
}

// ============================================================================
// DiagnosticSink
// ============================================================================

/// Sink collaborator that receives problems as they are found.
///
/// Composition never aborts on a bad directive; it reports through a sink and
/// keeps going. [`Diagnostics`] and `Vec<Diagnostic>` both implement this, and
/// hosts can implement it themselves to stream diagnostics elsewhere.
pub trait DiagnosticSink {
    /// Receive one diagnostic.
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

// ============================================================================
// DiagnosticSummary
// ============================================================================

/// Summary of diagnostic counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticSummary {
    /// Number of errors.
    pub errors: usize,
    /// Number of warnings.
    pub warnings: usize,
}

impl DiagnosticSummary {
    /// Create summary from a diagnostic list.
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        diagnostics.iter().fold(Self::default(), |mut acc, d| {
            match d.severity {
                Severity::Error => acc.errors += 1,
                Severity::Warning => acc.warnings += 1,
            }
            acc
        })
    }

    /// Total number of diagnostics.
    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }

    /// Whether there are any errors.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Whether there are any diagnostics at all.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for DiagnosticSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.errors, self.warnings) {
            (0, 0) => write!(f, "no diagnostics"),
            (e, 0) => write!(f, "{e} error{}", if e == 1 { "" } else { "s" }),
            (0, w) => write!(f, "{w} warning{}", if w == 1 { "" } else { "s" }),
            (e, w) => write!(
                f,
                "{e} error{}, {w} warning{}",
                if e == 1 { "" } else { "s" },
                if w == 1 { "" } else { "s" }
            ),
        }
    }
}

// ============================================================================
// Diagnostics (Collection)
// ============================================================================

/// A collection of diagnostics gathered during one composition call.
///
/// # Example
///
/// ```ignore
/// let result = compose(&registry, &fragments);
///
/// if result.diagnostics.has_errors() {
///     // Format with default options
///     eprintln!("{}", result.diagnostics);
///
///     // Or iterate for custom handling
///     for diag in result.diagnostics.iter() {
///         println!("{:?}: {}", diag.kind, diag.message);
///     }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty diagnostics collection.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create from a vector of diagnostics.
    pub fn from_vec(items: Vec<Diagnostic>) -> Self {
        Self { items }
    }

    /// Append one diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Check if there are no diagnostics.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    /// Check if there are any warnings.
    pub fn has_warnings(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Warning)
    }

    /// Count errors.
    pub fn error_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Count warnings.
    pub fn warning_count(&self) -> usize {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Get a summary of diagnostic counts.
    pub fn summary(&self) -> DiagnosticSummary {
        DiagnosticSummary {
            errors: self.error_count(),
            warnings: self.warning_count(),
        }
    }

    /// Iterate over all diagnostics, in the order they were reported.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Iterate over errors only.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Iterate over warnings only.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Iterate over diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    /// Format with custom options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use glsl_stitch::diagnostic::DiagnosticOptions;
    ///
    /// // Default formatting
    /// println!("{}", diagnostics);
    ///
    /// // Custom options
    /// let options = DiagnosticOptions::plain();
    /// println!("{}", diagnostics.with_options(&options));
    /// ```
    pub fn with_options<'a>(&'a self, options: &'a DiagnosticOptions) -> DiagnosticsDisplay<'a> {
        DiagnosticsDisplay {
            diagnostics: self,
            options,
        }
    }

    /// Convert to a vector of diagnostics.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }

    /// Get a slice of all diagnostics.
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Filter diagnostics, keeping only those that pass the predicate.
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Diagnostic) -> bool,
    {
        Self {
            items: self
                .items
                .iter()
                .filter(|d| predicate(d))
                .cloned()
                .collect(),
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DiagnosticsDisplay {
            diagnostics: self,
            options: &DiagnosticOptions::default(),
        }
        .fmt(f)
    }
}

/// Display wrapper for formatting diagnostics with custom options.
pub struct DiagnosticsDisplay<'a> {
    diagnostics: &'a Diagnostics,
    options: &'a DiagnosticOptions,
}

impl fmt::Display for DiagnosticsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Sort: errors first, then warnings
        let mut sorted: Vec<_> = self.diagnostics.items.iter().collect();
        sorted.sort_by_key(|d| match d.severity {
            Severity::Error => 0,
            Severity::Warning => 1,
        });

        for (i, diag) in sorted.iter().enumerate() {
            let mut output = String::new();
            format_diagnostic(&mut output, diag, self.options);
            f.write_str(&output)?;
            if i < sorted.len() - 1 {
                f.write_str("\n")?;
            }
        }

        Ok(())
    }
}
