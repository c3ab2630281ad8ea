//! Pragma extension points.
//!
//! Hosts register a handler per pragma keyword. During composition, a line of
//! the form `#pragma <keyword> <instruction>` is routed to the handler for
//! `<keyword>`, which may append replacement text through a [`PragmaWriter`].

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::diagnostic::{Diagnostic, DiagnosticKind};

// ============================================================================
// PragmaHandler
// ============================================================================

/// Handler invoked for `#pragma <keyword> <instruction>` lines.
///
/// Implemented for free by any `Fn(&str, &mut PragmaWriter<'_>) -> bool` that
/// is `Send + Sync`, so closures work directly:
///
/// ```
/// use glsl_stitch::registry::{PragmaWriter, Registry};
///
/// let mut registry = Registry::new();
/// registry
///     .register_pragma("unroll", |instruction: &str, out: &mut PragmaWriter<'_>| {
///         match instruction {
///             "on" => out.write_line("#pragma optionNV(unroll all)"),
///             "off" => out.write_line("#pragma optionNV(unroll none)"),
///             _ => return false,
///         }
///         true
///     })
///     .unwrap();
/// ```
pub trait PragmaHandler: Send + Sync {
    /// Handle one instruction, returning `false` to reject it.
    ///
    /// A rejected instruction is reported to the diagnostic sink; anything
    /// already written to `out` stays in the output either way.
    fn handle(&self, instruction: &str, out: &mut PragmaWriter<'_>) -> bool;
}

impl<F> PragmaHandler for F
where
    F: Fn(&str, &mut PragmaWriter<'_>) -> bool + Send + Sync,
{
    fn handle(&self, instruction: &str, out: &mut PragmaWriter<'_>) -> bool {
        self(instruction, out)
    }
}

// ============================================================================
// PragmaWriter
// ============================================================================

/// Append-only writer handed to pragma handlers.
///
/// Handlers can emit replacement text into the composed buffer; they cannot
/// rewind or inspect what was emitted before them.
pub struct PragmaWriter<'a> {
    out: &'a mut String,
}

impl<'a> PragmaWriter<'a> {
    pub(crate) fn new(out: &'a mut String) -> Self {
        Self { out }
    }

    /// Append text verbatim.
    pub fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Append text followed by a newline.
    pub fn write_line(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }
}

// ============================================================================
// PragmaTable
// ============================================================================

/// Keyword-indexed handler table.
///
/// The first registration for a keyword wins; later registrations are
/// rejected and the original handler stays in place.
#[derive(Default)]
pub struct PragmaTable {
    handlers: FxHashMap<String, Box<dyn PragmaHandler>>,
}

impl PragmaTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a keyword.
    ///
    /// Fails with [`DuplicatePragma`] if the keyword already has a handler.
    pub fn register(
        &mut self,
        keyword: impl Into<String>,
        handler: impl PragmaHandler + 'static,
    ) -> Result<(), DuplicatePragma> {
        let keyword = keyword.into();
        if self.handlers.contains_key(&keyword) {
            return Err(DuplicatePragma { keyword });
        }
        self.handlers.insert(keyword, Box::new(handler));
        Ok(())
    }

    /// Look up the handler for a keyword.
    pub fn get(&self, keyword: &str) -> Option<&dyn PragmaHandler> {
        self.handlers.get(keyword).map(Box::as_ref)
    }

    /// Whether a keyword has a handler.
    pub fn contains(&self, keyword: &str) -> bool {
        self.handlers.contains_key(keyword)
    }

    /// Number of registered keywords.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Iterate over registered keywords, in no particular order.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

/// Error returned when registering a pragma keyword that already has a
/// handler. The original registration is retained.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("pragma keyword {keyword:?} is already registered")]
pub struct DuplicatePragma {
    /// The keyword that was registered twice.
    pub keyword: String,
}

impl DuplicatePragma {
    /// Convert into a diagnostic record for sink-based reporting.
    pub fn into_diagnostic(self) -> Diagnostic {
        let message = self.to_string();
        Diagnostic::error(DiagnosticKind::DuplicatePragma, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_invoke() {
        let mut table = PragmaTable::new();
        table
            .register("define", |instruction: &str, out: &mut PragmaWriter<'_>| {
                out.write_line(&format!("#define {instruction} 1"));
                true
            })
            .unwrap();

        let mut output = String::new();
        let handler = table.get("define").unwrap();
        let accepted = handler.handle("DEBUG", &mut PragmaWriter::new(&mut output));
        assert!(accepted);
        assert_eq!(output, "#define DEBUG 1\n");
    }

    #[test]
    fn test_duplicate_keeps_original() {
        let mut table = PragmaTable::new();
        table
            .register("mode", |_: &str, out: &mut PragmaWriter<'_>| {
                out.write("first");
                true
            })
            .unwrap();

        let err = table
            .register("mode", |_: &str, out: &mut PragmaWriter<'_>| {
                out.write("second");
                true
            })
            .unwrap_err();
        assert_eq!(err.keyword, "mode");

        let mut output = String::new();
        table
            .get("mode")
            .unwrap()
            .handle("x", &mut PragmaWriter::new(&mut output));
        assert_eq!(output, "first");
    }

    #[test]
    fn test_rejection_keeps_partial_output() {
        let mut table = PragmaTable::new();
        table
            .register("half", |_: &str, out: &mut PragmaWriter<'_>| {
                out.write_line("partial");
                false
            })
            .unwrap();

        let mut output = String::new();
        let accepted = table
            .get("half")
            .unwrap()
            .handle("x", &mut PragmaWriter::new(&mut output));
        assert!(!accepted);
        assert_eq!(output, "partial\n");
    }

    #[test]
    fn test_duplicate_into_diagnostic() {
        let err = DuplicatePragma {
            keyword: "loop".into(),
        };
        let diag = err.into_diagnostic();
        assert_eq!(diag.kind, DiagnosticKind::DuplicatePragma);
        assert!(diag.message.contains("\"loop\""));
    }
}
