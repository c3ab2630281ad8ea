//! Diagnostic reporting for composition problems.
//!
//! Bad directives never abort a composition; they are reported here and the
//! offending line is replaced with resynchronization markers in the output.

mod format;
mod info;

// Re-export all public types
pub use format::{format_diagnostic, DiagnosticOptions, DisplayStyle};
pub use info::{
    Diagnostic, DiagnosticDisplay, DiagnosticKind, DiagnosticSink, DiagnosticSummary, Diagnostics,
    DiagnosticsDisplay, Severity,
};
