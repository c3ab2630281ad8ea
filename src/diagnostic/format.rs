//! Diagnostic formatting utilities.

use std::fmt::Write;

use super::info::{Diagnostic, Severity};

// ============================================================================
// Options
// ============================================================================

/// Display style for diagnostic output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayStyle {
    /// Rich output with the offending source line underlined.
    #[default]
    Rich,
    /// Short output with just file:line and message.
    Short,
}

/// Options for controlling diagnostic formatting.
///
/// # Example
///
/// ```
/// use glsl_stitch::diagnostic::{DiagnosticOptions, DisplayStyle};
///
/// // Default: colored rich output
/// let opts = DiagnosticOptions::default();
///
/// // Plain text (no ANSI colors) for logging
/// let opts = DiagnosticOptions::plain();
///
/// // Short format for CI/IDE integration
/// let opts = DiagnosticOptions::short();
///
/// // Custom configuration
/// let opts = DiagnosticOptions::default()
///     .with_colored(false)
///     .with_style(DisplayStyle::Rich)
///     .with_snippets(false);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticOptions {
    /// Whether to use ANSI colors in output.
    pub colored: bool,
    /// Display style (rich with snippets or short).
    pub style: DisplayStyle,
    /// Whether to include the offending source line.
    pub snippets: bool,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            colored: true,
            style: DisplayStyle::Rich,
            snippets: true,
        }
    }
}

impl DiagnosticOptions {
    /// Create options for colored terminal output.
    pub fn colored() -> Self {
        Self::default()
    }

    /// Create options for plain text output (no ANSI colors).
    pub fn plain() -> Self {
        Self {
            colored: false,
            ..Self::default()
        }
    }

    /// Create options for short format (file:line: message).
    pub fn short() -> Self {
        Self {
            style: DisplayStyle::Short,
            snippets: false,
            ..Self::default()
        }
    }

    /// Set whether to use colors.
    pub fn with_colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Set display style.
    pub fn with_style(mut self, style: DisplayStyle) -> Self {
        self.style = style;
        self
    }

    /// Set whether to include the offending source line.
    pub fn with_snippets(mut self, snippets: bool) -> Self {
        self.snippets = snippets;
        self
    }
}

// ============================================================================
// Gutter Characters
// ============================================================================

/// Box-drawing characters for source line display.
mod gutter {
    pub const HEADER: &str = "┌─";
    pub const BAR: &str = "│";
    pub const MARKER: &str = "^";
}

// ============================================================================
// Coloring
// ============================================================================

/// Apply color to text based on severity.
#[cfg(feature = "colored-diagnostics")]
fn colorize(text: &str, severity: Severity) -> String {
    use owo_colors::OwoColorize;
    match severity {
        Severity::Error => text.red().to_string(),
        Severity::Warning => text.yellow().to_string(),
    }
}

#[cfg(not(feature = "colored-diagnostics"))]
fn colorize(text: &str, _severity: Severity) -> String {
    text.to_owned()
}

/// Get paint function based on options.
fn get_paint_fn(options: &DiagnosticOptions, severity: Severity) -> Box<dyn Fn(&str) -> String> {
    if options.colored {
        Box::new(move |s| colorize(s, severity))
    } else {
        Box::new(|s: &str| s.to_owned())
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Format a single diagnostic into the output string.
pub fn format_diagnostic(output: &mut String, diagnostic: &Diagnostic, options: &DiagnosticOptions) {
    let label = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    let paint = get_paint_fn(options, diagnostic.severity);

    match options.style {
        DisplayStyle::Short => format_short(output, diagnostic, label, &paint),
        DisplayStyle::Rich => format_rich(output, diagnostic, label, &paint, options),
    }
}

/// Format in short style: "file:line: severity: message"
fn format_short(
    output: &mut String,
    diagnostic: &Diagnostic,
    label: &str,
    paint: &dyn Fn(&str) -> String,
) {
    match (&diagnostic.path, diagnostic.line) {
        (Some(path), Some(line)) => {
            _ = writeln!(output, "{}:{}: {}: {}", path, line, paint(label), diagnostic.message);
        }
        (Some(path), None) => {
            _ = writeln!(output, "{}: {}: {}", path, paint(label), diagnostic.message);
        }
        _ => {
            _ = writeln!(output, "{}: {}", paint(label), diagnostic.message);
        }
    }
}

/// Format in rich style with the offending line underlined.
fn format_rich(
    output: &mut String,
    diagnostic: &Diagnostic,
    label: &str,
    paint: &dyn Fn(&str) -> String,
    options: &DiagnosticOptions,
) {
    // Header: "error: message"
    _ = writeln!(output, "{}: {}", paint(label), diagnostic.message);

    // Offending line (if enabled and available)
    if options.snippets
        && let (Some(path), Some(line), Some(snippet)) =
            (&diagnostic.path, diagnostic.line, &diagnostic.snippet)
    {
        write_snippet(output, path, line, snippet, paint);
    }
}

/// Write the offending line with a gutter header and underline marker.
fn write_snippet(
    output: &mut String,
    path: &str,
    line: usize,
    snippet: &str,
    paint: &dyn Fn(&str) -> String,
) {
    let line_num_width = line.to_string().len().max(1);
    let line_num_str = format!("{line:>line_num_width$}");

    // Header: "  ┌─ path:line"
    _ = writeln!(
        output,
        "{:>width$} {} {}:{}",
        "",
        paint(gutter::HEADER),
        path,
        line,
        width = line_num_width
    );

    // Empty gutter: "  │"
    _ = writeln!(
        output,
        "{:>width$} {}",
        "",
        paint(gutter::BAR),
        width = line_num_width
    );

    // Source line: "12 │ #pragma nope off"
    _ = writeln!(
        output,
        "{} {} {}",
        paint(&line_num_str),
        paint(gutter::BAR),
        snippet
    );

    // Marker line: "   │ ^^^^^^^^^^^^^^^^"
    let markers = gutter::MARKER.repeat(snippet.chars().count().max(1));
    _ = writeln!(
        output,
        "{:>width$} {} {}",
        "",
        paint(gutter::BAR),
        paint(&markers),
        width = line_num_width
    );
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;

    fn sample() -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::UnresolvedInclude,
            "unable to resolve include \"lighting.glsl\"",
        )
        .with_path("shaders/main.frag")
        .with_line(7)
        .with_snippet("#include \"lighting.glsl\"")
    }

    #[test]
    fn test_short_format() {
        let mut output = String::new();
        let options = DiagnosticOptions::short().with_colored(false);
        format_diagnostic(&mut output, &sample(), &options);
        assert_eq!(
            output,
            "shaders/main.frag:7: error: unable to resolve include \"lighting.glsl\"\n"
        );
    }

    #[test]
    fn test_rich_format_underlines_offending_line() {
        let mut output = String::new();
        format_diagnostic(&mut output, &sample(), &DiagnosticOptions::plain());
        assert!(output.starts_with("error: unable to resolve include"));
        assert!(output.contains("shaders/main.frag:7"));
        assert!(output.contains("#include \"lighting.glsl\""));
        assert!(output.contains("^^^^^"));
    }

    #[test]
    fn test_rich_format_without_origin() {
        let mut output = String::new();
        let diag = Diagnostic::error(
            DiagnosticKind::DuplicatePragma,
            "pragma keyword \"loop\" is already registered",
        );
        format_diagnostic(&mut output, &diag, &DiagnosticOptions::plain());
        assert_eq!(output, "error: pragma keyword \"loop\" is already registered\n");
    }

    #[test]
    fn test_snippets_can_be_disabled() {
        let mut output = String::new();
        let options = DiagnosticOptions::plain().with_snippets(false);
        format_diagnostic(&mut output, &sample(), &options);
        assert_eq!(
            output,
            "error: unable to resolve include \"lighting.glsl\"\n"
        );
    }
}
