//! Recursive composition of shader source fragments.
//!
//! [`Composer::compose`] flattens an ordered list of [`Fragment`]s into one
//! compiler-ready buffer. Exactly one `#version` line is emitted up front;
//! include directives are expanded in place with include-once semantics per
//! call; pragma directives are routed to registered handlers; `#line` markers
//! keep every output line attributable to a (line, slot) position in the
//! original sources.
//!
//! Each expanded unit gets a slot id: top-level fragments own their index,
//! and nested expansions allocate upward from `fragments.len()` in
//! first-expansion order. A compiler error reported at `(line, slot)` in the
//! composed buffer therefore points back into the exact source that produced
//! the line.
//!
//! Directive problems never abort a call. They are reported to the diagnostic
//! sink, the offending line contributes resynchronization output, and
//! composition continues; a buffer is always produced.
//!
//! # Example
//!
//! ```
//! use glsl_stitch::compose::{compose, Fragment};
//! use glsl_stitch::registry::Registry;
//!
//! let mut registry = Registry::new();
//! registry.add_virtual_file("lib", "float x = 1.0;\n");
//!
//! let fragments = [Fragment::new(
//!     "#version 000\n#include <lib>\nvoid main() {}\n",
//!     "main.frag",
//! )];
//! let result = compose(&registry, &fragments);
//!
//! assert!(result.text.starts_with("#version 450 core\n"));
//! assert!(result.text.contains("float x = 1.0;"));
//! assert!(result.diagnostics.is_empty());
//! ```

use std::borrow::Cow;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::config::GlslVersion;
use crate::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, Diagnostics};
use crate::registry::{PragmaWriter, Registry};
use crate::resolve::{self, DiskFile, Resolved, ResolveError};

// Directive markers, recognized at the start of a line after stripping
// leading whitespace.
const VERSION_MARKER: &str = "#version";
const PRAGMA_MARKER: &str = "#pragma";
const INCLUDE_MARKER: &str = "#include";

/// Directory stand-in for sources whose display path has no parent.
const CURRENT_DIR: &str = ".";
/// Directory stand-in for resource content. It never exists on disk, so
/// quoted includes inside resources only ever reach the search paths.
const RESOURCE_DIR: &str = "<resource>";

// ============================================================================
// Fragment
// ============================================================================

/// One contiguous unit of shader source submitted for composition.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Raw source text.
    pub text: String,
    /// Display path, used for directory context and diagnostics.
    pub path: String,
    /// Whether the text came from an in-memory overlay rather than disk.
    ///
    /// Origin metadata for hosts, carried by [`resolve_file`] conversions.
    /// Top-level fragments always compose as non-virtual; only content
    /// reached through the virtual-file table during expansion is subject
    /// to the quoted-include restriction.
    ///
    /// [`resolve_file`]: crate::resolve::resolve_file
    pub is_virtual: bool,
}

impl Fragment {
    /// A fragment backed by a file path (or any displayable origin).
    pub fn new(text: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            path: path.into(),
            is_virtual: false,
        }
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Sink collaborator recording the real files a composition pulled in.
///
/// Build systems implement this to invalidate cached compilations when an
/// included file changes. `Vec<PathBuf>` implements it for the common case.
pub trait DependencySink {
    /// Record one real file path the composed output depends on.
    fn add_dependency(&mut self, path: &Path);
}

impl DependencySink for Vec<PathBuf> {
    fn add_dependency(&mut self, path: &Path) {
        self.push(path.to_path_buf());
    }
}

// ============================================================================
// Composed
// ============================================================================

/// Everything produced by one composition call.
#[derive(Debug)]
pub struct Composed {
    /// The flattened, directive-resolved buffer. Always produced, even when
    /// diagnostics were reported.
    pub text: String,
    /// Real file paths pulled in through the filesystem, in resolution order.
    /// Virtual files and resources are never recorded here.
    pub dependencies: Vec<PathBuf>,
    /// Problems reported along the way.
    pub diagnostics: Diagnostics,
}

impl Composed {
    /// Whether any errors were reported.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

// ============================================================================
// Composer
// ============================================================================

/// Composes fragment lists against a registry.
///
/// The registry is borrowed for the composer's lifetime and never mutated;
/// per-call state (the visited set, the slot allocator) is fresh on every
/// [`compose`](Composer::compose) call.
pub struct Composer<'r> {
    registry: &'r Registry,
    version: GlslVersion,
}

impl<'r> Composer<'r> {
    /// A composer with the default version line.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            version: GlslVersion::default(),
        }
    }

    /// Set the version line emitted at the top of the buffer.
    pub fn with_version(mut self, version: GlslVersion) -> Self {
        self.version = version;
        self
    }

    /// Compose fragments, collecting dependencies and diagnostics.
    pub fn compose(&self, fragments: &[Fragment]) -> Composed {
        let mut dependencies = Vec::new();
        let mut diagnostics = Diagnostics::new();
        let text = self.compose_into(fragments, &mut dependencies, &mut diagnostics);
        Composed {
            text,
            dependencies,
            diagnostics,
        }
    }

    /// Compose fragments, reporting into caller-supplied collaborators.
    ///
    /// A buffer is always returned; check the diagnostic sink for problems.
    pub fn compose_into(
        &self,
        fragments: &[Fragment],
        dependencies: &mut dyn DependencySink,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> String {
        let mut pass = Composition {
            registry: self.registry,
            out: String::new(),
            visited: FxHashSet::default(),
            next_slot: fragments.len(),
            dependencies,
            diagnostics,
        };

        pass.out.push_str(&self.version.version_line());
        pass.out.push('\n');

        for (slot, fragment) in fragments.iter().enumerate() {
            let dir = parent_dir(Path::new(&fragment.path));
            pass.process(&fragment.text, &fragment.path, slot, &dir, false);
        }

        pass.out
    }
}

/// Compose fragments with the default version line.
///
/// Shorthand for `Composer::new(registry).compose(fragments)`.
pub fn compose(registry: &Registry, fragments: &[Fragment]) -> Composed {
    Composer::new(registry).compose(fragments)
}

// ============================================================================
// Composition pass
// ============================================================================

/// Identity of an expanded include for at-most-once bookkeeping.
#[derive(Debug, PartialEq, Eq, Hash)]
enum VisitKey {
    /// Canonical filesystem identity.
    Path(PathBuf),
    /// Resource-table name.
    Resource(String),
}

/// Working state for one composition call.
struct Composition<'a> {
    registry: &'a Registry,
    out: String,
    visited: FxHashSet<VisitKey>,
    next_slot: usize,
    dependencies: &'a mut dyn DependencySink,
    diagnostics: &'a mut dyn DiagnosticSink,
}

impl Composition<'_> {
    /// Expand one source unit into the output buffer.
    ///
    /// `origin` is the display path for diagnostics, `slot` the marker id for
    /// this unit, `dir` the directory quoted includes resolve against.
    fn process(&mut self, text: &str, origin: &str, slot: usize, dir: &Path, is_virtual: bool) {
        let text = normalize_newlines(text);
        self.line_marker(1, slot);

        if text.is_empty() {
            return;
        }
        let body = text.strip_suffix('\n').unwrap_or(&text);
        for (index, raw) in body.split('\n').enumerate() {
            self.process_line(raw, origin, slot, index + 1, dir, is_virtual);
        }
    }

    fn process_line(
        &mut self,
        raw: &str,
        origin: &str,
        slot: usize,
        number: usize,
        dir: &Path,
        is_virtual: bool,
    ) {
        let line = raw.trim_start();
        if line.starts_with(VERSION_MARKER) {
            // Only the call-level version line survives.
            self.out.push('\n');
        } else if line.starts_with(PRAGMA_MARKER) {
            self.pragma_line(line, origin, slot, number);
        } else if line.starts_with(INCLUDE_MARKER) {
            self.include_line(line, origin, slot, number, dir, is_virtual);
        } else {
            self.out.push_str(raw);
            self.out.push('\n');
        }
    }

    /// Dispatch a `#pragma <keyword> <instruction>` line to its handler.
    fn pragma_line(&mut self, line: &str, origin: &str, slot: usize, number: usize) {
        let words: Vec<&str> = line.split_whitespace().collect();
        if let [_, keyword, instruction] = words.as_slice() {
            let registry = self.registry;
            match registry.pragma(keyword) {
                Some(handler) => {
                    let accepted =
                        handler.handle(instruction, &mut PragmaWriter::new(&mut self.out));
                    if !accepted {
                        self.report(
                            DiagnosticKind::RejectedPragmaInstruction,
                            format!(
                                "pragma keyword {keyword:?} rejected instruction {instruction:?}"
                            ),
                            origin,
                            number,
                            line,
                        );
                    }
                }
                None => {
                    self.report(
                        DiagnosticKind::UnregisteredPragma,
                        format!("no handler registered for pragma keyword {keyword:?}"),
                        origin,
                        number,
                        line,
                    );
                }
            }
        } else {
            self.report(
                DiagnosticKind::MalformedDirective,
                format!("pragma directives take exactly one keyword and one instruction: {line:?}"),
                origin,
                number,
                line,
            );
        }
        self.resync(slot, number);
    }

    /// Classify and expand a `#include` line.
    ///
    /// The reference form is picked by scanning the line for `<`, then any
    /// quote character, then `:`. First match wins, so a stray quote on an
    /// otherwise resource-tagged line classifies it as quoted.
    fn include_line(
        &mut self,
        line: &str,
        origin: &str,
        slot: usize,
        number: usize,
        dir: &Path,
        is_virtual: bool,
    ) {
        if let Some(open) = line.find('<') {
            match line[open + 1..].find('>') {
                Some(close) => {
                    let reference = &line[open + 1..open + 1 + close];
                    if let Err(err) = self.bracketed_include(reference) {
                        self.report(
                            DiagnosticKind::UnresolvedInclude,
                            err.to_string(),
                            origin,
                            number,
                            line,
                        );
                    }
                }
                None => {
                    self.report(
                        DiagnosticKind::MalformedDirective,
                        format!("missing closing '>' in include reference: {line:?}"),
                        origin,
                        number,
                        line,
                    );
                }
            }
        } else if line.contains('"') {
            if is_virtual {
                self.report(
                    DiagnosticKind::RelativeIncludeFromVirtual,
                    format!("relative include is not allowed inside virtual content: {line:?}"),
                    origin,
                    number,
                    line,
                );
            } else if let Err(err) = self.relative_include(quoted_reference(line), dir) {
                self.report(
                    DiagnosticKind::UnresolvedInclude,
                    err.to_string(),
                    origin,
                    number,
                    line,
                );
            }
        } else if let Some(colon) = line.find(':') {
            let name = line[colon + 1..].trim_end();
            if let Err(err) = self.resource_include(name) {
                self.report(
                    DiagnosticKind::UnresolvedInclude,
                    err.to_string(),
                    origin,
                    number,
                    line,
                );
            }
        } else {
            self.report(
                DiagnosticKind::UnrecognizedReference,
                format!("include reference not recognized: {line:?}"),
                origin,
                number,
                line,
            );
        }
        self.resync(slot, number);
    }

    /// Expand a bracketed reference.
    ///
    /// Virtual hits are expanded on every mention: they have no canonical
    /// path, bypass the visited set, and are never recorded as dependencies.
    fn bracketed_include(&mut self, reference: &str) -> Result<(), ResolveError> {
        match resolve::resolve_bracketed(self.registry, reference)? {
            Resolved::Virtual { text } => {
                let slot = self.allocate_slot();
                self.process(&text, reference, slot, Path::new(CURRENT_DIR), true);
            }
            Resolved::Disk(file) => self.expand_disk(file),
        }
        Ok(())
    }

    /// Expand a quoted reference against the including file's directory.
    fn relative_include(&mut self, reference: &str, dir: &Path) -> Result<(), ResolveError> {
        let file = resolve::resolve_relative(self.registry, reference, dir)?;
        self.expand_disk(file);
        Ok(())
    }

    /// Expand a resource reference, deduplicated by resource name.
    fn resource_include(&mut self, name: &str) -> Result<(), ResolveError> {
        let text = resolve::resolve_resource(self.registry, name)?;
        if self.visited.insert(VisitKey::Resource(name.to_owned())) {
            let slot = self.allocate_slot();
            self.process(text, name, slot, Path::new(RESOURCE_DIR), false);
        }
        Ok(())
    }

    /// Expand a filesystem hit, at most once per canonical path.
    ///
    /// The dependency list records the path as found, not its canonical form.
    fn expand_disk(&mut self, file: DiskFile) {
        let canonical = resolve::canonical_path(&file.path);
        if !self.visited.insert(VisitKey::Path(canonical)) {
            return;
        }

        self.dependencies.add_dependency(&file.path);
        let slot = self.allocate_slot();
        let dir = parent_dir(&file.path);
        let origin = file.path.display().to_string();
        self.process(&file.text, &origin, slot, &dir, false);
    }

    fn allocate_slot(&mut self) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    /// Emit `#line {line} {slot}`: the next output line reports as physical
    /// line `line` of source `slot`.
    fn line_marker(&mut self, line: usize, slot: usize) {
        _ = writeln!(self.out, "#line {line} {slot}");
    }

    /// Restore the marker to the current physical line and pad one blank
    /// line, keeping the one-to-one physical line accounting intact after a
    /// directive expanded to zero or many lines.
    fn resync(&mut self, slot: usize, number: usize) {
        self.line_marker(number, slot);
        self.out.push('\n');
    }

    fn report(
        &mut self,
        kind: DiagnosticKind,
        message: String,
        origin: &str,
        number: usize,
        snippet: &str,
    ) {
        self.diagnostics.report(
            Diagnostic::error(kind, message)
                .with_path(origin)
                .with_line(number)
                .with_snippet(snippet),
        );
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Fold all line-terminator forms to `\n`.
fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Directory context of a path, or the current-directory sentinel when it
/// has no parent.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from(CURRENT_DIR),
    }
}

/// The substring between the first and last quote character on the line.
fn quoted_reference(line: &str) -> &str {
    let first = line.find('"').map_or(0, |i| i + 1);
    let last = line.rfind('"').unwrap_or(0);
    if first <= last { &line[first..last] } else { "" }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    /// Replay `#line` markers the way a downstream compiler would, yielding
    /// each non-directive output line with its reported (line, slot).
    fn reported_positions(text: &str) -> Vec<(String, usize, usize)> {
        let mut positions = Vec::new();
        let mut line = 1usize;
        let mut slot = 0usize;
        for raw in text.lines() {
            if let Some(rest) = raw.trim_start().strip_prefix("#line") {
                let mut words = rest.split_whitespace();
                line = words.next().unwrap().parse().unwrap();
                slot = words.next().unwrap().parse().unwrap();
            } else {
                positions.push((raw.to_owned(), line, slot));
                line += 1;
            }
        }
        positions
    }

    #[test]
    fn test_virtual_include_golden_output() {
        let mut registry = Registry::new();
        registry.add_virtual_file("lib", "float x = 1.0;\n");

        let fragments = [Fragment::new(
            "#version 000\n#include <lib>\nvoid main(){}\n",
            "a.frag",
        )];
        let result = compose(&registry, &fragments);

        let expected = "#version 450 core\n\
                        #line 1 0\n\
                        \n\
                        #line 1 1\n\
                        float x = 1.0;\n\
                        #line 2 0\n\
                        \n\
                        void main(){}\n";
        assert_eq!(result.text, expected);
        assert!(result.dependencies.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_single_version_line_total() {
        let fragments = [
            Fragment::new("#version 330\nint a;\n", "a.vert"),
            Fragment::new("#version 330\nint b;\n", "b.vert"),
        ];
        let result = compose(&Registry::new(), &fragments);

        assert!(result.text.starts_with("#version 450 core\n"));
        assert_eq!(result.text.matches("#version").count(), 1);
        let a = result.text.find("int a;").unwrap();
        let b = result.text.find("int b;").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_version_override() {
        let registry = Registry::new();
        let fragments = [Fragment::new("void main() {}\n", "a.frag")];
        let result = Composer::new(&registry)
            .with_version(GlslVersion::es(310))
            .compose(&fragments);
        assert!(result.text.starts_with("#version 310 es\n"));
    }

    #[test]
    fn test_pragma_golden_output() {
        let mut registry = Registry::new();
        registry
            .register_pragma("foo", |instruction: &str, out: &mut PragmaWriter<'_>| {
                if instruction == "bar" {
                    out.write_line("X");
                    true
                } else {
                    false
                }
            })
            .unwrap();

        let fragments = [Fragment::new("#pragma foo bar\nnext;\n", "a.frag")];
        let result = compose(&registry, &fragments);

        let expected = "#version 450 core\n\
                        #line 1 0\n\
                        X\n\
                        #line 1 0\n\
                        \n\
                        next;\n";
        assert_eq!(result.text, expected);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_line_numbers_stay_addressable() {
        let mut registry = Registry::new();
        registry
            .register_pragma("expand", |_: &str, out: &mut PragmaWriter<'_>| {
                out.write_line("int generated_a;");
                out.write_line("int generated_b;");
                true
            })
            .unwrap();

        let fragments = [Fragment::new(
            "precision highp float;\n#pragma expand now\nvoid main() {}\n",
            "m.frag",
        )];
        let result = compose(&registry, &fragments);

        let positions = reported_positions(&result.text);
        assert!(positions.contains(&("precision highp float;".to_owned(), 1, 0)));
        assert!(positions.contains(&("void main() {}".to_owned(), 3, 0)));
    }

    #[test]
    fn test_unregistered_pragma_blanks_line() {
        let registry = Registry::new();
        let fragments = [Fragment::new("#pragma nope off\nafter;\n", "a.frag")];
        let result = compose(&registry, &fragments);

        let expected = "#version 450 core\n\
                        #line 1 0\n\
                        #line 1 0\n\
                        \n\
                        after;\n";
        assert_eq!(result.text, expected);

        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics.as_slice()[0];
        assert_eq!(diag.kind, DiagnosticKind::UnregisteredPragma);
        assert_eq!(diag.path.as_deref(), Some("a.frag"));
        assert_eq!(diag.line, Some(1));
    }

    #[test]
    fn test_rejected_pragma_instruction() {
        let mut registry = Registry::new();
        registry
            .register_pragma("strict", |_: &str, _: &mut PragmaWriter<'_>| false)
            .unwrap();

        let fragments = [Fragment::new("#pragma strict whatever\n", "a.frag")];
        let result = compose(&registry, &fragments);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result.diagnostics.as_slice()[0].kind,
            DiagnosticKind::RejectedPragmaInstruction
        );
    }

    #[test]
    fn test_malformed_pragma_word_count() {
        let registry = Registry::new();
        let fragments = [Fragment::new(
            "#pragma once\n#pragma a b c d\nint x;\n",
            "a.frag",
        )];
        let result = compose(&registry, &fragments);

        assert_eq!(result.diagnostics.len(), 2);
        assert!(result
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::MalformedDirective));
        assert!(result.text.contains("int x;"));
    }

    #[test]
    fn test_malformed_bracket_recovers() {
        let registry = Registry::new();
        let fragments = [Fragment::new("#include <lib\nnext;\n", "a.frag")];
        let result = compose(&registry, &fragments);

        let expected = "#version 450 core\n\
                        #line 1 0\n\
                        #line 1 0\n\
                        \n\
                        next;\n";
        assert_eq!(result.text, expected);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result.diagnostics.as_slice()[0].kind,
            DiagnosticKind::MalformedDirective
        );
    }

    #[test]
    fn test_unrecognized_reference() {
        let registry = Registry::new();
        let fragments = [Fragment::new("#include lib\n", "a.frag")];
        let result = compose(&registry, &fragments);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result.diagnostics.as_slice()[0].kind,
            DiagnosticKind::UnrecognizedReference
        );
    }

    #[test]
    fn test_unresolved_bracketed_include() {
        let registry = Registry::new();
        let fragments = [Fragment::new("#include <ghost>\n", "a.frag")];
        let result = compose(&registry, &fragments);
        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics.as_slice()[0];
        assert_eq!(diag.kind, DiagnosticKind::UnresolvedInclude);
        assert!(diag.message.contains("ghost"));
    }

    #[test]
    fn test_absolute_bracketed_include_rejected() {
        let registry = Registry::new();
        let fragments = [Fragment::new("#include </etc/shader.glsl>\n", "a.frag")];
        let result = compose(&registry, &fragments);
        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics.as_slice()[0];
        assert_eq!(diag.kind, DiagnosticKind::UnresolvedInclude);
        assert!(diag.message.contains("absolute"));
    }

    #[test]
    fn test_include_once_by_canonical_identity() {
        let search = TempDir::new().unwrap();
        fs::write(search.path().join("lib.glsl"), "vec3 helper();\n").unwrap();

        let mut registry = Registry::new();
        registry.add_search_path(search.path());

        // Two spellings of the same file; canonical identity dedups them.
        let fragments = [Fragment::new(
            "#include <lib.glsl>\n#include <./lib.glsl>\n",
            "main.frag",
        )];
        let result = compose(&registry, &fragments);

        assert_eq!(result.text.matches("vec3 helper();").count(), 1);
        assert_eq!(result.dependencies, [search.path().join("lib.glsl")]);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_virtual_shadows_search_path_without_dependency() {
        let search = TempDir::new().unwrap();
        fs::write(search.path().join("lib.glsl"), "int from_disk;\n").unwrap();

        let mut registry = Registry::new();
        registry.add_search_path(search.path());
        registry.add_virtual_file("lib.glsl", "int from_overlay;\n");

        let fragments = [Fragment::new("#include <lib.glsl>\n", "main.frag")];
        let result = compose(&registry, &fragments);

        assert!(result.text.contains("int from_overlay;"));
        assert!(!result.text.contains("int from_disk;"));
        assert!(result.dependencies.is_empty());
    }

    #[test]
    fn test_virtual_included_twice_expands_twice() {
        let mut registry = Registry::new();
        registry.add_virtual_file("lib", "int lib_value;\n");

        let fragments = [Fragment::new("#include <lib>\n#include <lib>\n", "a.frag")];
        let result = compose(&registry, &fragments);

        assert_eq!(result.text.matches("int lib_value;").count(), 2);
        assert!(result.dependencies.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_quoted_include_next_to_file() {
        let root = TempDir::new().unwrap();
        let sub = root.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("util.glsl"), "int util();\n").unwrap();

        let registry = Registry::new();
        let main_path = sub.join("main.vert");
        let fragments = [Fragment::new(
            "#include \"util.glsl\"\nvoid main() {}\n",
            main_path.to_str().unwrap(),
        )];
        let result = compose(&registry, &fragments);

        assert!(result.text.contains("int util();"));
        assert_eq!(result.dependencies, [sub.join("util.glsl")]);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_nested_include_resolves_next_to_parent() {
        let inc = TempDir::new().unwrap();
        fs::write(
            inc.path().join("a.glsl"),
            "#include \"b.glsl\"\nint a_sym;\n",
        )
        .unwrap();
        fs::write(inc.path().join("b.glsl"), "int b_sym;\n").unwrap();

        let mut registry = Registry::new();
        registry.add_search_path(inc.path());

        let fragments = [Fragment::new("#include <a.glsl>\n", "elsewhere/main.frag")];
        let result = compose(&registry, &fragments);

        assert!(result.text.contains("int a_sym;"));
        assert!(result.text.contains("int b_sym;"));
        assert_eq!(
            result.dependencies,
            [inc.path().join("a.glsl"), inc.path().join("b.glsl")]
        );
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_quoted_from_virtual_rejected() {
        let mut registry = Registry::new();
        registry.add_virtual_file("overlay", "#include \"local.glsl\"\nint x;\n");

        let fragments = [Fragment::new("#include <overlay>\n", "m.frag")];
        let result = compose(&registry, &fragments);

        assert!(result.text.contains("int x;"));
        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics.as_slice()[0];
        assert_eq!(diag.kind, DiagnosticKind::RelativeIncludeFromVirtual);
        assert_eq!(diag.path.as_deref(), Some("overlay"));
        assert_eq!(diag.line, Some(1));
    }

    #[test]
    fn test_fragment_virtual_flag_is_origin_metadata() {
        // Top-level fragments compose as non-virtual regardless of the flag:
        // a quoted include is attempted (and here misses), not rejected.
        let registry = Registry::new();
        let fragments = [Fragment {
            text: "#include \"x.glsl\"\n".into(),
            path: "generated".into(),
            is_virtual: true,
        }];
        let result = compose(&registry, &fragments);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result.diagnostics.as_slice()[0].kind,
            DiagnosticKind::UnresolvedInclude
        );
    }

    #[test]
    fn test_resource_include_dedups_by_name() {
        let mut registry = Registry::new();
        registry.add_resource("common", "int common_value;\n");

        let fragments = [Fragment::new(
            "#include res:common\n#include res:common\n",
            "a.frag",
        )];
        let result = compose(&registry, &fragments);

        assert_eq!(result.text.matches("int common_value;").count(), 1);
        assert!(result.dependencies.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_resource_reported() {
        let registry = Registry::new();
        let fragments = [Fragment::new("#include res:ghost\n", "a.frag")];
        let result = compose(&registry, &fragments);
        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics.as_slice()[0];
        assert_eq!(diag.kind, DiagnosticKind::UnresolvedInclude);
        assert!(diag.message.contains("ghost"));
    }

    #[test]
    fn test_stray_quote_classifies_as_quoted() {
        let mut registry = Registry::new();
        registry.add_resource("common", "int c;\n");

        // The quote scan precedes the colon scan, so the comment's quotes win
        // and the resource reference is never considered.
        let fragments = [Fragment::new(
            "#include res:common // \"note\"\n",
            "a.frag",
        )];
        let result = compose(&registry, &fragments);

        assert!(!result.text.contains("int c;"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result.diagnostics.as_slice()[0].kind,
            DiagnosticKind::UnresolvedInclude
        );
    }

    #[test]
    fn test_crlf_sources_normalized() {
        let registry = Registry::new();
        let fragments = [Fragment::new("int a;\r\nint b;\rint c;\n", "a.frag")];
        let result = compose(&registry, &fragments);
        assert!(result.text.contains("int a;\nint b;\nint c;\n"));
    }

    #[test]
    fn test_missing_final_newline_gains_one() {
        let registry = Registry::new();
        let fragments = [Fragment::new("int a;", "a.frag")];
        let result = compose(&registry, &fragments);
        assert_eq!(result.text, "#version 450 core\n#line 1 0\nint a;\n");
    }

    #[test]
    fn test_empty_fragment_still_gets_marker() {
        let registry = Registry::new();
        let fragments = [Fragment::new("", "empty.frag")];
        let result = compose(&registry, &fragments);
        assert_eq!(result.text, "#version 450 core\n#line 1 0\n");
    }

    #[test]
    fn test_nested_slots_allocate_after_fragments() {
        let mut registry = Registry::new();
        registry.add_virtual_file("lib", "int lib_sym;\n");

        let fragments = [
            Fragment::new("#include <lib>\n", "a.vert"),
            Fragment::new("int b;\n", "b.frag"),
        ];
        let result = compose(&registry, &fragments);

        // Two top-level fragments own slots 0 and 1; the expansion gets 2.
        assert!(result.text.contains("#line 1 2\nint lib_sym;\n"));
    }

    #[test]
    fn test_compose_into_custom_sinks() {
        let mut registry = Registry::new();
        registry.add_virtual_file("lib", "int x;\n");

        let fragments = [Fragment::new("#include <lib>\n#include <ghost>\n", "a.frag")];
        let mut dependencies: Vec<PathBuf> = Vec::new();
        let mut diagnostics: Vec<Diagnostic> = Vec::new();

        let text = Composer::new(&registry).compose_into(
            &fragments,
            &mut dependencies,
            &mut diagnostics,
        );

        assert!(text.contains("int x;"));
        assert!(dependencies.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedInclude);
    }

    #[test]
    fn test_self_include_absorbed_by_dedup() {
        let search = TempDir::new().unwrap();
        fs::write(
            search.path().join("loop.glsl"),
            "#include <loop.glsl>\nint once;\n",
        )
        .unwrap();

        let mut registry = Registry::new();
        registry.add_search_path(search.path());

        let fragments = [Fragment::new("#include <loop.glsl>\n", "a.frag")];
        let result = compose(&registry, &fragments);

        assert_eq!(result.text.matches("int once;").count(), 1);
        assert_eq!(result.dependencies.len(), 1);
        assert!(result.diagnostics.is_empty());
    }
}
