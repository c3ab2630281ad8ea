//! Include-reference resolution.
//!
//! Three reference forms reach the overlay tables and the filesystem:
//!
//! - **Bracketed** `#include <name>`: the virtual-file table first, then the
//!   search paths in order. No directory context.
//! - **Quoted** `#include "name"`: the including file's directory first, then
//!   the search paths in order.
//! - **Resource** `#include tag:name`: exact lookup in the resource table.
//!
//! Candidates that exist but cannot be read count as misses.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::compose::Fragment;
use crate::diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::registry::{PipelineStage, Registry};

// ============================================================================
// Errors
// ============================================================================

/// Why a reference failed to resolve.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Nothing supplied the reference.
    #[error("unable to resolve include {reference:?}")]
    NotFound {
        /// The reference text as written.
        reference: String,
    },
    /// Bracketed references must not be absolute.
    #[error("absolute include paths are not supported: {reference:?}")]
    AbsolutePath {
        /// The reference text as written.
        reference: String,
    },
    /// No resource is registered under the name.
    #[error("unknown resource {name:?}")]
    UnknownResource {
        /// The name after the `:` separator.
        name: String,
    },
}

// ============================================================================
// Reference resolution
// ============================================================================

/// A reference served by the filesystem.
#[derive(Debug, Clone)]
pub struct DiskFile {
    /// The path as found: the reference joined onto the directory that
    /// supplied it. Not canonicalized.
    pub path: PathBuf,
    /// File content.
    pub text: String,
}

/// A bracketed reference, served by either the virtual-file table or the
/// filesystem.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// Served by the virtual-file table.
    Virtual {
        /// Registered content.
        text: String,
    },
    /// Served by a real file.
    Disk(DiskFile),
}

/// Resolve a quoted reference against the including file's directory, then
/// each search path in order.
pub fn resolve_relative(
    registry: &Registry,
    reference: &str,
    current_dir: &Path,
) -> Result<DiskFile, ResolveError> {
    let direct = current_dir.join(reference);
    if let Some(text) = read_file(&direct) {
        return Ok(DiskFile { path: direct, text });
    }

    for base in registry.search_paths() {
        let candidate = base.join(reference);
        if let Some(text) = read_file(&candidate) {
            return Ok(DiskFile {
                path: candidate,
                text,
            });
        }
    }

    Err(ResolveError::NotFound {
        reference: reference.to_owned(),
    })
}

/// Resolve a bracketed reference: the virtual-file table first, then the
/// search paths in order.
///
/// There is no directory context, and absolute references are rejected.
pub fn resolve_bracketed(registry: &Registry, reference: &str) -> Result<Resolved, ResolveError> {
    if let Some(text) = registry.virtual_file(reference) {
        return Ok(Resolved::Virtual {
            text: text.to_owned(),
        });
    }

    if reference.starts_with('/') || reference.starts_with('\\') {
        return Err(ResolveError::AbsolutePath {
            reference: reference.to_owned(),
        });
    }

    for base in registry.search_paths() {
        let candidate = base.join(reference);
        if let Some(text) = read_file(&candidate) {
            return Ok(Resolved::Disk(DiskFile {
                path: candidate,
                text,
            }));
        }
    }

    Err(ResolveError::NotFound {
        reference: reference.to_owned(),
    })
}

/// Resolve a resource reference by exact name.
pub fn resolve_resource<'r>(registry: &'r Registry, name: &str) -> Result<&'r str, ResolveError> {
    registry
        .resource(name)
        .ok_or_else(|| ResolveError::UnknownResource {
            name: name.to_owned(),
        })
}

/// Read a candidate file, treating unreadable entries as misses.
fn read_file(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

/// Normalize a path to a canonical identity for include-once bookkeeping.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub(crate) fn canonical_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

// ============================================================================
// Whole-file resolution
// ============================================================================

/// A whole file located for top-level composition.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    /// Deduced stage, when a suffix-table entry matched the name.
    pub stage: Option<PipelineStage>,
    /// File content.
    pub text: String,
    /// Real path for filesystem hits; `None` when served virtually.
    pub real_path: Option<PathBuf>,
    /// Whether the virtual-file table supplied the content.
    pub is_virtual: bool,
}

impl ResolvedFile {
    /// Convert into a composition fragment.
    ///
    /// Filesystem hits use the real path as the fragment's display path, so
    /// quoted includes resolve next to the file; virtual hits keep the name
    /// they were requested under.
    pub fn into_fragment(self, name: &str) -> Fragment {
        let path = match &self.real_path {
            Some(real) => real.display().to_string(),
            None => name.to_owned(),
        };
        Fragment {
            text: self.text,
            path,
            is_virtual: self.is_virtual,
        }
    }
}

/// Locate one complete file by name: the virtual-file table first, then the
/// name as a path, then each search path in order.
///
/// The name is classified against the stage-suffix table either way; a name
/// no suffix matches is reported to the sink and classified as `None`.
/// Returns `None` without reporting if nothing supplies the content.
pub fn resolve_file(
    registry: &Registry,
    name: &str,
    diagnostics: &mut dyn DiagnosticSink,
) -> Option<ResolvedFile> {
    let stage = registry.stages().classify(name);
    if stage.is_none() {
        diagnostics.report(
            Diagnostic::error(
                DiagnosticKind::UnknownPipelineStage,
                format!("no pipeline stage matches file name {name:?}"),
            )
            .with_path(name),
        );
    }

    if let Some(text) = registry.virtual_file(name) {
        return Some(ResolvedFile {
            stage,
            text: text.to_owned(),
            real_path: None,
            is_virtual: true,
        });
    }

    let direct = Path::new(name);
    if let Some(text) = read_file(direct) {
        return Some(ResolvedFile {
            stage,
            text,
            real_path: Some(direct.to_path_buf()),
            is_virtual: false,
        });
    }

    for base in registry.search_paths() {
        let candidate = base.join(name);
        if let Some(text) = read_file(&candidate) {
            return Some(ResolvedFile {
                stage,
                text,
                real_path: Some(candidate),
                is_virtual: false,
            });
        }
    }

    None
}
