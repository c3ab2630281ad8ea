//! # glsl-stitch
//!
//! A GLSL source composition library with include resolution, virtual files,
//! and pragma extensions.
//!
//! Shader programs are assembled from an ordered list of [`Fragment`]s
//! against a [`Registry`] that supplies everything references can resolve
//! to:
//!
//! - **Includes**: `#include <...>`, `#include "..."`, and
//!   `#include name:target` references expanded in place, with include-once
//!   semantics per composition call
//! - **Virtual files**: in-memory sources that shadow the search paths,
//!   so generated code composes exactly like code on disk
//! - **Pragmas**: `#pragma <keyword> <instruction>` lines routed to
//!   registered handlers that can splice replacement text into the output
//! - **Line markers**: `#line` directives resynchronize after every
//!   expansion, so downstream compiler errors point into the original
//!   sources
//!
//! ## Quick Start
//!
//! ```
//! use glsl_stitch::{compose, Fragment, Registry};
//!
//! let mut registry = Registry::new();
//! registry.add_virtual_file("lighting", "vec3 lambert(vec3 n, vec3 l);\n");
//!
//! let fragments = [Fragment::new(
//!     "#include <lighting>\nvoid main() {}\n",
//!     "main.frag",
//! )];
//! let result = compose(&registry, &fragments);
//!
//! assert!(result.text.starts_with("#version 450 core\n"));
//! assert!(result.text.contains("vec3 lambert(vec3 n, vec3 l);"));
//! assert!(!result.has_errors());
//! ```
//!
//! ## High-Level API
//!
//! For most use cases, the crate-root exports are enough:
//!
//! - [`compose`](fn@compose): flatten fragments with the default version line
//! - [`Composer`]: configured composition (version line, caller-supplied sinks)
//! - [`Batcher`]: parallel composition of many programs (feature `batch`)
//! - [`resolve_file`]: load one named source and classify its pipeline stage
//!
//! ## Low-Level API
//!
//! For advanced use cases, access the underlying modules:
//!
//! - [`registry`]: search paths, overlays, resources, pragma and stage tables
//! - [`mod@compose`]: the composition pass and its collaborator traits
//! - [`resolve`]: the reference resolution rules, usable standalone
//! - [`config`]: version-line configuration
//! - [`diagnostic`]: structured problem records and formatting

#![forbid(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "batch")]
pub mod batch;
pub mod compose;
pub mod config;
pub mod diagnostic;
pub mod registry;
pub mod resolve;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
///
/// ```
/// use glsl_stitch::prelude::*;
/// ```
pub mod prelude {
    // Re-export common items from the crate root
    // (avoids duplication - these are already exported at crate level)

    // Composition
    pub use crate::{compose, Composed, Composer, DependencySink, Fragment};

    // Diagnostics
    pub use crate::{
        Diagnostic, DiagnosticKind, DiagnosticOptions, DiagnosticSink, DiagnosticSummary,
        Diagnostics, DisplayStyle, Severity,
    };

    // Registry
    pub use crate::{
        GlslVersion, PipelineStage, PragmaHandler, PragmaWriter, Profile, Registry,
        SharedRegistry, StageTable,
    };

    // Resolution
    pub use crate::{resolve_file, ResolveError, ResolvedFile};

    // Batch
    #[cfg(feature = "batch")]
    pub use crate::Batcher;
}

// =============================================================================
// High-Level API (recommended for most use cases)
// =============================================================================

pub use compose::{compose, Composed, Composer, DependencySink, Fragment};

#[cfg(feature = "batch")]
pub use batch::Batcher;

// =============================================================================
// Diagnostics
// =============================================================================

pub use diagnostic::{
    // Structured records
    Diagnostic, DiagnosticKind, Severity,
    // Options for formatting
    DiagnosticOptions, DisplayStyle,
    // Collection, summary, and sink trait
    DiagnosticSink, DiagnosticSummary, Diagnostics,
};

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{GlslVersion, Profile};
pub use registry::{
    DuplicatePragma, PipelineStage, PragmaHandler, PragmaTable, PragmaWriter, Registry,
    SharedRegistry, StageTable,
};
pub use resolve::{resolve_file, ResolveError, ResolvedFile};
