//! The source registry consulted during composition.
//!
//! A [`Registry`] owns every table composition reads: filesystem search
//! paths, virtual files, named resources, pragma handlers, and the
//! stage-suffix table. It is an explicit value rather than process-global
//! state, so independent subsystems can hold independent registries. For
//! hosts that share one registry across threads there is [`SharedRegistry`],
//! a cloneable `Arc<RwLock<Registry>>` handle.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashMap;

mod pragma;
mod stage;

// Re-export all public types
pub use pragma::{DuplicatePragma, PragmaHandler, PragmaTable, PragmaWriter};
pub use stage::{PipelineStage, StageTable};

// ============================================================================
// Registry
// ============================================================================

/// Shared tables consulted while composing shader sources.
///
/// # Example
///
/// ```
/// use glsl_stitch::registry::Registry;
///
/// let mut registry = Registry::new();
/// registry.add_search_path("shaders/include");
/// registry.add_virtual_file("colors", "const vec3 red = vec3(1, 0, 0);\n");
/// registry.add_resource("noise", "float noise(vec2 p) { return 0.0; }\n");
/// ```
#[derive(Default)]
pub struct Registry {
    /// Ordered directories scanned for bracketed and quoted includes.
    search_paths: Vec<PathBuf>,
    /// Name-keyed sources that shadow the filesystem for bracketed includes.
    virtual_files: FxHashMap<String, String>,
    /// Name-keyed sources for `name:target` includes.
    resources: FxHashMap<String, String>,
    /// Pragma keyword handlers.
    pragmas: PragmaTable,
    /// Suffix table for stage classification.
    stages: StageTable,
}

impl Registry {
    /// Create a registry with no search paths, no overlays, no pragma
    /// handlers, and the default stage-suffix table.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Search paths
    // ------------------------------------------------------------------

    /// Replace the whole search path list.
    ///
    /// Duplicate entries in the input are dropped; the first occurrence
    /// keeps its position.
    pub fn set_search_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_paths.clear();
        for path in paths {
            self.add_search_path(path);
        }
    }

    /// Append a search path unless an identical entry is already present.
    ///
    /// Returns `true` if the path was appended.
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.search_paths.contains(&path) {
            return false;
        }
        self.search_paths.push(path);
        true
    }

    /// The search paths, in scan order.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    // ------------------------------------------------------------------
    // Virtual files and resources
    // ------------------------------------------------------------------

    /// Insert or overwrite a virtual file.
    ///
    /// Virtual files shadow same-named files on the search paths for
    /// bracketed includes and top-level resolution.
    pub fn add_virtual_file(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.virtual_files.insert(name.into(), text.into());
    }

    /// Look up a virtual file by exact name.
    pub fn virtual_file(&self, name: &str) -> Option<&str> {
        self.virtual_files.get(name).map(String::as_str)
    }

    /// Insert or overwrite a named resource.
    pub fn add_resource(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.resources.insert(name.into(), text.into());
    }

    /// Look up a resource by exact name.
    pub fn resource(&self, name: &str) -> Option<&str> {
        self.resources.get(name).map(String::as_str)
    }

    // ------------------------------------------------------------------
    // Pragmas
    // ------------------------------------------------------------------

    /// Register a pragma handler for a keyword.
    ///
    /// Fails with [`DuplicatePragma`] if the keyword already has a handler;
    /// the original handler stays in place.
    pub fn register_pragma(
        &mut self,
        keyword: impl Into<String>,
        handler: impl PragmaHandler + 'static,
    ) -> Result<(), DuplicatePragma> {
        self.pragmas.register(keyword, handler)
    }

    /// Look up the handler for a pragma keyword.
    pub fn pragma(&self, keyword: &str) -> Option<&dyn PragmaHandler> {
        self.pragmas.get(keyword)
    }

    /// The pragma handler table.
    pub fn pragmas(&self) -> &PragmaTable {
        &self.pragmas
    }

    // ------------------------------------------------------------------
    // Stage classification
    // ------------------------------------------------------------------

    /// Append a stage-suffix entry at the end of the classification table.
    pub fn add_stage_suffix(&mut self, suffix: impl Into<String>, stage: PipelineStage) {
        self.stages.register(suffix, stage);
    }

    /// Replace the whole stage-suffix table.
    pub fn set_stage_table(&mut self, stages: StageTable) {
        self.stages = stages;
    }

    /// The stage classification table.
    pub fn stages(&self) -> &StageTable {
        &self.stages
    }
}

// ============================================================================
// SharedRegistry
// ============================================================================

/// Cloneable handle to a registry shared across threads.
///
/// Composition takes `&Registry`, so shared hosts hold the read guard for the
/// duration of a call:
///
/// ```
/// use glsl_stitch::compose::{compose, Fragment};
/// use glsl_stitch::registry::{Registry, SharedRegistry};
///
/// let shared = SharedRegistry::new(Registry::new());
///
/// shared.write().add_virtual_file("lib", "float x = 1.0;\n");
///
/// let fragments = [Fragment::new("#include <lib>\n", "main.frag")];
/// let result = compose(&shared.read(), &fragments);
/// assert!(result.diagnostics.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    /// Wrap a registry for shared access.
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Lock the registry for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.inner.read()
    }

    /// Lock the registry for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner.write()
    }
}
