//! Parallel composition of many shader programs.
//!
//! One registry serves every program in the batch. Per-call state (the
//! visited set, the slot allocator) is private to each composition, so
//! programs compose independently and the output vector lines up with the
//! input order.
//!
//! # Example
//!
//! ```
//! use glsl_stitch::batch::Batcher;
//! use glsl_stitch::compose::Fragment;
//! use glsl_stitch::registry::Registry;
//!
//! let mut registry = Registry::new();
//! registry.add_virtual_file("lib", "float shared();\n");
//!
//! let programs = vec![
//!     vec![Fragment::new("#include <lib>\nvoid main() {}\n", "a.frag")],
//!     vec![Fragment::new("void main() {}\n", "b.frag")],
//! ];
//!
//! let results = Batcher::new(&registry).compose_all(&programs);
//! assert_eq!(results.len(), 2);
//! assert!(results[0].text.contains("float shared();"));
//! ```

use crate::compose::{Composed, Composer, Fragment};
use crate::config::GlslVersion;
use crate::registry::Registry;

/// Composes batches of shader programs in parallel.
///
/// Each entry in a batch is one program: the ordered fragment list a single
/// [`Composer::compose`] call would take.
pub struct Batcher<'r> {
    registry: &'r Registry,
    version: GlslVersion,
}

impl<'r> Batcher<'r> {
    /// A batcher with the default version line.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            version: GlslVersion::default(),
        }
    }

    /// Set the version line emitted at the top of every composed buffer.
    pub fn with_version(mut self, version: GlslVersion) -> Self {
        self.version = version;
        self
    }

    /// Compose every program in parallel.
    ///
    /// Returns results in the same order as the input programs.
    pub fn compose_all(&self, programs: &[Vec<Fragment>]) -> Vec<Composed> {
        self.compose_all_each(programs, |_| {})
    }

    /// Compose every program in parallel with a callback per finished
    /// program, receiving its index. Useful for progress tracking.
    pub fn compose_all_each<F>(&self, programs: &[Vec<Fragment>], on_each: F) -> Vec<Composed>
    where
        F: Fn(usize) + Sync,
    {
        use rayon::prelude::*;

        if programs.is_empty() {
            return Vec::new();
        }

        let composer = Composer::new(self.registry).with_version(self.version);
        programs
            .par_iter()
            .enumerate()
            .map(|(index, fragments)| {
                let result = composer.compose(fragments);
                on_each(index);
                result
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::compose::compose;

    fn sample_registry() -> Registry {
        let mut registry = Registry::new();
        registry.add_virtual_file("noise", "float noise(vec2 p);\n");
        registry.add_resource("camera", "uniform mat4 u_view;\n");
        registry
    }

    fn sample_programs() -> Vec<Vec<Fragment>> {
        vec![
            vec![Fragment::new(
                "#include <noise>\nvoid main() { marker_a(); }\n",
                "a.frag",
            )],
            vec![Fragment::new(
                "#include res:camera\nvoid main() { marker_b(); }\n",
                "b.vert",
            )],
            vec![Fragment::new(
                "#include <ghost>\nvoid main() { marker_c(); }\n",
                "c.frag",
            )],
        ]
    }

    #[test]
    fn test_batch_matches_sequential() {
        let registry = sample_registry();
        let programs = sample_programs();

        let parallel = Batcher::new(&registry).compose_all(&programs);
        assert_eq!(parallel.len(), programs.len());

        for (result, fragments) in parallel.iter().zip(&programs) {
            let sequential = compose(&registry, fragments);
            assert_eq!(result.text, sequential.text);
            assert_eq!(result.dependencies, sequential.dependencies);
            assert_eq!(result.diagnostics.len(), sequential.diagnostics.len());
        }
    }

    #[test]
    fn test_batch_preserves_order() {
        let registry = sample_registry();
        let results = Batcher::new(&registry).compose_all(&sample_programs());

        assert!(results[0].text.contains("marker_a"));
        assert!(results[1].text.contains("marker_b"));
        assert!(results[2].text.contains("marker_c"));
        assert!(!results[0].has_errors());
        assert!(!results[1].has_errors());
        assert!(results[2].has_errors());
    }

    #[test]
    fn test_batch_version_applies_to_every_program() {
        let registry = sample_registry();
        let results = Batcher::new(&registry)
            .with_version(GlslVersion::es(300))
            .compose_all(&sample_programs());

        for result in &results {
            assert!(result.text.starts_with("#version 300 es\n"));
        }
    }

    #[test]
    fn test_empty_batch() {
        let registry = sample_registry();
        let results = Batcher::new(&registry).compose_all(&[]);
        assert!(results.is_empty());
    }

    #[test]
    fn test_each_callback_fires_per_program() {
        let registry = sample_registry();
        let counter = AtomicUsize::new(0);

        let results = Batcher::new(&registry).compose_all_each(&sample_programs(), |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(results.len(), 3);
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }
}
