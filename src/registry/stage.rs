//! Pipeline-stage classification of shader file names.

use std::fmt;

// ============================================================================
// PipelineStage
// ============================================================================

/// Pipeline stage deduced from a shader file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Vertex shader.
    Vertex,
    /// Fragment (pixel) shader.
    Fragment,
    /// Geometry shader.
    Geometry,
    /// Tessellation control shader.
    TessControl,
    /// Tessellation evaluation shader.
    TessEval,
    /// Compute shader.
    Compute,
}

impl PipelineStage {
    /// A short lowercase name, e.g. `"vertex"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Geometry => "geometry",
            Self::TessControl => "tess-control",
            Self::TessEval => "tess-eval",
            Self::Compute => "compute",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// StageTable
// ============================================================================

/// Ordered suffix table mapping file names to pipeline stages.
///
/// Classification walks the table in registration order and the first suffix
/// match wins, so more specific suffixes must be registered before generic
/// ones. The default table recognizes the common GLSL extensions:
///
/// | Suffix            | Stage        |
/// |-------------------|--------------|
/// | `.vert`, `.vs`    | vertex       |
/// | `.frag`, `.fs`    | fragment     |
/// | `.geom`, `.gs`    | geometry     |
/// | `.tesc`           | tess-control |
/// | `.tese`           | tess-eval    |
/// | `.comp`, `.cs`    | compute      |
#[derive(Debug, Clone)]
pub struct StageTable {
    entries: Vec<(String, PipelineStage)>,
}

impl Default for StageTable {
    fn default() -> Self {
        let mut table = Self::empty();
        table.register(".vert", PipelineStage::Vertex);
        table.register(".frag", PipelineStage::Fragment);
        table.register(".geom", PipelineStage::Geometry);
        table.register(".tesc", PipelineStage::TessControl);
        table.register(".tese", PipelineStage::TessEval);
        table.register(".comp", PipelineStage::Compute);
        table.register(".vs", PipelineStage::Vertex);
        table.register(".fs", PipelineStage::Fragment);
        table.register(".gs", PipelineStage::Geometry);
        table.register(".cs", PipelineStage::Compute);
        table
    }
}

impl StageTable {
    /// Create a table with the default suffix entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with no entries.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a suffix entry at the end of the table.
    ///
    /// Earlier entries take precedence, so appending `".glsl"` after the
    /// defaults only affects names the defaults do not already classify.
    pub fn register(&mut self, suffix: impl Into<String>, stage: PipelineStage) {
        self.entries.push((suffix.into(), stage));
    }

    /// Classify a file name by its suffix.
    pub fn classify(&self, name: &str) -> Option<PipelineStage> {
        self.entries
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix.as_str()))
            .map(|&(_, stage)| stage)
    }

    /// Iterate over the entries in match order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, PipelineStage)> {
        self.entries
            .iter()
            .map(|(suffix, stage)| (suffix.as_str(), *stage))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_suffixes() {
        let table = StageTable::new();
        assert_eq!(table.classify("mesh.vert"), Some(PipelineStage::Vertex));
        assert_eq!(table.classify("mesh.frag"), Some(PipelineStage::Fragment));
        assert_eq!(table.classify("shadow.vs"), Some(PipelineStage::Vertex));
        assert_eq!(table.classify("blur.comp"), Some(PipelineStage::Compute));
        assert_eq!(table.classify("terrain.tesc"), Some(PipelineStage::TessControl));
        assert_eq!(table.classify("terrain.tese"), Some(PipelineStage::TessEval));
        assert_eq!(table.classify("readme.md"), None);
    }

    #[test]
    fn test_registration_order_wins() {
        let mut generic_first = StageTable::empty();
        generic_first.register(".glsl", PipelineStage::Vertex);
        generic_first.register(".frag.glsl", PipelineStage::Fragment);
        assert_eq!(
            generic_first.classify("blur.frag.glsl"),
            Some(PipelineStage::Vertex)
        );

        let mut specific_first = StageTable::empty();
        specific_first.register(".frag.glsl", PipelineStage::Fragment);
        specific_first.register(".glsl", PipelineStage::Vertex);
        assert_eq!(
            specific_first.classify("blur.frag.glsl"),
            Some(PipelineStage::Fragment)
        );
    }

    #[test]
    fn test_empty_table_classifies_nothing() {
        let table = StageTable::empty();
        assert_eq!(table.classify("mesh.vert"), None);
        assert!(table.is_empty());
    }
}
