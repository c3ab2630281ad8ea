//! Version-line configuration.
//!
//! Composed output always begins with exactly one `#version` line, derived
//! from a [`GlslVersion`] rather than from the submitted sources (version
//! directives inside sources are blanked out during composition). The default
//! is `#version 450 core`.

use std::fmt;

/// Profile token rendered after the version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Profile {
    /// No profile token, as in pre-3.30 declarations (`#version 120`).
    None,
    /// Core profile.
    #[default]
    Core,
    /// Compatibility profile.
    Compatibility,
    /// OpenGL ES (`#version 300 es`).
    Es,
}

impl Profile {
    /// The token as it appears in a version line, if any.
    pub fn token(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Core => Some("core"),
            Self::Compatibility => Some("compatibility"),
            Self::Es => Some("es"),
        }
    }
}

/// Shading-language version for the leading version line.
///
/// # Example
///
/// ```
/// use glsl_stitch::config::GlslVersion;
///
/// assert_eq!(GlslVersion::default().version_line(), "#version 450 core");
/// assert_eq!(GlslVersion::es(310).version_line(), "#version 310 es");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlslVersion {
    number: u16,
    profile: Profile,
}

impl GlslVersion {
    /// A version with an explicit profile.
    pub fn new(number: u16, profile: Profile) -> Self {
        Self { number, profile }
    }

    /// A core-profile version.
    pub fn core(number: u16) -> Self {
        Self::new(number, Profile::Core)
    }

    /// A compatibility-profile version.
    pub fn compatibility(number: u16) -> Self {
        Self::new(number, Profile::Compatibility)
    }

    /// An OpenGL ES version.
    pub fn es(number: u16) -> Self {
        Self::new(number, Profile::Es)
    }

    /// A version with no profile token.
    pub fn bare(number: u16) -> Self {
        Self::new(number, Profile::None)
    }

    /// The numeric part, e.g. `450`.
    pub fn number(self) -> u16 {
        self.number
    }

    /// The profile part.
    pub fn profile(self) -> Profile {
        self.profile
    }

    /// The full directive line, without a trailing newline.
    pub fn version_line(self) -> String {
        match self.profile.token() {
            Some(token) => format!("#version {} {}", self.number, token),
            None => format!("#version {}", self.number),
        }
    }
}

impl Default for GlslVersion {
    fn default() -> Self {
        Self::core(450)
    }
}

impl fmt::Display for GlslVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.profile.token() {
            Some(token) => write!(f, "{} {}", self.number, token),
            None => write!(f, "{}", self.number),
        }
    }
}
