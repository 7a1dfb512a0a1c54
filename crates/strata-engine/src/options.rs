//! Engine options
//!
//! Options are fixed for the lifetime of an [`Interp`](crate::Interp). They
//! can be built in code or loaded from a TOML table:
//!
//! ```toml
//! undefined_marker = "<unset>"
//! max_call_depth = 64
//! autoload = false
//! ```

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Default text reported for unset variables
pub const DEFAULT_UNDEFINED_MARKER: &str = "<undefined>";

/// Default maximum nesting of member calls
///
/// Every member call nests several native frames, so the limit stays well
/// below what a default 2 MiB thread stack holds in unoptimized builds.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

/// Errors raised while loading options
#[derive(Debug, Error)]
pub enum OptionsError {
    /// Options file could not be read
    #[error("failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    /// Options table is malformed
    #[error("invalid options: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Text reported by `cget`/`configure` for unset variables
    pub undefined_marker: String,

    /// Maximum nesting of member calls before an evaluation is refused
    pub max_call_depth: usize,

    /// Whether `isa` asks the class loader for unknown classes
    pub autoload: bool,

    /// Prefix of the registration names given to installed builtins
    pub builtin_registration_prefix: String,

    /// Name of the options-storage variable of composite classes
    pub options_variable: String,

    /// Name of the delegation component of composite classes
    pub hull_component: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            undefined_marker: DEFAULT_UNDEFINED_MARKER.to_string(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            autoload: true,
            builtin_registration_prefix: "@strata-builtin-".to_string(),
            options_variable: "strata_options".to_string(),
            hull_component: "hull".to_string(),
        }
    }
}

impl EngineOptions {
    /// Parse options from a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(source)?)
    }

    /// Load options from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Registration name for a builtin method
    pub fn registration_name(&self, builtin: &str) -> String {
        format!("{}{}", self.builtin_registration_prefix, builtin)
    }
}
