//! Dispatch errors

use crate::class::Protection;
use thiserror::Error;

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised by class construction and member dispatch
///
/// Every error is scoped to the failing call; none is fatal to the
/// interpreter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    /// Operation invoked outside the class or object scope it needs
    #[error("{0}")]
    Context(String),

    /// Wrong argument count or shape
    #[error("{0}")]
    Usage(String),

    /// Option does not name a public variable
    #[error("unknown option \"{0}\"")]
    UnknownOption(String),

    /// Class not found, even after an autoload attempt
    #[error("class \"{0}\" not found")]
    UnknownClass(String),

    /// Method not found on an object
    #[error("bad option \"{name}\": should be one of...\n  {}", .candidates.join("\n  "))]
    UnknownMethod {
        /// Requested method name
        name: String,
        /// Public methods the object does respond to
        candidates: Vec<String>,
    },

    /// Member function not accessible from the calling scope
    #[error("can't access \"{name}\": {protection} function")]
    Protection {
        /// Member name as invoked
        name: String,
        /// Protection level of the member
        protection: Protection,
    },

    /// Name is not a member of the class
    #[error("\"{name}\" isn't a member of class \"{class}\"")]
    NoSuchMember {
        /// Requested member name
        name: String,
        /// Full name of the class searched
        class: String,
    },

    /// Component not defined in the object's heritage
    #[error("unknown component \"{0}\"")]
    UnknownComponent(String),

    /// Variable not accessible from the calling scope
    #[error("can't access \"{0}\": private variable")]
    Inaccessible(String),

    /// Variable not found or unset
    #[error("can't read \"{0}\": no such variable")]
    NoSuchVariable(String),

    /// A config hook failed; the variable was restored
    #[error("{source}\n    (error in configuration of public variable \"{variable}\")")]
    Config {
        /// Full name of the public variable
        variable: String,
        /// Error raised by the hook
        source: Box<DispatchError>,
    },

    /// Class or member creation failed
    #[error("{0}")]
    Creation(String),

    /// An object with this access name already exists
    #[error("command \"{0}\" already exists in namespace")]
    ObjectExists(String),

    /// Object handle does not refer to a live object
    #[error("object \"{0}\" not found")]
    NoSuchObject(String),

    /// Error raised by a user member body
    #[error("{0}")]
    Script(String),
}

impl DispatchError {
    /// Create an error raised by user code
    pub fn script(message: impl Into<String>) -> Self {
        DispatchError::Script(message.into())
    }

    /// Operation ran outside its required scope
    pub fn is_context_error(&self) -> bool {
        matches!(self, DispatchError::Context(_))
    }

    /// Wrong argument count or shape
    pub fn is_usage_error(&self) -> bool {
        matches!(self, DispatchError::Usage(_))
    }

    /// A referenced option, class, member, variable or object was not found,
    /// not accessible, or ambiguous
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownOption(_)
                | DispatchError::UnknownClass(_)
                | DispatchError::UnknownMethod { .. }
                | DispatchError::NoSuchMember { .. }
                | DispatchError::UnknownComponent(_)
                | DispatchError::Protection { .. }
                | DispatchError::Inaccessible(_)
                | DispatchError::NoSuchVariable(_)
                | DispatchError::NoSuchObject(_)
        )
    }

    /// A config hook failed during assignment
    pub fn is_side_effect_error(&self) -> bool {
        matches!(self, DispatchError::Config { .. })
    }

    /// Innermost error, unwrapping configuration annotations
    pub fn root_cause(&self) -> &DispatchError {
        match self {
            DispatchError::Config { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<String> for DispatchError {
    fn from(s: String) -> Self {
        DispatchError::Script(s)
    }
}

impl From<&str> for DispatchError {
    fn from(s: &str) -> Self {
        DispatchError::Script(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_annotation() {
        let err = DispatchError::Config {
            variable: "::Widget::color".to_string(),
            source: Box::new(DispatchError::script("bad color")),
        };
        assert_eq!(
            err.to_string(),
            "bad color\n    (error in configuration of public variable \"::Widget::color\")"
        );
        assert!(err.is_side_effect_error());
        assert_eq!(err.root_cause(), &DispatchError::script("bad color"));
    }

    #[test]
    fn test_unknown_method_lists_candidates() {
        let err = DispatchError::UnknownMethod {
            name: "frob".to_string(),
            candidates: vec!["cget".to_string(), "configure".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "bad option \"frob\": should be one of...\n  cget\n  configure"
        );
        assert!(err.is_resolution_error());
    }

    #[test]
    fn test_taxonomy() {
        assert!(DispatchError::Context("x".into()).is_context_error());
        assert!(DispatchError::Usage("x".into()).is_usage_error());
        assert!(DispatchError::UnknownClass("Foo".into()).is_resolution_error());
        assert!(!DispatchError::script("x").is_resolution_error());
    }
}
