use crate::core::completeness::CompletenessReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("No root namespaces supplied")]
    NoRootsError,

    #[error("Invalid namespace '{namespace}': {reason}")]
    InvalidNamespaceError { namespace: String, reason: String },

    #[error("Type discovery failed: {message}")]
    DiscoveryError { message: String },

    #[error("Unknown type: {name}")]
    UnknownTypeError { name: String },

    #[error("'{declaration}' declares no generic parameters")]
    NotGenericError { declaration: String },

    #[error("'{declaration}' is neither an interface nor abstract")]
    NotAbstractDeclarationError { declaration: String },

    #[error("Slot {slot} out of range for '{declaration}' ({count} parameters)")]
    SlotOutOfRangeError {
        declaration: String,
        slot: usize,
        count: usize,
    },

    #[error("Type variable '{variable}' is not declared by '{declaring_type}'")]
    UnboundVariableError {
        variable: String,
        declaring_type: String,
    },

    #[error("Cannot build mirror for member '{member}' of '{type_name}': {message}")]
    MemberBuildError {
        type_name: String,
        member: String,
        message: String,
    },

    #[error("Cannot build mirror for type '{type_name}': {message}")]
    TypeBuildError { type_name: String, message: String },

    #[error("Domain model is incomplete: {0}")]
    IncompleteModelError(CompletenessReport),

    #[error("Mirror cache has not been initialized")]
    CacheNotInitializedError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Resolution,
    Build,
    Completeness,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MirrorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MirrorError::IoError(_) | MirrorError::SerializationError(_) => ErrorCategory::Io,
            MirrorError::ConfigError { .. }
            | MirrorError::ConfigValidationError { .. }
            | MirrorError::InvalidConfigValueError { .. }
            | MirrorError::MissingConfigError { .. }
            | MirrorError::NoRootsError
            | MirrorError::InvalidNamespaceError { .. } => ErrorCategory::Configuration,
            MirrorError::DiscoveryError { .. }
            | MirrorError::UnknownTypeError { .. }
            | MirrorError::NotGenericError { .. }
            | MirrorError::NotAbstractDeclarationError { .. }
            | MirrorError::SlotOutOfRangeError { .. }
            | MirrorError::UnboundVariableError { .. } => ErrorCategory::Resolution,
            MirrorError::MemberBuildError { .. }
            | MirrorError::TypeBuildError { .. }
            | MirrorError::CacheNotInitializedError => ErrorCategory::Build,
            MirrorError::IncompleteModelError(_) => ErrorCategory::Completeness,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MirrorError::MemberBuildError { .. } | MirrorError::TypeBuildError { .. } => {
                ErrorSeverity::Medium
            }
            MirrorError::CacheNotInitializedError => ErrorSeverity::Low,
            MirrorError::IncompleteModelError(_)
            | MirrorError::DiscoveryError { .. }
            | MirrorError::UnknownTypeError { .. }
            | MirrorError::UnboundVariableError { .. } => ErrorSeverity::High,
            _ => ErrorSeverity::Critical,
        }
    }

    /// 本地可恢復的錯誤：單一成員或型別被丟棄，管線繼續
    pub fn is_recoverable(&self) -> bool {
        self.category() == ErrorCategory::Build
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MirrorError::NoRootsError => "No root namespaces were given to scan".to_string(),
            MirrorError::InvalidNamespaceError { namespace, .. } => {
                format!("'{}' is not a valid namespace name", namespace)
            }
            MirrorError::IncompleteModelError(report) => format!(
                "The domain model references {} type(s) that are not part of it",
                report.violations.len()
            ),
            MirrorError::IoError(e) => format!("Could not read input: {}", e),
            MirrorError::SerializationError(e) => {
                format!("Type catalog file is not valid JSON: {}", e)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the root namespaces and marker names in the configuration".to_string()
            }
            ErrorCategory::Resolution => {
                "Make sure the generic declaration is an abstract capability type known to the catalog"
                    .to_string()
            }
            ErrorCategory::Build => "Re-run with --verbose to see the dropped members".to_string(),
            ErrorCategory::Completeness => {
                "Add the missing types to a scanned namespace or whitelist them".to_string()
            }
            ErrorCategory::Io => "Verify the input file paths and their format".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;
