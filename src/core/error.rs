//! Error handling for armgen
//!
//! This module provides the error type shared by the template builder, the template
//! assembler and the remote resource client, together with user-friendly error
//! reporting for the CLI. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can tell integrity failures, validation
//!    failures and remote failures apart
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Construction**: [`ArmError::Validation`], [`ArmError::UnknownResourceKind`]
//! - **Document integrity**: [`ArmError::DuplicateResource`],
//!   [`ArmError::DanglingDependency`], [`ArmError::CircularDependency`],
//!   [`ArmError::UndeclaredParameter`], [`ArmError::InvalidTemplate`]
//! - **Remote calls**: [`ArmError::RequestPreparation`], [`ArmError::Transport`],
//!   [`ArmError::Server`], [`ArmError::ProviderRegistration`]
//! - **Configuration**: [`ArmError::ConfigError`], [`ArmError::ManifestNotFound`],
//!   [`ArmError::ManifestParseError`]
//!
//! Builder and assembler errors are raised before anything is written or sent.
//! Only [`ArmError::Transport`] and throttled/unavailable [`ArmError::Server`]
//! errors are eligible for retry; see [`ArmError::is_retryable`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use armgen_cli::core::{ArmError, ErrorContext, user_friendly_error};
//!
//! let error = ArmError::DuplicateResource {
//!     kind: "Microsoft.Network/publicIPAddresses".to_string(),
//!     name: "pip1".to_string(),
//! };
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Classification of a non-success HTTP status returned by the control plane.
///
/// The remote resource client maps every unexpected status onto one of these
/// kinds so callers can distinguish "not found" from "throttled" without
/// inspecting raw status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerErrorKind {
    /// 404 - the resource or its parent does not exist.
    NotFound,
    /// 409 - the request conflicts with the current resource state.
    Conflict,
    /// 400 / 422 - the server rejected the request body or parameters.
    ValidationRejected,
    /// 429 - the caller is being rate limited.
    Throttled,
    /// 401 / 403 - missing or insufficient credentials.
    Unauthorized,
    /// 5xx - the service is temporarily unable to handle the request.
    Unavailable,
    /// Any other unexpected status.
    Other,
}

impl ServerErrorKind {
    /// Classify an HTTP status code.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            409 => Self::Conflict,
            400 | 422 => Self::ValidationRejected,
            429 => Self::Throttled,
            401 | 403 => Self::Unauthorized,
            500..=599 => Self::Unavailable,
            _ => Self::Other,
        }
    }

    /// Whether a request failing with this kind may succeed when repeated.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Throttled | Self::Unavailable)
    }
}

impl fmt::Display for ServerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::ValidationRejected => "rejected by server validation",
            Self::Throttled => "throttled",
            Self::Unauthorized => "unauthorized",
            Self::Unavailable => "service unavailable",
            Self::Other => "unexpected status",
        };
        f.write_str(label)
    }
}

/// The main error type for armgen operations
///
/// Each variant names one failure mode and carries the values needed to report
/// it. Variants are grouped as described in the module documentation.
///
/// # Examples
///
/// ```rust,no_run
/// use armgen_cli::core::{ArmError, ServerErrorKind};
///
/// fn describe(error: &ArmError) -> &'static str {
///     match error {
///         ArmError::Validation { .. } => "fix the input and try again",
///         ArmError::Server { kind: ServerErrorKind::NotFound, .. } => "nothing to do",
///         e if e.is_retryable() => "try again later",
///         _ => "unexpected failure",
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum ArmError {
    /// A parameter or identifier is malformed.
    ///
    /// Raised by builders and by the remote client before any request is prepared.
    #[error("Invalid value for '{parameter}': {reason}")]
    Validation {
        /// Name of the offending parameter (e.g. "resourceName")
        parameter: String,
        /// What is wrong with the value
        reason: String,
    },

    /// No API version is registered for the resource kind.
    #[error("Unknown resource kind '{kind}'")]
    UnknownResourceKind {
        /// The fully-qualified resource type
        kind: String,
    },

    /// Two resources in one template share kind and name.
    #[error("Duplicate resource '{name}' of type '{kind}'")]
    DuplicateResource {
        /// Resource type of both entries
        kind: String,
        /// The colliding name
        name: String,
    },

    /// A `dependsOn` entry references a resource missing from the template.
    #[error("Resource '{resource}' depends on '{reference}', which is not part of the template")]
    DanglingDependency {
        /// The resource declaring the dependency
        resource: String,
        /// The unresolved reference
        reference: String,
        /// The closest existing resource name, if any is similar enough
        closest: Option<String>,
    },

    /// Dependencies form a cycle.
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// The cycle, rendered as `a → b → a`
        chain: String,
    },

    /// An expression uses `parameters('x')` but `x` is not declared.
    #[error("Resource '{resource}' uses undeclared template parameter '{parameter}'")]
    UndeclaredParameter {
        /// The resource containing the expression
        resource: String,
        /// The parameter name
        parameter: String,
    },

    /// A template document could not be interpreted.
    #[error("Invalid template: {reason}")]
    InvalidTemplate {
        /// Why the document was rejected
        reason: String,
    },

    /// A well-formed HTTP request could not be built.
    #[error("Failed to prepare {operation} request: {reason}")]
    RequestPreparation {
        /// Client operation (e.g. "SyncIdentityProviders.Get")
        operation: String,
        /// Why preparation failed
        reason: String,
    },

    /// The request never produced an HTTP response.
    #[error("Network error during {operation}: {reason}")]
    Transport {
        /// Client operation
        operation: String,
        /// Underlying connection or timeout error
        reason: String,
    },

    /// The control plane answered with an unexpected status.
    #[error("{operation} failed with HTTP {status} ({kind}): {message}")]
    Server {
        /// Client operation
        operation: String,
        /// HTTP status code
        status: u16,
        /// Classification of the status
        kind: ServerErrorKind,
        /// ARM error code from the response body, if any
        code: Option<String>,
        /// ARM error message, or the raw body when it is not an ARM error
        message: String,
    },

    /// Registering a resource provider namespace failed or timed out.
    #[error("Failed to register resource provider '{namespace}': {reason}")]
    ProviderRegistration {
        /// Provider namespace (e.g. "Microsoft.RedHatOpenShift")
        namespace: String,
        /// Why registration failed
        reason: String,
    },

    /// Configuration file or environment problem.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// The manifest file does not exist.
    #[error("Manifest file not found: {path}")]
    ManifestNotFound {
        /// Path that was looked up
        path: String,
    },

    /// The manifest file exists but cannot be parsed.
    #[error("Invalid manifest file syntax in {file}")]
    ManifestParseError {
        /// Manifest path
        file: String,
        /// Parser message
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("{message}")]
    Other {
        /// Free-form message
        message: String,
    },
}

impl ArmError {
    /// Shorthand for [`ArmError::Validation`].
    pub fn validation(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Whether repeating the failed request may succeed.
    ///
    /// Transport failures and throttled or unavailable server responses are
    /// retryable; everything else fails fast.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport {
                ..
            } => true,
            Self::Server {
                kind,
                ..
            } => kind.is_transient(),
            _ => false,
        }
    }

    /// Whether the control plane reported that the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Server {
                kind: ServerErrorKind::NotFound,
                ..
            }
        )
    }
}

impl Clone for ArmError {
    fn clone(&self) -> Self {
        match self {
            Self::Validation {
                parameter,
                reason,
            } => Self::Validation {
                parameter: parameter.clone(),
                reason: reason.clone(),
            },
            Self::UnknownResourceKind {
                kind,
            } => Self::UnknownResourceKind {
                kind: kind.clone(),
            },
            Self::DuplicateResource {
                kind,
                name,
            } => Self::DuplicateResource {
                kind: kind.clone(),
                name: name.clone(),
            },
            Self::DanglingDependency {
                resource,
                reference,
                closest,
            } => Self::DanglingDependency {
                resource: resource.clone(),
                reference: reference.clone(),
                closest: closest.clone(),
            },
            Self::CircularDependency {
                chain,
            } => Self::CircularDependency {
                chain: chain.clone(),
            },
            Self::UndeclaredParameter {
                resource,
                parameter,
            } => Self::UndeclaredParameter {
                resource: resource.clone(),
                parameter: parameter.clone(),
            },
            Self::InvalidTemplate {
                reason,
            } => Self::InvalidTemplate {
                reason: reason.clone(),
            },
            Self::RequestPreparation {
                operation,
                reason,
            } => Self::RequestPreparation {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::Transport {
                operation,
                reason,
            } => Self::Transport {
                operation: operation.clone(),
                reason: reason.clone(),
            },
            Self::Server {
                operation,
                status,
                kind,
                code,
                message,
            } => Self::Server {
                operation: operation.clone(),
                status: *status,
                kind: *kind,
                code: code.clone(),
                message: message.clone(),
            },
            Self::ProviderRegistration {
                namespace,
                reason,
            } => Self::ProviderRegistration {
                namespace: namespace.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::ManifestNotFound {
                path,
            } => Self::ManifestNotFound {
                path: path.clone(),
            },
            Self::ManifestParseError {
                file,
                reason,
            } => Self::ManifestParseError {
                file: file.clone(),
                reason: reason.clone(),
            },
            // For errors that don't implement Clone, convert to Other
            Self::IoError(e) => Self::Other {
                message: format!("IO error: {e}"),
            },
            Self::JsonError(e) => Self::Other {
                message: format!("JSON error: {e}"),
            },
            Self::TomlError(e) => Self::Other {
                message: format!("TOML parsing error: {e}"),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error wrapper carrying an optional suggestion and extra details for display.
///
/// ```rust,no_run
/// use armgen_cli::core::{ArmError, ErrorContext};
///
/// let context = ErrorContext::new(ArmError::ManifestNotFound {
///     path: "armgen.toml".to_string(),
/// })
/// .with_suggestion("Create armgen.toml or pass --manifest")
/// .with_details("generate reads resources from the manifest");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    pub error: ArmError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: ArmError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a displayable [`ErrorContext`].
///
/// The whole error chain is searched for an [`ArmError`] so errors wrapped with
/// `anyhow::Context` still receive tailored suggestions. Unknown errors fall
/// back to [`ArmError::Other`] carrying the full chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(arm_error) = error.chain().find_map(|e| e.downcast_ref::<ArmError>()) {
        return create_error_context(arm_error.clone());
    }

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ArmError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check file ownership and permissions of the target path")
                .with_details("armgen could not read or write a file");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ArmError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ArmError::Other {
        message,
    })
}

fn create_error_context(error: ArmError) -> ErrorContext {
    let (suggestion, details): (Option<String>, Option<String>) = match &error {
        ArmError::Validation {
            parameter,
            ..
        } => (
            Some(format!(
                "Fix '{parameter}'. Resource names are 1-63 characters: letters and digits, with '-' or '_' only between them"
            )),
            Some("Identifiers are validated before any request is sent".to_string()),
        ),

        ArmError::UnknownResourceKind {
            ..
        } => (
            Some("Run 'armgen kinds' to list the resource kinds with a pinned API version".to_string()),
            None,
        ),

        ArmError::DuplicateResource {
            ..
        } => (
            Some("Rename one of the resources or remove the duplicate entry".to_string()),
            Some("A template may contain each (type, name) pair only once".to_string()),
        ),

        ArmError::DanglingDependency {
            closest,
            ..
        } => (
            Some(match closest {
                Some(name) => {
                    format!("Did you mean '{name}'? Add the missing resource or fix the reference")
                }
                None => {
                    "Add the referenced resource to the template or drop the dependency".to_string()
                }
            }),
            Some("dependsOn may only reference resources declared in the same template".to_string()),
        ),

        ArmError::CircularDependency {
            ..
        } => (
            Some("Review dependsOn entries and remove one edge of the cycle".to_string()),
            Some("The control plane cannot order resources that depend on each other".to_string()),
        ),

        ArmError::UndeclaredParameter {
            parameter,
            ..
        } => (
            Some(format!("Declare the parameter under [parameters.{parameter}] in the manifest")),
            None,
        ),

        ArmError::Transport {
            ..
        } => (
            Some("Check your network connection and the configured base_uri".to_string()),
            Some("The request was retried with exponential backoff before giving up".to_string()),
        ),

        ArmError::Server {
            kind,
            ..
        } => {
            let suggestion = match kind {
                ServerErrorKind::NotFound => {
                    "Verify the subscription, resource group, cluster and child resource names"
                }
                ServerErrorKind::Unauthorized => {
                    "Set ARMGEN_ACCESS_TOKEN to a valid bearer token for the subscription"
                }
                ServerErrorKind::Throttled | ServerErrorKind::Unavailable => {
                    "The service is busy; wait a moment and retry"
                }
                ServerErrorKind::ValidationRejected => {
                    "Check the request body against the resource schema"
                }
                ServerErrorKind::Conflict => {
                    "Another operation may be in progress on this resource; retry once it completes"
                }
                ServerErrorKind::Other => "Inspect the error message returned by the service",
            };
            (Some(suggestion.to_string()), None)
        }

        ArmError::ProviderRegistration {
            namespace,
            ..
        } => (Some(format!("Register it manually: az provider register -n {namespace}")), None),

        ArmError::ConfigError {
            ..
        } => (
            Some("Run 'armgen config show' to inspect the effective configuration".to_string()),
            None,
        ),

        ArmError::ManifestNotFound {
            ..
        } => (
            Some(
                "Create an armgen.toml in the current directory or pass --manifest <path>"
                    .to_string(),
            ),
            None,
        ),

        ArmError::ManifestParseError {
            file,
            reason,
        } => (
            Some(format!(
                "Check the TOML syntax in {file}. Common issues: missing quotes, unknown resource kinds"
            )),
            Some(reason.clone()),
        ),

        _ => (None, None),
    };

    let mut context = ErrorContext::new(error);
    context.suggestion = suggestion;
    context.details = details;
    context
}
