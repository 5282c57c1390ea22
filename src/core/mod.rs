//! Core types for armgen
//!
//! This module holds the error type shared by every other module and the
//! user-facing error reporting used by the CLI.
//!
//! - [`ArmError`] - Enumerated error types covering builder, assembler, client and
//!   configuration failures
//! - [`ServerErrorKind`] - Classification of unexpected HTTP statuses
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any `anyhow::Error` to user-friendly format
//!
//! # Error Handling Pattern
//!
//! ```rust
//! use armgen_cli::core::{ArmError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(ArmError::ManifestNotFound { path: "armgen.toml".to_string() }.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;

pub use error::{ArmError, ErrorContext, ServerErrorKind, user_friendly_error};
