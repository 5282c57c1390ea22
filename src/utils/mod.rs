//! Utility functions for armgen
//!
//! - [`fs`] - Atomic file writes and user path expansion

pub mod fs;

pub use fs::{atomic_write, expand_path, safe_write};
