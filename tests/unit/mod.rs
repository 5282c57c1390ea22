//! Unit test suite for armgen
//!
//! Exercises the public library API without the binary or the network.
//!
//! ```bash
//! cargo test --test unit
//! ```

mod builder_properties;
mod expressions;
mod identifiers;
mod template_roundtrip;
