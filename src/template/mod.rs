//! ARM deployment template construction.
//!
//! - [`expression`] - Literal strings vs. template function calls
//! - [`resource`] - [`ResourceDescription`], one resource of a template
//! - [`api_versions`] - Known resource kinds and their pinned API versions
//! - [`builders`] - One constructor per supported resource kind
//! - [`dependency_graph`] - Cycle detection and deployment ordering
//! - [`assembler`] - Validation and serialization of a whole template
//!
//! Builders and the assembler are pure: nothing in this module performs I/O.

pub mod api_versions;
pub mod assembler;
pub mod builders;
pub mod dependency_graph;
pub mod expression;
pub mod resource;

pub use assembler::{ParameterMetadata, ParameterType, Template, TemplateAssembler, TemplateParameter};
pub use expression::{NameSegment, TemplateExpression, TemplateValue};
pub use resource::{ResourceDescription, ResourceRef};
