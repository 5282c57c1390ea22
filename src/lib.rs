//! armgen - ARM template generator and typed Azure child-resource client
//!
//! Two independent halves share one error type and one configuration layer:
//!
//! - **Templates**: typed builders produce [`template::ResourceDescription`]s
//!   for a fixed set of Azure resource kinds, and the
//!   [`template::TemplateAssembler`] combines them into a deployment template,
//!   rejecting duplicates, dangling `dependsOn` references, dependency cycles,
//!   and undeclared parameters before anything is written.
//! - **Remote client**: [`client::ChildResourceApi`] is the CRUD contract for a
//!   child resource nested under a parent resource; the generic
//!   [`client::ChildResourceClient`] implements it with retries, provider
//!   registration, and lazy pagination, and
//!   [`client::SyncIdentityProvidersClient`] specialises it to OpenShift sync
//!   identity providers.
//!
//! # Core Modules
//!
//! - [`template`] - Expressions, resource descriptions, builders, and the assembler
//! - [`client`] - ARM HTTP plumbing, identifier validation, paging, and the child-resource client
//! - [`manifest`] - `armgen.toml` parsing, the declarative input of `armgen generate`
//! - [`config`] - Global configuration (`~/.armgen/config.toml`)
//! - [`core`] - Error types and user-facing error reporting
//! - [`cli`] - Command-line interface
//! - [`utils`] - Atomic file writes and path expansion
//!
//! # Example
//!
//! ```rust,no_run
//! use armgen_cli::template::{TemplateAssembler, builders};
//!
//! # fn example() -> Result<(), armgen_cli::core::ArmError> {
//! let [forward, backward] = builders::virtual_network_peerings("hub", "spoke")?;
//! let template = TemplateAssembler::new()
//!     .add_resource(builders::virtual_network("hub", &["10.0.0.0/16"])?)
//!     .add_resource(builders::virtual_network("spoke", &["10.1.0.0/16"])?)
//!     .add_resources([forward, backward])
//!     .assemble()?;
//! println!("{}", template.to_json_string(true)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! armgen generate                       # armgen.toml -> azuredeploy.json
//! armgen validate azuredeploy.json --order
//! armgen kinds
//! armgen sync-idp list -g my-rg -c my-cluster
//! armgen config init
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod core;
pub mod manifest;
pub mod template;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
