//! Integration test suite for armgen
//!
//! End-to-end tests for the `armgen` binary and for the remote resource client
//! against a mocked ARM endpoint. No test touches the real control plane.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **generate**: manifest to template generation
//! - **validate**: template re-validation and deployment order
//! - **commands**: `kinds` and `config`
//! - **sync_idp_client**: `SyncIdentityProvidersClient` against wiremock
//! - **sync_idp_cli**: `armgen sync-idp` against wiremock

#[path = "../common/mod.rs"]
mod common;

mod generate;
mod sync_idp_client;
mod validate;
