//! # ntnx-core
//!
//! Core types and utilities for working with the Nutanix Acropolis APIs.
//!
//! This crate provides the shared error type, connection configuration, typed
//! identifiers, endpoint resolution and the HTTP transport used by the
//! resource clients.
//!
//! ## Modules
//!
//! - [`error`] - Error types and status classification
//! - [`uuid`] - Strongly-typed identifier wrappers for Acropolis resources
//! - [`types`] - API endpoint (base URL) resolution
//! - [`config`] - Connection configuration
//! - [`client`] - HTTP transport and client settings

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod types;
pub mod uuid;

// Re-export commonly used types
pub use error::{Error, Result};
