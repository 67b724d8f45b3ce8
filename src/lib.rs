//! # Typegraph - GraphQL type graphs from data models
//!
//! Typegraph turns declarative data-model descriptions into a graph of
//! queryable output types, and compiles a client's field selection, annotated
//! with comparison and sort arguments, into a document-query filter and an
//! ordered sort specification.
//!
//! ## Features
//!
//! - **Type synthesis**: nested, embedded and enum types, with mutual and self references
//! - **Caching**: descriptor, type and schema caches with sliding TTLs
//! - **Filter/sort compiler**: `$eq`..`$nin`, `$and/$or/$not/$nor`, prioritized sorts
//! - **Hooks**: ordered pre/post hooks around any resolver
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a default config
//! typegraph init
//!
//! # Print the SDL for a model file
//! typegraph schema models.yml
//!
//! # Compile a selection
//! typegraph compile '{ userMany { age(gt: 21, sort: DESC) } }'
//! ```
//!
//! ## Modules
//!
//! - [`cache`]: TTL stores and single-flight cache layers
//! - [`cli`]: Command-line interface definitions
//! - [`compile`]: Filter and sort compiler
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases
//! - [`graph`]: Type graph values and the synthesizer
//! - [`graphql`]: Dynamic schema export
//! - [`hooks`]: Resolver hook composition
//! - [`model`]: Model descriptors

/// Caching for descriptors, per-model types and whole graphs.
pub mod cache;

/// Command-line interface definitions using clap.
pub mod cli;

/// Selection-tree to filter and sort compilation.
pub mod compile;

/// Configuration loading and management.
///
/// Handles `.typegraph.yml` configuration files and project discovery.
pub mod config;

/// Error types and result aliases.
///
/// Defines `TypegraphError` enum and `Result<T>` type alias.
pub mod error;

/// Type graph synthesis.
pub mod graph;

/// GraphQL schema export.
///
/// Registers a type graph into an async-graphql dynamic schema.
pub mod graphql;

/// Pre/post hooks around resolvers.
pub mod hooks;

/// Logging setup.
pub mod logging;

/// Model descriptors and their YAML loader.
pub mod model;
