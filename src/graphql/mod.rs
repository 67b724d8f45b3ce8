//! Export of a [`TypeGraph`](crate::graph::TypeGraph) as an executable
//! `async_graphql` dynamic schema.
//!
//! ## Schema
//!
//! - **Scalars**: `Date`, `Buffer`, `JSON` on top of the built-ins
//! - **Interface**: `Node { id: ID! }`, implemented by every model type
//! - **Queries**: `<model>Many(limit, skip)` and `<model>ById(id)` per model
//!
//! Root fields go through the caller's [`Resolver`](crate::hooks::Resolver)
//! with the filter and sort compiled from the request already attached.

mod schema;

pub use schema::{NoData, QUERY_TYPE, build_schema};
