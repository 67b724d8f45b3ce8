//! Model descriptors consumed by the synthesizer.
//!
//! - [`ModelDescriptor`]: one data model (key, type name, version tag, fields)
//! - [`FieldDescriptor`]: one declared field with its [`FieldKind`]
//! - [`ModelSet`]: YAML-backed [`DescriptorSource`]

mod descriptor;
mod source;
mod types;

pub use descriptor::{ElementKind, FieldDescriptor, FieldKind, HookConfig, ModelDescriptor};
pub use source::{DescriptorSource, ModelSet};
pub use types::{Cardinality, ScalarKind};
