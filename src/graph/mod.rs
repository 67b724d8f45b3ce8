//! Type graph synthesis.
//!
//! A [`Synthesizer`] turns a set of [`ModelDescriptor`](crate::model::ModelDescriptor)s
//! into a [`TypeGraph`] in two phases: every model's fields are built first,
//! with references left as placeholder slots, then each slot is replaced by
//! its target model type or a connection over it. Types refer to each other
//! by name, so mutual and self references need no special handling.

pub mod args;
pub mod naming;
mod synth;
mod types;

pub use synth::Synthesizer;
pub use types::{
    ArgType, ArgumentDef, ConnectionType, EnumType, EnumValue, FieldType, IdentityCapability,
    IdentityInterface, InputField, InputType, ModelTypes, NamedType, OutputField, OutputType,
    ReferenceSlot, Scalar, TypeGraph,
};
