//! Filter and sort arguments attached to output fields.
//!
//! Scalar, enum and list-of-scalar fields get the eight comparison operators
//! plus `op`, `sort` and `sortOrder`. List-of-object fields get `all`, `size`
//! and `elemMatch`, typed against an input mirror of the element type.

use super::naming::input_type_name;
use super::types::{ArgType, ArgumentDef, FieldType, InputField, InputType, OutputType, Scalar};
use crate::model::Cardinality;
use indexmap::IndexMap;

pub const SORT_DIRECTION_ENUM: &str = "SortDirection";
pub const SORT_DIRECTIONS: [&str; 2] = ["ASC", "DESC"];

pub const LOGICAL_OPERATOR_ENUM: &str = "LogicalOperator";
pub const LOGICAL_OPERATORS: [&str; 4] = ["AND", "OR", "NOT", "NOR"];

pub const COMPARISON_ARGS: [&str; 8] = ["eq", "gt", "gte", "lt", "lte", "ne", "in", "nin"];
pub const OP_ARG: &str = "op";
pub const SORT_ARG: &str = "sort";
pub const SORT_ORDER_ARG: &str = "sortOrder";
pub const ALL_ARG: &str = "all";
pub const SIZE_ARG: &str = "size";
pub const ELEM_MATCH_ARG: &str = "elemMatch";

/// Derives field arguments. Input mirrors are memoized in `inputs`, one per
/// object type, and shared by every field that lists that object.
pub struct ArgumentDeriver<'a> {
    objects: &'a IndexMap<String, OutputType>,
    inputs: &'a mut IndexMap<String, InputType>,
}

impl<'a> ArgumentDeriver<'a> {
    pub fn new(
        objects: &'a IndexMap<String, OutputType>,
        inputs: &'a mut IndexMap<String, InputType>,
    ) -> Self {
        Self { objects, inputs }
    }

    pub fn derive(&mut self, ty: &FieldType) -> Vec<ArgumentDef> {
        match ty.nullable() {
            FieldType::Scalar(scalar) => comparison_args(scalar.name()),
            FieldType::Enum(name) => comparison_args(name),
            FieldType::List(element) => match element.nullable() {
                FieldType::Scalar(scalar) => comparison_args(scalar.name()),
                FieldType::Enum(name) => comparison_args(name),
                FieldType::Object(name) => self.array_args(name),
                _ => Vec::new(),
            },
            FieldType::Object(_)
            | FieldType::Connection(_)
            | FieldType::Unresolved(_)
            | FieldType::NonNull(_) => Vec::new(),
        }
    }

    fn array_args(&mut self, element: &str) -> Vec<ArgumentDef> {
        let mut args = Vec::new();
        if let Some(mirror) = self.mirror(element) {
            args.push(ArgumentDef::new(ALL_ARG, ArgType::list_of(mirror.as_str())));
            args.push(ArgumentDef::new(SIZE_ARG, ArgType::named(Scalar::Int.name())));
            args.push(ArgumentDef::new(ELEM_MATCH_ARG, ArgType::named(mirror)));
        } else {
            args.push(ArgumentDef::new(SIZE_ARG, ArgType::named(Scalar::Int.name())));
        }
        args
    }

    /// Name of the input mirror for `object`, building it on first use.
    /// `None` while the object is still under construction or has no fields.
    fn mirror(&mut self, object: &str) -> Option<String> {
        let name = input_type_name(object);
        if self.inputs.contains_key(&name) {
            return Some(name);
        }
        let objects: &'a IndexMap<String, OutputType> = self.objects;
        let source = objects.get(object)?;

        // placeholder first so self-containing shapes terminate
        self.inputs.insert(
            name.clone(),
            InputType {
                name: name.clone(),
                fields: IndexMap::new(),
            },
        );

        let mut fields = IndexMap::new();
        for field in source.fields.values() {
            if let Some(ty) = self.input_type(&field.ty) {
                let input = InputField {
                    name: field.name.clone(),
                    ty,
                };
                fields.insert(field.name.clone(), input);
            }
        }

        if fields.is_empty() {
            self.inputs.shift_remove(&name);
            return None;
        }
        self.inputs.insert(name.clone(), InputType { name: name.clone(), fields });
        Some(name)
    }

    fn input_type(&mut self, ty: &FieldType) -> Option<ArgType> {
        match ty {
            FieldType::NonNull(inner) => self.input_type(inner),
            FieldType::List(inner) => self.input_type(inner).map(|t| ArgType::List(Box::new(t))),
            FieldType::Scalar(scalar) => Some(ArgType::named(scalar.name())),
            FieldType::Enum(name) => Some(ArgType::named(name.clone())),
            FieldType::Object(name) => match self.mirror(name) {
                Some(mirror) => Some(ArgType::Named(mirror)),
                // a referenced model is matched by its id
                None if !self.objects.contains_key(name) => Some(ArgType::named(Scalar::Id.name())),
                None => None,
            },
            FieldType::Unresolved(slot) => Some(match slot.cardinality {
                Cardinality::Single => ArgType::named(Scalar::Id.name()),
                Cardinality::Plural => ArgType::list_of(Scalar::Id.name()),
            }),
            FieldType::Connection(_) => None,
        }
    }
}

fn comparison_args(element: &str) -> Vec<ArgumentDef> {
    let mut args: Vec<ArgumentDef> = COMPARISON_ARGS
        .iter()
        .map(|op| {
            let ty = match *op {
                "in" | "nin" => ArgType::list_of(element),
                _ => ArgType::named(element),
            };
            ArgumentDef::new(*op, ty)
        })
        .collect();
    args.push(ArgumentDef::new(OP_ARG, ArgType::named(LOGICAL_OPERATOR_ENUM)));
    args.push(ArgumentDef::new(SORT_ARG, ArgType::named(SORT_DIRECTION_ENUM)));
    args.push(ArgumentDef::new(SORT_ORDER_ARG, ArgType::named(Scalar::Int.name())));
    args
}
