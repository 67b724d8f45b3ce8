use crate::model::{Cardinality, HookConfig, ScalarKind};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Canonical output scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    String,
    Float,
    Int,
    Boolean,
    Id,
    Date,
    Buffer,
    Json,
}

impl Scalar {
    pub fn name(&self) -> &'static str {
        match self {
            Scalar::String => "String",
            Scalar::Float => "Float",
            Scalar::Int => "Int",
            Scalar::Boolean => "Boolean",
            Scalar::Id => "ID",
            Scalar::Date => "Date",
            Scalar::Buffer => "Buffer",
            Scalar::Json => "JSON",
        }
    }

    /// Scalars the schema has to declare itself.
    pub const CUSTOM: [Scalar; 3] = [Scalar::Date, Scalar::Buffer, Scalar::Json];

    pub fn is_builtin_name(name: &str) -> bool {
        matches!(name, "String" | "Float" | "Int" | "Boolean" | "ID" | "Date" | "Buffer" | "JSON")
    }
}

impl From<&ScalarKind> for Scalar {
    fn from(kind: &ScalarKind) -> Self {
        match kind {
            ScalarKind::String => Scalar::String,
            ScalarKind::Number => Scalar::Float,
            ScalarKind::Date => Scalar::Date,
            ScalarKind::Buffer => Scalar::Buffer,
            ScalarKind::Boolean => Scalar::Boolean,
            ScalarKind::ObjectId => Scalar::Id,
            ScalarKind::Other(_) => Scalar::Json,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A field reference recorded during the first pass, before its target type exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSlot {
    /// Root type the path starts from
    pub owner: String,
    /// Dotted path of descriptor field names below `owner`
    pub path: String,
    /// Model name the reference points at
    pub target: String,
    pub cardinality: Cardinality,
    pub non_null: bool,
}

/// Type of an output field. Named variants refer to entries of the [`TypeGraph`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Scalar(Scalar),
    Enum(String),
    Object(String),
    Connection(String),
    List(Box<FieldType>),
    NonNull(Box<FieldType>),
    Unresolved(ReferenceSlot),
}

impl FieldType {
    pub fn non_null(self) -> Self {
        match self {
            FieldType::NonNull(_) => self,
            other => FieldType::NonNull(Box::new(other)),
        }
    }

    pub fn list(self) -> Self {
        FieldType::List(Box::new(self))
    }

    /// Strips an outer non-null wrapper.
    pub fn nullable(&self) -> &FieldType {
        match self {
            FieldType::NonNull(inner) => inner,
            other => other,
        }
    }

    /// Strips every list and non-null wrapper.
    pub fn innermost(&self) -> &FieldType {
        match self {
            FieldType::NonNull(inner) | FieldType::List(inner) => inner.innermost(),
            other => other,
        }
    }

    pub fn object_name(&self) -> Option<&str> {
        match self.innermost() {
            FieldType::Object(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.nullable(), FieldType::List(_))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.innermost(), FieldType::Unresolved(_))
    }
}

/// Type of an argument or input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    Named(String),
    List(Box<ArgType>),
}

impl ArgType {
    pub fn named(name: impl Into<String>) -> Self {
        ArgType::Named(name.into())
    }

    pub fn list_of(name: impl Into<String>) -> Self {
        ArgType::List(Box::new(ArgType::Named(name.into())))
    }

    pub fn innermost(&self) -> &str {
        match self {
            ArgType::Named(name) => name,
            ArgType::List(inner) => inner.innermost(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDef {
    pub name: String,
    pub ty: ArgType,
}

impl ArgumentDef {
    pub fn new(name: impl Into<String>, ty: ArgType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputField {
    pub name: String,
    /// Storage field the value is read from
    pub source: String,
    pub ty: FieldType,
    pub description: Option<String>,
    pub args: Vec<ArgumentDef>,
    pub hooks: HookConfig,
    pub identity: bool,
}

impl OutputField {
    pub fn identity(source: impl Into<String>) -> Self {
        Self {
            name: "id".to_string(),
            source: source.into(),
            ty: FieldType::Scalar(Scalar::Id).non_null(),
            description: Some("Globally unique identifier".to_string()),
            args: Vec::new(),
            hooks: HookConfig::default(),
            identity: true,
        }
    }

    pub fn arg(&self, name: &str) -> Option<&ArgumentDef> {
        self.args.iter().find(|a| a.name == name)
    }
}

#[derive(Debug)]
pub struct IdentityInterface {
    pub interface: String,
    pub field: String,
}

/// Marker granting a root type a globally lookupable `id`. Two capabilities are
/// equal only when they share the same underlying object.
#[derive(Clone)]
pub struct IdentityCapability(Arc<IdentityInterface>);

impl IdentityCapability {
    pub fn new() -> Self {
        Self(Arc::new(IdentityInterface {
            interface: "Node".to_string(),
            field: "id".to_string(),
        }))
    }

    pub fn interface(&self) -> &str {
        &self.0.interface
    }

    pub fn field(&self) -> &str {
        &self.0.field
    }

    pub fn same_as(&self, other: &IdentityCapability) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for IdentityCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for IdentityCapability {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for IdentityCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityCapability({}@{:p})", self.0.interface, Arc::as_ptr(&self.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, OutputField>,
    pub identity: Option<IdentityCapability>,
    pub embedded: bool,
    /// Hooks around the root resolvers of a model type
    pub hooks: HookConfig,
}

impl OutputType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            identity: None,
            embedded: false,
            hooks: HookConfig::default(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&OutputField> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn has_identity_of(&self, capability: &IdentityCapability) -> bool {
        self.identity.as_ref().is_some_and(|c| c.same_as(capability))
    }

    /// A copy of this type bound to `capability`.
    pub fn with_identity(&self, capability: &IdentityCapability) -> OutputType {
        OutputType {
            identity: Some(capability.clone()),
            ..self.clone()
        }
    }
}

/// One enum item and the stored value it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<EnumValue>,
}

impl EnumType {
    /// Item names are unique; several stored values may share one item.
    pub fn item_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for value in &self.values {
            if !names.contains(&value.name.as_str()) {
                names.push(&value.name);
            }
        }
        names
    }

    pub fn item_for(&self, source: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.source == source)
            .map(|v| v.name.as_str())
    }

    pub fn source_of(&self, item: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name == item)
            .map(|v| v.source.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub name: String,
    pub ty: ArgType,
}

/// Input-only mirror of an object type, used by `all` and `elemMatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputType {
    pub name: String,
    pub fields: IndexMap<String, InputField>,
}

/// Paginated wrapper around a plural reference: `count` plus `edges { node cursor }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionType {
    pub name: String,
    pub edge: String,
    /// Type name of the referenced model
    pub node: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NamedType {
    Object(Arc<OutputType>),
    Enum(Arc<EnumType>),
    Input(Arc<InputType>),
    Connection(Arc<ConnectionType>),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            NamedType::Object(t) => &t.name,
            NamedType::Enum(t) => &t.name,
            NamedType::Input(t) => &t.name,
            NamedType::Connection(t) => &t.name,
        }
    }
}

/// Cached artifact for one model: its root type plus every unregistered type
/// the root reaches.
#[derive(Debug, Clone)]
pub struct ModelTypes {
    pub key: String,
    pub root: Arc<OutputType>,
    pub dependents: Vec<NamedType>,
}

impl ModelTypes {
    pub fn with_identity(&self, capability: &IdentityCapability) -> ModelTypes {
        ModelTypes {
            key: self.key.clone(),
            root: Arc::new(self.root.with_identity(capability)),
            dependents: self.dependents.clone(),
        }
    }
}

/// The synthesized output: registered model types plus the nested, embedded,
/// enum, input and connection types they use.
#[derive(Debug, Clone)]
pub struct TypeGraph {
    pub(crate) identity: IdentityCapability,
    pub(crate) models: IndexMap<String, Arc<OutputType>>,
    pub(crate) types: IndexMap<String, NamedType>,
}

impl TypeGraph {
    pub fn identity(&self) -> &IdentityCapability {
        &self.identity
    }

    pub fn model(&self, name: &str) -> Option<&Arc<OutputType>> {
        self.models.get(name)
    }

    pub fn models(&self) -> impl Iterator<Item = &Arc<OutputType>> {
        self.models.values()
    }

    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.values()
    }

    pub fn get(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    /// A registered model type or an unregistered nested/embedded type.
    pub fn object(&self, name: &str) -> Option<&Arc<OutputType>> {
        self.models.get(name).or_else(|| match self.types.get(name) {
            Some(NamedType::Object(t)) => Some(t),
            _ => None,
        })
    }

    pub fn enum_type(&self, name: &str) -> Option<&Arc<EnumType>> {
        match self.types.get(name) {
            Some(NamedType::Enum(t)) => Some(t),
            _ => None,
        }
    }

    pub fn input(&self, name: &str) -> Option<&Arc<InputType>> {
        match self.types.get(name) {
            Some(NamedType::Input(t)) => Some(t),
            _ => None,
        }
    }

    pub fn connection(&self, name: &str) -> Option<&Arc<ConnectionType>> {
        match self.types.get(name) {
            Some(NamedType::Connection(t)) => Some(t),
            _ => None,
        }
    }

    /// Object type a field's value is shaped like, if any.
    pub fn object_of(&self, ty: &FieldType) -> Option<&Arc<OutputType>> {
        ty.object_name().and_then(|name| self.object(name))
    }

    /// Walks a dotted path of output field names from `root`.
    pub fn field_at(&self, root: &str, path: &str) -> Option<&OutputField> {
        let mut current = self.object(root)?;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let field = current.field(segment)?;
            if segments.peek().is_none() {
                return Some(field);
            }
            current = self.object_of(&field.ty)?;
        }
        None
    }
}
