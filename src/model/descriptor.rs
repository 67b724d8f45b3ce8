use super::types::{Cardinality, ScalarKind};
use serde::{Deserialize, Serialize};

/// Names of the pre/post hooks attached to a field or a model's root resolvers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<String>,
}

impl HookConfig {
    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.post.is_empty()
    }
}

/// Shape of one declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Scalar {
        #[serde(rename = "type")]
        scalar: ScalarKind,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        enum_values: Vec<String>,
    },
    List {
        element: ElementKind,
    },
    Nested {
        fields: Vec<FieldDescriptor>,
    },
    Embedded {
        model: String,
        fields: Vec<FieldDescriptor>,
    },
    Reference {
        target: String,
        #[serde(default)]
        cardinality: Cardinality,
    },
}

/// Element shape of a list field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    Scalar {
        #[serde(rename = "type")]
        scalar: ScalarKind,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        enum_values: Vec<String>,
    },
    Nested {
        fields: Vec<FieldDescriptor>,
    },
    Embedded {
        model: String,
        fields: Vec<FieldDescriptor>,
    },
}

impl ElementKind {
    pub fn scalar(kind: ScalarKind) -> Self {
        ElementKind::Scalar {
            scalar: kind,
            enum_values: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    #[serde(flatten)]
    pub kind: FieldKind,

    #[serde(default)]
    pub non_null: bool,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "HookConfig::is_empty")]
    pub hooks: HookConfig,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            non_null: false,
            hidden: false,
            description: None,
            hooks: HookConfig::default(),
        }
    }

    pub fn scalar(name: impl Into<String>, scalar: ScalarKind) -> Self {
        Self::new(
            name,
            FieldKind::Scalar {
                scalar,
                enum_values: Vec::new(),
            },
        )
    }

    pub fn enumeration<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Scalar {
                scalar: ScalarKind::String,
                enum_values: values.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn list(name: impl Into<String>, element: ElementKind) -> Self {
        Self::new(name, FieldKind::List { element })
    }

    pub fn nested(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(name, FieldKind::Nested { fields })
    }

    pub fn embedded(
        name: impl Into<String>,
        model: impl Into<String>,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Embedded {
                model: model.into(),
                fields,
            },
        )
    }

    /// Single reference to a record of `target`.
    pub fn reference(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Reference {
                target: target.into(),
                cardinality: Cardinality::Single,
            },
        )
    }

    /// Array of references to records of `target`.
    pub fn references(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Reference {
                target: target.into(),
                cardinality: Cardinality::Plural,
            },
        )
    }

    pub fn non_null(mut self) -> Self {
        self.non_null = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_hooks(mut self, hooks: HookConfig) -> Self {
        self.hooks = hooks;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Unique within one synthesis run
    pub key: String,

    /// Output type name, also the name references use to target this model
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,

    #[serde(default, skip_serializing_if = "HookConfig::is_empty")]
    pub hooks: HookConfig,
}

impl ModelDescriptor {
    pub fn new(key: impl Into<String>, name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            version: None,
            description: None,
            fields,
            hooks: HookConfig::default(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_hooks(mut self, hooks: HookConfig) -> Self {
        self.hooks = hooks;
        self
    }

    /// Identity used in cache keys: the version tag when declared, else the key.
    pub fn cache_identity(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{}", self.key, version),
            None => self.key.clone(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}
