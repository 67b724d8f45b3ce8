use super::descriptor::ModelDescriptor;
use crate::error::{Result, TypegraphError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supplies model descriptors by key. Implemented by whatever introspects the
/// concrete storage schema.
pub trait DescriptorSource: Send + Sync {
    fn keys(&self) -> Vec<String>;

    fn describe(&self, key: &str) -> Result<ModelDescriptor>;
}

/// A set of models read from a YAML document of the form `models: [...]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSet {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

impl ModelSet {
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        Self { models }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let set: ModelSet = serde_yaml::from_str(content)?;
        Ok(set)
    }
}

impl DescriptorSource for ModelSet {
    fn keys(&self) -> Vec<String> {
        self.models.iter().map(|m| m.key.clone()).collect()
    }

    fn describe(&self, key: &str) -> Result<ModelDescriptor> {
        self.models
            .iter()
            .find(|m| m.key == key)
            .cloned()
            .ok_or_else(|| TypegraphError::Config(format!("Model not found: {}", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldKind;

    const MODELS: &str = r#"
models:
  - key: users
    name: User
    version: "3"
    fields:
      - name: name
        kind: scalar
        type: String
      - name: friends
        kind: reference
        target: User
        cardinality: plural
      - name: address
        kind: nested
        fields:
          - name: city
            kind: scalar
            type: String
"#;

    #[test]
    fn test_load_model_set() {
        let set = ModelSet::from_yaml(MODELS).unwrap();
        assert_eq!(set.keys(), vec!["users".to_string()]);

        let user = set.describe("users").unwrap();
        assert_eq!(user.version.as_deref(), Some("3"));
        assert_eq!(user.fields.len(), 3);
        assert!(matches!(user.fields[2].kind, FieldKind::Nested { .. }));
    }

    #[test]
    fn test_describe_unknown_key() {
        let set = ModelSet::from_yaml(MODELS).unwrap();
        let err = set.describe("posts").unwrap_err();
        assert!(err.to_string().contains("Model not found: posts"));
    }
}
