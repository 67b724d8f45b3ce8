use crate::error::{Result, TypegraphError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = ".typegraph.yml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypegraphConfig {
    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub synth: SynthSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_ttl_secs")]
    pub descriptor_ttl_secs: u64,

    #[serde(default = "default_ttl_secs")]
    pub type_ttl_secs: u64,

    #[serde(default = "default_ttl_secs")]
    pub schema_ttl_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            descriptor_ttl_secs: default_ttl_secs(),
            type_ttl_secs: default_ttl_secs(),
            schema_ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheSettings {
    pub fn descriptor_ttl(&self) -> Duration {
        Duration::from_secs(self.descriptor_ttl_secs)
    }

    pub fn type_ttl(&self) -> Duration {
        Duration::from_secs(self.type_ttl_secs)
    }

    pub fn schema_ttl(&self) -> Duration {
        Duration::from_secs(self.schema_ttl_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthSettings {
    /// Declared field preferred as the source of the identity field
    #[serde(default = "default_identity_field")]
    pub identity_field: String,

    /// Fallback source when no `identity_field` is declared
    #[serde(default = "default_legacy_identity_field")]
    pub legacy_identity_field: String,

    /// Fields whose name starts with this prefix never reach the output types
    #[serde(default = "default_reserved_prefix")]
    pub reserved_prefix: String,
}

fn default_identity_field() -> String {
    "id".to_string()
}

fn default_legacy_identity_field() -> String {
    "_id".to_string()
}

fn default_reserved_prefix() -> String {
    "__".to_string()
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            identity_field: default_identity_field(),
            legacy_identity_field: default_legacy_identity_field(),
            reserved_prefix: default_reserved_prefix(),
        }
    }
}

impl TypegraphConfig {
    pub fn load(start_path: &Path) -> Result<(Self, PathBuf)> {
        let config_path = Self::find_config_file(start_path)?;
        let config = Self::load_file(&config_path)?;
        let project_root = config_path
            .parent()
            .ok_or_else(|| {
                TypegraphError::Config("Config file has no parent directory".to_string())
            })?
            .to_path_buf();
        Ok((config, project_root))
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TypegraphConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Loads the nearest config file, or the defaults when the project has none.
    pub fn load_or_default(start_path: &Path) -> Result<Self> {
        match Self::load(start_path) {
            Ok((config, _)) => Ok(config),
            Err(TypegraphError::NotInitialized) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    pub fn find_config_file(start_path: &Path) -> Result<PathBuf> {
        let mut current = start_path.to_path_buf();
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }
            if !current.pop() {
                return Err(TypegraphError::NotInitialized);
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
