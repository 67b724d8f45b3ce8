mod compile;
mod init;
mod schema;

pub use compile::handle_compile;
pub use init::handle_init;
pub use schema::handle_schema;

use crate::config::TypegraphConfig;
use std::path::{Path, PathBuf};

/// Common context passed to the command handlers that read the config
pub struct CommandContext {
    pub config: TypegraphConfig,
    /// Config file in use, `None` when running on defaults
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    /// Loads `explicit` when given, else the nearest config above `cwd`, else
    /// the defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> crate::error::Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self {
                config: TypegraphConfig::load_file(path)?,
                config_path: Some(path.to_path_buf()),
            });
        }
        match TypegraphConfig::load(cwd) {
            Ok((config, root)) => Ok(Self {
                config,
                config_path: Some(root.join(crate::config::CONFIG_FILE_NAME)),
            }),
            Err(crate::error::TypegraphError::NotInitialized) => Ok(Self {
                config: TypegraphConfig::default(),
                config_path: None,
            }),
            Err(e) => Err(e),
        }
    }
}
