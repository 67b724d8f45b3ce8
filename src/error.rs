use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypegraphError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown reference target `{target}` at {owner}.{path}")]
    Configuration {
        owner: String,
        path: String,
        target: String,
    },

    #[error("Duplicate model key: {0}")]
    DuplicateModel(String),

    #[error("Reference at {owner}.{path} was left unresolved")]
    UnresolvedReference { owner: String, path: String },

    #[error("Unsupported selection: {0}")]
    UnsupportedSelection(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Project not initialized. Run 'typegraph init' first.")]
    NotInitialized,

    #[error("Project already initialized at {0}")]
    AlreadyInitialized(String),
}

pub type Result<T> = std::result::Result<T, TypegraphError>;
