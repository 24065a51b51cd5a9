/// Errors that can occur when loading or validating a [`GameConfig`](super::GameConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// The file is not valid JSON or does not match the config shape.
    #[error("failed to parse config JSON: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    /// The values parsed but are not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}
