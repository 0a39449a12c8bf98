use thiserror::Error;

/// Top-level error type for the forwarder daemon.
#[derive(Error, Debug)]
pub enum ForwarderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] crate::monitor::MonitorError),
}

/// Configuration errors. All of these are fatal before any monitor is built.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Invalid address format for {key}: {value}")]
    InvalidAddress { key: String, value: String },

    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("No networks configured")]
    NoNetworks,

    #[error("Duplicate network name: {0}")]
    DuplicateNetwork(String),
}
