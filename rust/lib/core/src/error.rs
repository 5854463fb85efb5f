use thiserror::Error;

/// Failure to load or save a [`crate::ClientConfig`] file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config encode: {0}")]
    Encode(#[from] toml::ser::Error),
}
