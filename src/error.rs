use thiserror::Error;

pub type Result<T> = std::result::Result<T, CspError>;

#[derive(Error, Debug)]
pub enum CspError {
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown hash algorithm '{0}' (expected sha256, sha384, or sha512)")]
    UnknownAlgorithm(String),

    #[error("Invalid modification '{0}' (expected add:<directive>:<value> or remove:<directive>:<value>)")]
    Modification(String),

    #[error("No HTML files found under: {0}")]
    NoInput(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CspError {
    pub fn exit_code(&self) -> i32 {
        2
    }
}
