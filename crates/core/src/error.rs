/// Result alias that carries the custom [`FractalBeatError`] type.
pub type Result<T> = std::result::Result<T, FractalBeatError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum FractalBeatError {
    /// A plain descriptive message. Used for validation failures such as an
    /// unknown shape or palette name, where no richer category is needed.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Raised when a settings file cannot be parsed.
    #[error("invalid settings: {0}")]
    Config(#[from] serde_json::Error),
}

impl FractalBeatError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for FractalBeatError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for FractalBeatError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
