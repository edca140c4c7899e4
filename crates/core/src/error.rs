/// Result alias that carries the custom [`SortSoundError`] type.
pub type Result<T> = std::result::Result<T, SortSoundError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SortSoundError {
    /// An algorithm or caller touched a slot outside the dataset. Never
    /// reachable through the controller's public surface; seeing it means a
    /// step machine is broken.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// A bar count, speed level or other setting fell outside its bounds.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The requested algorithm name is not registered.
    #[error("unsupported algorithm `{0}`")]
    UnsupportedAlgorithm(String),
    /// A line of user input could not be turned into a command.
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    /// A render or audio sink failed to deliver its side effect.
    #[error("sink failure: {0}")]
    Sink(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration or report (de)serialisation failed.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl SortSoundError {
    /// Creates a sink error that simply wraps the provided message.
    pub fn sink<T: Into<String>>(msg: T) -> Self {
        Self::Sink(msg.into())
    }

    pub fn invalid_config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
