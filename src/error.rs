use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("IO error ({context}): {source}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
    #[error("Connection timeout")]
    Timeout,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),
    #[error("Invalid measurement type: {0}")]
    InvalidMeasurementType(String),
    #[error("Invalid measurement slot: {0} (expected 1-8)")]
    InvalidSlot(u8),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{model} has {available} analog channels, {requested} requested")]
    ModelMismatch {
        model: String,
        requested: usize,
        available: usize,
    },
    #[error("Could not parse reply to {command}: {reply:?}")]
    Parse { command: String, reply: String },
}

impl From<std::io::Error> for ScopeError {
    fn from(source: std::io::Error) -> Self {
        if matches!(
            source.kind(),
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
        ) {
            return ScopeError::Timeout;
        }
        ScopeError::Io {
            source,
            context: "transport".to_string(),
        }
    }
}
