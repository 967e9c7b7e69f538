use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid channel choice {choice}: expected 1..=4")]
    InvalidChannelChoice { choice: usize },

    #[error("Unknown payment channel '{name}'")]
    UnknownChannel { name: String },

    #[error("Unknown record field '{name}'")]
    UnknownField { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed export document: {reason}")]
    MalformedExport { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// True for rejections caused by caller arguments rather than the
    /// environment. Store state is always unchanged for these.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidChannelChoice { .. }
                | Self::UnknownChannel { .. }
                | Self::UnknownField { .. }
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
