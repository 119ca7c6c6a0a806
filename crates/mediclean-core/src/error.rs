//! Error types for MediClean

/// Result type alias using MediClean's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pipeline operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input or missing required columns
    #[error("data error: {0}")]
    Data(String),

    /// Class balancing cannot proceed
    #[error("imbalance error: {0}")]
    Imbalance(String),

    /// Training or prediction failure
    #[error("model error: {0}")]
    Model(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors while staging artifacts
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new data error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    /// Create a new imbalance error
    pub fn imbalance(msg: impl Into<String>) -> Self {
        Self::Imbalance(msg.into())
    }

    /// Create a new model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable machine-readable kind, used in API responses and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Data(_) => "data_error",
            Self::Imbalance(_) => "imbalance_error",
            Self::Model(_) => "model_error",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => Self::Io(io),
                other => Self::Data(format!("{:?}", other)),
            }
        } else {
            Self::Data(format!("malformed table: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(Error::data("x").kind(), "data_error");
        assert_eq!(Error::imbalance("x").kind(), "imbalance_error");
        assert_eq!(Error::model("x").kind(), "model_error");
        assert_eq!(Error::config("x").kind(), "config_error");
    }

    #[test]
    fn test_display_includes_message() {
        let err = Error::data("missing column `Notes`");
        assert_eq!(err.to_string(), "data error: missing column `Notes`");
    }
}
