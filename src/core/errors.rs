use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API error: {code} - {message}")]
    ApiError { code: i32, message: String },

    #[error("Arguments required: {0}")]
    ArgumentsRequired(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Bad symbol: {0}")]
    BadSymbol(String),

    #[error("Exchange error: {0}")]
    Exchange(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

/// Failure kinds an exchange error code can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ArgumentsRequired,
    Authentication,
    InvalidOrder,
    OrderNotFound,
    InsufficientFunds,
    InvalidAddress,
    BadSymbol,
    Exchange,
    Network,
    Other,
}

impl ErrorKind {
    /// Build the error of this kind carrying `feedback` as its message
    pub fn into_error(self, feedback: String) -> ExchangeError {
        match self {
            Self::ArgumentsRequired => ExchangeError::ArgumentsRequired(feedback),
            Self::Authentication => ExchangeError::AuthenticationError(feedback),
            Self::InvalidOrder => ExchangeError::InvalidOrder(feedback),
            Self::OrderNotFound => ExchangeError::OrderNotFound(feedback),
            Self::InsufficientFunds => ExchangeError::InsufficientFunds(feedback),
            Self::InvalidAddress => ExchangeError::InvalidAddress(feedback),
            Self::BadSymbol => ExchangeError::BadSymbol(feedback),
            Self::Network => ExchangeError::NetworkError(feedback),
            Self::Exchange | Self::Other => ExchangeError::Exchange(feedback),
        }
    }
}

impl ExchangeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ArgumentsRequired(_) => ErrorKind::ArgumentsRequired,
            Self::AuthenticationError(_) => ErrorKind::Authentication,
            Self::InvalidOrder(_) => ErrorKind::InvalidOrder,
            Self::OrderNotFound(_) => ErrorKind::OrderNotFound,
            Self::InsufficientFunds(_) => ErrorKind::InsufficientFunds,
            Self::InvalidAddress(_) => ErrorKind::InvalidAddress,
            Self::BadSymbol(_) => ErrorKind::BadSymbol,
            Self::Exchange(_) | Self::ApiError { .. } => ErrorKind::Exchange,
            Self::HttpError(_) | Self::NetworkError(_) => ErrorKind::Network,
            Self::JsonError(_)
            | Self::DeserializationError(_)
            | Self::SerializationError(_)
            | Self::NotSupported(_)
            | Self::ConfigError(_) => ErrorKind::Other,
        }
    }
}
