use thiserror::Error;

/// Problems found while building or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown delivery mode: {0}")]
    UnknownMode(String),
    #[error("invalid highlight matcher {pattern:?}: {error}")]
    InvalidMatcher {
        pattern: String,
        #[source]
        error: regex::Error,
    },
    #[error("polling mode requires an endpoint")]
    MissingEndpoint,
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
    #[error("invalid request method: {0}")]
    InvalidMethod(String),
}

/// Failures raised while fetching a polled payload.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error("invalid request method: {0}")]
    InvalidMethod(String),
    #[error("request task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error("no console widget is attached to this element")]
    UnknownWidget,
    #[error("element is not part of the document")]
    UnknownElement,
}
