//! Device error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Listener start failed: {0}")]
    Listen(#[source] std::io::Error),

    #[error("Accept failed: {0}")]
    Accept(#[source] std::io::Error),

    #[error("Connection deadline of {0}ms elapsed")]
    Deadline(u64),

    #[error("Request read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("Request head exceeds {0} bytes")]
    RequestTooLarge(usize),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Response write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("Hardware error: {0}")]
    Hardware(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DeviceError {
    /// Short label used when counting abandoned connections.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Deadline(_) => "deadline",
            Self::Read(_) => "read",
            Self::RequestTooLarge(_) | Self::MalformedRequest(_) => "parse",
            Self::Write(_) => "write",
            Self::Listen(_) | Self::Accept(_) => "accept",
            Self::Hardware(_) | Self::Config(_) => "other",
        }
    }
}

pub type DeviceResult<T> = Result<T, DeviceError>;
