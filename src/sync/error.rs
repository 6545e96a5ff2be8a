//! Remote sync error types.

/// Errors that can occur talking to the hosted data store.
#[derive(Debug)]
pub enum RemoteError {
    /// No endpoint or credential configured
    NotConfigured,
    /// Endpoint URL is malformed or not http(s)
    InvalidEndpoint(String),
    /// Credential cannot be sent as a header
    InvalidCredential,
    /// HTTP transport error
    HttpError(String),
    /// Server answered with a non-success status
    Status(u16, String),
    /// Response body could not be decoded
    DecodeError(String),
    /// WebSocket error on the realtime channel
    WebSocketError(String),
    /// Realtime channel join was refused
    HandshakeError(String),
    /// Realtime channel join timed out
    HandshakeTimeout,
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::NotConfigured => {
                write!(f, "Remote sync not configured. Set an endpoint URL and key.")
            }
            RemoteError::InvalidEndpoint(e) => write!(f, "Invalid endpoint: {}", e),
            RemoteError::InvalidCredential => write!(f, "Credential contains invalid characters"),
            RemoteError::HttpError(e) => write!(f, "HTTP error: {}", e),
            RemoteError::Status(code, body) => {
                write!(f, "Server returned status {}: {}", code, body)
            }
            RemoteError::DecodeError(e) => write!(f, "Failed to decode response: {}", e),
            RemoteError::WebSocketError(e) => write!(f, "WebSocket error: {}", e),
            RemoteError::HandshakeError(e) => write!(f, "Channel join failed: {}", e),
            RemoteError::HandshakeTimeout => write!(f, "Channel join timed out"),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::HttpError(e.to_string())
    }
}
