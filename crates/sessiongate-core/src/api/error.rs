use thiserror::Error;

/// Shown when a transport failure carries nothing more specific.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred. Please try again later.";

/// The authentication call never produced an HTTP response.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Auth URL is not defined in environment variables")]
    MissingAuthUrl,

    #[error("Unable to connect to server. Check your internet connection.")]
    Connect(#[source] reqwest::Error),

    #[error("Connection timed out. Please try again.")]
    Timeout(#[source] reqwest::Error),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("{0}")]
    Other(String),

    #[error("An unknown error occurred. Please try again later.")]
    Unknown,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e)
        } else if e.is_connect() {
            TransportError::Connect(e)
        } else {
            TransportError::Network(e)
        }
    }
}

impl TransportError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}
