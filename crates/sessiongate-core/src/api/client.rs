//! HTTP authenticator for the login endpoint.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TransportError;

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application-level code the endpoint uses to signal success.
const SUCCESS_STATUS_CODE: i64 = 200;

// ============================================================================
// Wire types
// ============================================================================

/// Username and password for one login attempt.
///
/// Serialized with the capitalized field names the endpoint expects.
#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Password")]
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body returned by the endpoint, e.g. `{ "statusCode": 200, "message": "OK" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthReplyBody {
    #[serde(rename = "statusCode", default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Any HTTP response from the endpoint, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthReply {
    pub status: u16,
    pub body: AuthReplyBody,
}

impl AuthReply {
    pub fn new(status: u16, body: AuthReplyBody) -> Self {
        Self { status, body }
    }

    /// HTTP 200 and an application-level success code, nothing else.
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK.as_u16() && self.body.status_code == Some(SUCCESS_STATUS_CODE)
    }

    /// Server-provided message, ignoring blank strings.
    pub fn message(&self) -> Option<&str> {
        self.body
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

// ============================================================================
// Authenticator
// ============================================================================

/// The remote service that validates credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// `Err` only when no HTTP response was received.
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthReply, TransportError>;
}

/// Authenticator backed by a JSON POST to `auth_url`.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpAuthenticator {
    client: Client,
    auth_url: Option<String>,
}

impl HttpAuthenticator {
    /// A missing URL is not an error here; each login attempt reports it.
    pub fn new(auth_url: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            auth_url: auth_url.filter(|url| !url.trim().is_empty()),
        })
    }

    pub fn with_default_timeout(auth_url: Option<String>) -> Result<Self> {
        Self::new(auth_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn auth_url(&self) -> Option<&str> {
        self.auth_url.as_deref()
    }

    /// Parse a response body leniently; anything unexpected becomes an empty body.
    fn parse_body(text: &str) -> AuthReplyBody {
        match serde_json::from_str::<AuthReplyBody>(text) {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "Unparseable auth response body");
                AuthReplyBody::default()
            }
        }
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthReply, TransportError> {
        let url = self.auth_url.as_deref().ok_or(TransportError::MissingAuthUrl)?;

        debug!(username = %credentials.username(), "Sending authentication request");
        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(%status, "Authentication response received");

        Ok(AuthReply::new(status.as_u16(), Self::parse_body(&text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn authenticator(server: &MockServer) -> HttpAuthenticator {
        HttpAuthenticator::with_default_timeout(Some(format!("{}/auth", server.uri()))).unwrap()
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_wire_format() {
        let json = serde_json::to_value(Credentials::new("alice", "pw")).unwrap();
        assert_eq!(json, serde_json::json!({"Username": "alice", "Password": "pw"}));
    }

    #[test]
    fn test_reply_success_requires_both_codes() {
        let ok = AuthReplyBody {
            status_code: Some(200),
            message: Some("OK".to_string()),
        };
        assert!(AuthReply::new(200, ok.clone()).is_success());
        assert!(!AuthReply::new(201, ok).is_success());
        assert!(!AuthReply::new(200, AuthReplyBody::default()).is_success());
        assert!(!AuthReply::new(
            200,
            AuthReplyBody {
                status_code: Some(401),
                message: None
            }
        )
        .is_success());
    }

    #[test]
    fn test_reply_message_ignores_blank() {
        let reply = AuthReply::new(
            200,
            AuthReplyBody {
                status_code: Some(401),
                message: Some("  ".to_string()),
            },
        );
        assert_eq!(reply.message(), None);
    }

    #[test]
    fn test_parse_body_is_lenient() {
        assert_eq!(
            HttpAuthenticator::parse_body("<html>502</html>"),
            AuthReplyBody::default()
        );
        let body = HttpAuthenticator::parse_body(r#"{"statusCode":401,"message":"nope","extra":1}"#);
        assert_eq!(body.status_code, Some(401));
        assert_eq!(body.message.as_deref(), Some("nope"));
    }

    #[tokio::test]
    async fn test_missing_url_is_transport_error() {
        let auth = HttpAuthenticator::with_default_timeout(Some("  ".to_string())).unwrap();
        let err = auth
            .authenticate(&Credentials::new("alice", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::MissingAuthUrl));
    }

    #[tokio::test]
    async fn test_posts_credentials_and_reads_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .and(body_json(serde_json::json!({"Username": "alice", "Password": "pw"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"statusCode": 200, "message": "OK"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = authenticator(&server)
            .authenticate(&Credentials::new("alice", "pw"))
            .await
            .unwrap();
        assert!(reply.is_success());
        assert_eq!(reply.message(), Some("OK"));
    }

    #[tokio::test]
    async fn test_error_status_is_a_reply_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({"message": "account locked"})),
            )
            .mount(&server)
            .await;

        let reply = authenticator(&server)
            .authenticate(&Credentials::new("alice", "pw"))
            .await
            .unwrap();
        assert_eq!(reply.status, 403);
        assert!(!reply.is_success());
        assert_eq!(reply.message(), Some("account locked"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Grab a free port, then close the listener so nothing answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let auth = HttpAuthenticator::with_default_timeout(Some(format!("http://{}/auth", addr)))
            .unwrap();
        let err = auth
            .authenticate(&Credentials::new("alice", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connect(_) | TransportError::Network(_)
        ));
    }
}
