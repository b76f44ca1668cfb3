//! REST client for the Structura Ludis booking backend.
//!
//! Provides the four operations the agenda depends on:
//! - Fetching the sessions a user runs and the seats they booked
//! - Checking into a booking
//! - Cancelling a booking
//!
//! plus the user/exhibition lookups needed to label the agenda.

mod payload;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use sl_core::{BookingId, ExhibitionId, GmSession, PlayerBooking, ValidationError};
use thiserror::Error;

pub use payload::{Exhibition, UserProfile};

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const API_PREFIX: &str = "api/v1/";

/// API client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The provided token was invalid.
    #[error("invalid API token: {reason}")]
    InvalidToken { reason: &'static str },
    /// The configured base URL cannot be used.
    #[error("invalid API URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Response parsed but an entry breaks a data invariant.
    #[error("malformed {entry}: {source}")]
    MalformedData {
        entry: String,
        #[source]
        source: ValidationError,
    },
}

impl ApiError {
    /// Whether the backend refused our credentials.
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

/// The backend operations the agenda view relies on.
///
/// Implemented by [`Client`] over HTTP; tests substitute in-memory fakes.
#[async_trait]
pub trait AgendaBackend: Send + Sync {
    async fn current_user(&self) -> Result<UserProfile, ApiError>;

    async fn exhibition(&self, id: &ExhibitionId) -> Result<Exhibition, ApiError>;

    /// Sessions the current user runs as GM in the exhibition.
    async fn gm_sessions(&self, exhibition: &ExhibitionId) -> Result<Vec<GmSession>, ApiError>;

    /// Seats the current user booked in the exhibition.
    async fn bookings(&self, exhibition: &ExhibitionId) -> Result<Vec<PlayerBooking>, ApiError>;

    async fn check_in(&self, booking: &BookingId) -> Result<PlayerBooking, ApiError>;

    async fn cancel_booking(&self, booking: &BookingId) -> Result<(), ApiError>;
}

/// Booking backend HTTP client.
///
/// # Thread Safety
///
/// The client is safe to clone and share across threads. Each clone shares
/// the underlying HTTP connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty or whitespace-only, if the URL
    /// is not an absolute http(s) URL, or if the HTTP client fails to build.
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ApiError> {
        let token = token.into();

        if token.is_empty() {
            return Err(ApiError::InvalidToken {
                reason: "token cannot be empty",
            });
        }
        if token.trim().is_empty() {
            return Err(ApiError::InvalidToken {
                reason: "token cannot be whitespace-only",
            });
        }

        let base_url = parse_base_url(base_url)?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(API_PREFIX)
            .and_then(|api| api.join(path))
            .map_err(|err| ApiError::InvalidUrl {
                url: format!("{}{API_PREFIX}{path}", self.base_url),
                reason: err.to_string(),
            })
    }

    /// Sends a request and returns the body of a successful response.
    async fn send(&self, method: Method, path: &str) -> Result<String, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "api request");

        let response = self
            .http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = payload::parse_error_message(&body)
                .unwrap_or_else(|| format!("status {status}: {body}"));
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl AgendaBackend for Client {
    async fn current_user(&self) -> Result<UserProfile, ApiError> {
        let body = self.send(Method::GET, "auth/me/").await?;
        payload::decode(&body)
    }

    async fn exhibition(&self, id: &ExhibitionId) -> Result<Exhibition, ApiError> {
        let body = self.send(Method::GET, &format!("exhibitions/{id}/")).await?;
        payload::decode(&body)
    }

    async fn gm_sessions(&self, exhibition: &ExhibitionId) -> Result<Vec<GmSession>, ApiError> {
        let body = self
            .send(Method::GET, &format!("exhibitions/{exhibition}/my-sessions/"))
            .await?;
        payload::decode_gm_sessions(&body)
    }

    async fn bookings(&self, exhibition: &ExhibitionId) -> Result<Vec<PlayerBooking>, ApiError> {
        let body = self
            .send(Method::GET, &format!("exhibitions/{exhibition}/my-bookings/"))
            .await?;
        payload::decode_bookings(&body)
    }

    async fn check_in(&self, booking: &BookingId) -> Result<PlayerBooking, ApiError> {
        let body = self
            .send(Method::POST, &format!("bookings/{booking}/check-in/"))
            .await?;
        payload::decode(&body)
    }

    async fn cancel_booking(&self, booking: &BookingId) -> Result<(), ApiError> {
        self.send(Method::POST, &format!("bookings/{booking}/cancel/"))
            .await?;
        Ok(())
    }
}

/// Parses the base URL, forcing a trailing slash so relative joins append.
fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let invalid = |reason: String| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
