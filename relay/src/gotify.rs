use crate::config::Credentials;
use crate::errors::RelayError;
use http::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Body of `POST /message` on the Gotify API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GotifyMessage {
    pub title: String,
    pub message: String,
}

impl GotifyMessage {
    pub fn from_sender(from: &str, body: &str) -> Self {
        GotifyMessage {
            title: format!("Message from {from}"),
            message: body.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, RelayError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// What Gotify answered. A failure to read the body is kept rather than
/// returned, since only the status is relayed.
#[derive(Debug)]
pub struct GotifyResponse {
    pub status: StatusCode,
    pub body: Result<String, RelayError>,
}

#[derive(Clone)]
pub struct GotifyClient {
    client: reqwest::Client,
    message_url: Url,
}

impl GotifyClient {
    pub fn new(credentials: &Credentials, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(GotifyClient {
            client,
            message_url: message_url(&credentials.gotify_url, &credentials.gotify_token),
        })
    }

    /// Sends one serialized message. There is no retry: a transport error or
    /// timeout is returned to the caller as is.
    pub async fn send(&self, payload: Vec<u8>) -> Result<GotifyResponse, RelayError> {
        // Use host as identifier for error messages
        let upstream = self
            .message_url
            .host_str()
            .unwrap_or("gotify")
            .to_string();

        let response = self
            .client
            .post(self.message_url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::UpstreamTimeout(upstream.clone())
                } else {
                    RelayError::UpstreamRequestFailed(upstream.clone(), e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RelayError::ResponseBodyError(e.to_string()));

        Ok(GotifyResponse { status, body })
    }
}

/// `{base}/message?token={token}`. Any query or fragment on the base URL is
/// dropped and a trailing slash is not doubled.
fn message_url(base: &Url, token: &str) -> Url {
    let mut url = base.clone();
    let path = format!("{}/message", base.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_fragment(None);
    url.query_pairs_mut().clear().append_pair("token", token);
    url
}
