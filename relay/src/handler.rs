use crate::errors::RelayError;
use crate::form::FormValues;
use crate::gotify::{GotifyClient, GotifyMessage};
use http::header::{CONTENT_TYPE, HeaderMap};
use http_body_util::{BodyExt, Limited};
use hyper::body::Body;
use hyper::{Method, Request, StatusCode};
use subtle::ConstantTimeEq;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// How a single webhook call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    MissingToken,
    Unauthorized,
    MethodNotAllowed,
    InvalidForm,
    MissingFields,
    SerializationFailed,
    UpstreamFailed,
    Relayed(StatusCode),
}

impl Outcome {
    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::MissingToken => StatusCode::BAD_REQUEST,
            Outcome::Unauthorized => StatusCode::UNAUTHORIZED,
            Outcome::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Outcome::InvalidForm => StatusCode::BAD_REQUEST,
            Outcome::MissingFields => StatusCode::BAD_REQUEST,
            Outcome::SerializationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Outcome::UpstreamFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Outcome::Relayed(status) => *status,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::MissingToken => "missing_token",
            Outcome::Unauthorized => "unauthorized",
            Outcome::MethodNotAllowed => "method_not_allowed",
            Outcome::InvalidForm => "invalid_form",
            Outcome::MissingFields => "missing_fields",
            Outcome::SerializationFailed => "serialization_failed",
            Outcome::UpstreamFailed => "upstream_failed",
            Outcome::Relayed(_) => "relayed",
        }
    }
}

/// Turns one inbound webhook call into one Gotify message.
///
/// Each step either hands over to the next one or ends the request:
/// token present, token valid, method is POST, form decodes, `From` and
/// `Body` are non-empty, message serializes, Gotify answers. The status
/// Gotify answers with is the status returned to the caller.
pub struct RelayHandler {
    webhook_token: String,
    gotify: GotifyClient,
    max_body_bytes: usize,
}

impl RelayHandler {
    pub fn new(webhook_token: String, gotify: GotifyClient, max_body_bytes: usize) -> Self {
        Self {
            webhook_token,
            gotify,
            max_body_bytes,
        }
    }

    pub async fn handle<B>(&self, request: Request<B>) -> Outcome
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = request.into_parts();
        let query = FormValues::parse_lenient(parts.uri.query().unwrap_or("").as_bytes());

        let token = match query.get("token") {
            Some(token) if !token.is_empty() => token,
            _ => {
                tracing::warn!("missing token in request");
                return Outcome::MissingToken;
            }
        };

        if !self.token_matches(token) {
            tracing::warn!("unauthorized token attempt");
            return Outcome::Unauthorized;
        }

        if parts.method != Method::POST {
            tracing::warn!(method = %parts.method, "method not allowed");
            return Outcome::MethodNotAllowed;
        }

        let form = match self.read_form(&parts.headers, body).await {
            Ok(form) => form,
            Err(e) => {
                tracing::warn!("error parsing form data: {e}");
                return Outcome::InvalidForm;
            }
        };

        let from = form_value(&form, &query, "From");
        let text = form_value(&form, &query, "Body");
        if from.is_empty() || text.is_empty() {
            tracing::warn!("missing required form parameters");
            return Outcome::MissingFields;
        }

        let payload = match GotifyMessage::from_sender(from, text).to_json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("error creating message: {e}");
                return Outcome::SerializationFailed;
            }
        };

        let response = match self.gotify.send(payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("failed to send message to Gotify: {e}");
                return Outcome::UpstreamFailed;
            }
        };

        match &response.body {
            Ok(body) => tracing::info!(status = %response.status, "Gotify response: {body}"),
            Err(e) => tracing::warn!(status = %response.status, "error reading Gotify response: {e}"),
        }

        Outcome::Relayed(response.status)
    }

    fn token_matches(&self, token: &str) -> bool {
        token.as_bytes().ct_eq(self.webhook_token.as_bytes()).into()
    }

    /// Decodes the body as a form when the content type is absent or
    /// `application/x-www-form-urlencoded`. Other content types yield no
    /// values.
    async fn read_form<B>(&self, headers: &HeaderMap, body: B) -> Result<FormValues, RelayError>
    where
        B: Body,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        if !is_form_content_type(headers) {
            return Ok(FormValues::default());
        }

        let bytes = Limited::new(body, self.max_body_bytes)
            .collect()
            .await
            .map_err(|e| {
                if e.is::<http_body_util::LengthLimitError>() {
                    RelayError::RequestBodyTooLarge(self.max_body_bytes)
                } else {
                    RelayError::RequestBodyError(e.to_string())
                }
            })?
            .to_bytes();

        Ok(FormValues::parse(&bytes)?)
    }
}

/// Body values take precedence, the query string is the fallback.
fn form_value<'a>(form: &'a FormValues, query: &'a FormValues, name: &str) -> &'a str {
    form.get(name).or_else(|| query.get(name)).unwrap_or("")
}

fn is_form_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE) else {
        // Not application/octet-stream: a missing type still decodes as a form.
        return true;
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}
