use crate::errors::RelayError;
use crate::handler::RelayHandler;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS, REQUESTS_INFLIGHT};
use http::header::{HeaderValue, LOCATION};
use http_body_util::combinators::BoxBody;
use hyper::body::{Body, Bytes};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use shared::http::make_empty_response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Routes requests under the webhook prefix to the relay handler.
///
/// The prefix itself without its trailing slash is redirected to the prefix,
/// every other path is a 404.
pub struct RelayService {
    route_prefix: String,
    handler: Arc<RelayHandler>,
}

impl RelayService {
    pub fn new(route_prefix: String, handler: RelayHandler) -> Self {
        Self {
            route_prefix,
            handler: Arc::new(handler),
        }
    }

    fn redirect_to_prefix(&self, query: Option<&str>) -> Response<BoxBody<Bytes, RelayError>> {
        let location = match query {
            Some(query) => format!("{}?{}", self.route_prefix, query),
            None => self.route_prefix.clone(),
        };

        let mut response = make_empty_response(StatusCode::MOVED_PERMANENTLY);
        if let Ok(value) = HeaderValue::from_str(&location) {
            response.headers_mut().insert(LOCATION, value);
        }
        response
    }
}

impl<B> Service<Request<B>> for RelayService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = Response<BoxBody<Bytes, RelayError>>;
    type Error = RelayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let path = req.uri().path();

        if !path.starts_with(&self.route_prefix) {
            let res = if path == self.route_prefix.trim_end_matches('/') {
                self.redirect_to_prefix(req.uri().query())
            } else {
                make_empty_response(StatusCode::NOT_FOUND)
            };
            return Box::pin(async move { Ok(res) });
        }

        let handler = self.handler.clone();

        Box::pin(async move {
            let start = Instant::now();
            let inflight = InflightGuard::new();

            let outcome = handler.handle(req).await;

            drop(inflight);
            let status = outcome.status();
            shared::histogram!(REQUEST_DURATION, "status" => status.as_str().to_owned())
                .record(start.elapsed().as_secs_f64());
            shared::counter!(REQUESTS, "outcome" => outcome.as_str()).increment(1);

            tracing::debug!(outcome = outcome.as_str(), "responding with {status}");
            Ok(make_empty_response(status))
        })
    }
}

/// Counts a request as in flight until dropped, including when hyper drops
/// the response future because the client went away.
struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        shared::gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        shared::gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}
