use crate::config::Credentials;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

pub const WEBHOOK_TOKEN: &str = "secret123";
pub const GOTIFY_TOKEN: &str = "dtok";

#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: Method,
    pub path_and_query: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// In-process stand-in for a Gotify server. Records every request and
/// answers each with the same status and body.
pub struct MockGotify {
    port: u16,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl MockGotify {
    pub async fn start(status: StatusCode, response_body: &'static str) -> Self {
        Self::start_with_delay(status, response_body, Duration::ZERO).await
    }

    pub async fn start_with_delay(
        status: StatusCode,
        response_body: &'static str,
        delay: Duration,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let received = received_clone.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let received = received.clone();
                        async move {
                            let (parts, body) = req.into_parts();
                            let body = body
                                .collect()
                                .await
                                .map(|collected| collected.to_bytes())
                                .unwrap_or_else(|_| Bytes::new());

                            received.lock().unwrap().push(ReceivedRequest {
                                method: parts.method,
                                path_and_query: parts
                                    .uri
                                    .path_and_query()
                                    .map(|pq| pq.to_string())
                                    .unwrap_or_default(),
                                content_type: parts
                                    .headers
                                    .get(http::header::CONTENT_TYPE)
                                    .and_then(|v| v.to_str().ok())
                                    .map(str::to_string),
                                body,
                            });

                            tokio::time::sleep(delay).await;

                            let mut response = Response::new(Full::new(Bytes::from(response_body)));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });

                    if let Err(err) =
                        hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                            .serve_connection(io, service)
                            .await
                    {
                        eprintln!("Error serving connection: {:?}", err);
                    }
                });
            }
        });

        MockGotify { port, received }
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }
}

pub fn credentials_for(gotify_url: &str) -> Credentials {
    Credentials {
        webhook_token: WEBHOOK_TOKEN.to_string(),
        gotify_token: GOTIFY_TOKEN.to_string(),
        gotify_url: Url::parse(gotify_url).unwrap(),
    }
}

/// A URL on which nothing is listening.
pub async fn unused_local_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}
