pub mod config;
pub mod errors;
pub mod form;
pub mod gotify;
pub mod handler;
pub mod metrics_defs;
pub mod service;

#[cfg(test)]
mod testutils;

use config::{Config, Credentials};
use errors::RelayError;
use gotify::GotifyClient;
use handler::RelayHandler;
use service::RelayService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::time::Duration;

/// Serves the webhook and admin listeners until either of them fails.
pub async fn run(config: Config, credentials: Credentials) -> Result<(), RelayError> {
    shared::metrics_defs::describe_all(metrics_defs::ALL_METRICS);

    let gotify = GotifyClient::new(
        &credentials,
        Duration::from_secs(config.upstream_timeout_secs),
    )?;
    tracing::info!(
        gotify_url = %credentials.gotify_url,
        route_prefix = %config.route_prefix,
        "relaying webhooks to Gotify"
    );

    let handler = RelayHandler::new(credentials.webhook_token, gotify, config.max_body_bytes);
    let relay_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        RelayService::new(config.route_prefix.clone(), handler),
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::new(|| true),
    );

    tokio::try_join!(relay_task, admin_task)?;
    Ok(())
}
