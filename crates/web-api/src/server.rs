use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;

use strikebot_engine::Engine;

use crate::handlers;

/// Clock used by the webhook path; injectable for deterministic tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct ApiContext {
    pub engine: Arc<Engine>,
    pub webhook_token: String,
    /// Report policy rejections as 403 instead of 200/no_action.
    pub rejection_as_forbidden: bool,
    pub clock: Clock,
}

impl ApiContext {
    pub fn new(engine: Arc<Engine>, webhook_token: String, rejection_as_forbidden: bool) -> Self {
        Self {
            engine,
            webhook_token,
            rejection_as_forbidden,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

pub struct ApiServer {
    context: Arc<ApiContext>,
}

impl ApiServer {
    #[must_use]
    pub fn new(context: Arc<ApiContext>) -> Self {
        Self { context }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/webhook", post(handlers::webhook))
            .route("/health", get(handlers::health))
            .layer(TraceLayer::new_for_http())
            .with_state(self.context.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or
    /// serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Webhook API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
