use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use strikebot_core::{Direction, TradeError, TradeSignal};
use strikebot_engine::SignalOutcome;

use crate::server::ApiContext;

/// Inbound alert payload. Fields are optional so missing ones surface
/// as validation errors rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub ticker: Option<String>,
    pub action: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl WebhookResponse {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            order_id: None,
        }
    }
}

pub async fn health() -> &'static str {
    "ok"
}

/// Receives a directional signal and attempts to trade it.
///
/// Token mismatch is an auth failure; malformed fields are validation
/// failures; policy refusals are shaped per configuration; only
/// collaborator faults surface as 500.
pub async fn webhook(
    State(ctx): State<Arc<ApiContext>>,
    Json(req): Json<WebhookRequest>,
) -> (StatusCode, Json<WebhookResponse>) {
    if req.token.as_deref() != Some(ctx.webhook_token.as_str()) {
        warn!("Webhook rejected: bad token");
        return (
            StatusCode::UNAUTHORIZED,
            Json(WebhookResponse::new("auth_failed", "invalid token")),
        );
    }

    let Some(ticker) = req.ticker.filter(|t| !t.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse::new("invalid_request", "ticker is required")),
        );
    };
    let Some(action) = req.action.as_deref() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse::new("invalid_request", "action is required")),
        );
    };
    let Some(direction) = Direction::from_action(action) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse::new(
                "unknown_action",
                format!("unknown action: {action}"),
            )),
        );
    };

    let signal = TradeSignal { ticker, direction };
    let now = (ctx.clock)();

    match ctx.engine.handle_signal(&signal, now).await {
        Ok(SignalOutcome::Submitted { order_id, contract }) => {
            info!(order_id, contract, "Webhook signal traded");
            let mut resp = WebhookResponse::new("ok", format!("entry order placed for {contract}"));
            resp.order_id = Some(order_id);
            (StatusCode::OK, Json(resp))
        }
        Ok(SignalOutcome::Rejected(rejection)) => {
            info!(code = rejection.code(), "Webhook signal rejected by policy");
            if ctx.rejection_as_forbidden {
                (
                    StatusCode::FORBIDDEN,
                    Json(WebhookResponse::new(rejection.code(), "entry not permitted")),
                )
            } else {
                (
                    StatusCode::OK,
                    Json(WebhookResponse::new("no_action", rejection.code())),
                )
            }
        }
        Err(TradeError::Validation(msg)) => (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse::new("invalid_request", msg)),
        ),
        Err(TradeError::Auth) => (
            StatusCode::UNAUTHORIZED,
            Json(WebhookResponse::new("auth_failed", "invalid token")),
        ),
        Err(TradeError::Collaborator(e)) => {
            warn!(error = %e, "Webhook signal failed on collaborator");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse::new("internal_error", "trade attempt failed")),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    use strikebot_broker::{OptionChainRow, PaperBroker};
    use strikebot_core::{SessionHours, TradingConfig};
    use strikebot_engine::Engine;

    use crate::server::ApiServer;

    fn in_session() -> DateTime<Utc> {
        // Monday 22:00 Asia/Shanghai
        chrono_tz::Asia::Shanghai
            .with_ymd_and_hms(2024, 7, 1, 22, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn router_with(broker: Arc<PaperBroker>, forbidden: bool) -> axum::Router {
        let engine = Arc::new(Engine::new(
            TradingConfig::default(),
            SessionHours::new(21, 30, 4, 0),
            broker.clone(),
            broker,
        ));
        let ctx = ApiContext::new(engine, "secret".to_string(), forbidden)
            .with_clock(Arc::new(in_session));
        ApiServer::new(Arc::new(ctx)).router()
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn bad_token_is_unauthorized() {
        let router = router_with(Arc::new(PaperBroker::new()), true);
        let resp = router
            .oneshot(post_json(r#"{"ticker":"AAPL.US","action":"buy","token":"wrong"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["code"], "auth_failed");
    }

    #[tokio::test]
    async fn missing_fields_are_client_errors() {
        let router = router_with(Arc::new(PaperBroker::new()), true);
        let resp = router
            .clone()
            .oneshot(post_json(r#"{"action":"buy","token":"secret"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = router
            .oneshot(post_json(r#"{"ticker":"AAPL.US","action":"hold","token":"secret"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["code"], "unknown_action");
    }

    #[tokio::test]
    async fn policy_rejection_shaping_is_configurable() {
        // Empty market data → no contract found.
        let resp = router_with(Arc::new(PaperBroker::new()), true)
            .oneshot(post_json(r#"{"ticker":"AAPL.US","action":"buy","token":"secret"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(resp).await["code"], "no_contract");

        let resp = router_with(Arc::new(PaperBroker::new()), false)
            .oneshot(post_json(r#"{"ticker":"AAPL.US","action":"buy","token":"secret"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["code"], "no_action");
    }

    #[tokio::test]
    async fn valid_signal_places_an_entry_order() {
        let broker = Arc::new(PaperBroker::new());
        broker.set_last_price("AAPL.US", dec!(200.00));
        let expiry = chrono::NaiveDate::from_ymd_opt(2024, 7, 5).unwrap();
        broker.set_expiries("AAPL.US", vec![expiry]);
        broker.set_chain(
            "AAPL.US",
            expiry,
            vec![OptionChainRow {
                strike: dec!(200),
                call_symbol: "AAPL240705C200.US".to_string(),
                put_symbol: "AAPL240705P200.US".to_string(),
            }],
        );
        broker.set_depth("AAPL240705C200.US", dec!(1.40), dec!(1.50));
        broker.set_max_quantity(dec!(4));

        let resp = router_with(broker.clone(), true)
            .oneshot(post_json(r#"{"ticker":"AAPL.US","action":"buy","token":"secret"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["code"], "ok");
        assert_eq!(body["order_id"], "PAPER-1");
        assert_eq!(broker.submitted_orders().len(), 1);
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let router = router_with(Arc::new(PaperBroker::new()), true);
        let resp = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
