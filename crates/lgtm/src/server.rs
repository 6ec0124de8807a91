//! HTTP server for GitHub webhooks.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::PluginConfig;
use crate::engine::{LgtmContext, Outcome};
use crate::error::LgtmError;
use crate::events::{GenericCommentEvent, IssueCommentEvent, PullRequestEvent, ReviewEvent};
use crate::github::GitHubApi;
use crate::handlers::{handle_generic_comment, handle_pull_request, handle_review};
use crate::help::plugin_help;
use crate::owners::OwnersResolver;
use crate::webhooks::{verify_github_signature, DELIVERY_HEADER, EVENT_HEADER, SIGNATURE_HEADER};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Plugin configuration, read-only for the life of the process.
    pub config: Arc<PluginConfig>,
    /// GitHub API client.
    pub github: Arc<dyn GitHubApi>,
    /// OWNERS file resolver.
    pub owners: Arc<dyn OwnersResolver>,
    /// Webhook secret. Signatures are not checked when unset.
    pub webhook_secret: Option<String>,
}

impl AppState {
    fn context(&self) -> LgtmContext<'_> {
        LgtmContext {
            github: self.github.as_ref(),
            owners: self.owners.as_ref(),
            config: &self.config,
        }
    }
}

/// Build the HTTP router for the LGTM service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/hook", post(github_webhook_handler))
        .route("/help", get(help_handler))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

#[derive(Debug, Deserialize)]
struct HelpQuery {
    /// Comma separated `org/repo` names.
    #[serde(default)]
    repos: String,
}

async fn help_handler(
    State(state): State<AppState>,
    Query(query): Query<HelpQuery>,
) -> Json<Value> {
    let repos: Vec<String> = query
        .repos
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect();
    Json(json!(plugin_help(&state.config, &repos)))
}

/// Handle incoming GitHub webhooks.
///
/// This handler:
/// 1. Verifies the signature (if a secret is configured)
/// 2. Parses the payload for the event type
/// 3. Routes to the matching LGTM handler
pub async fn github_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    let event_type = header_value(&headers, EVENT_HEADER).unwrap_or("unknown");
    let delivery_id = header_value(&headers, DELIVERY_HEADER).unwrap_or("unknown");

    info!(
        event_type = %event_type,
        delivery_id = %delivery_id,
        "Received GitHub webhook"
    );

    if let Some(secret) = &state.webhook_secret {
        let Some(signature) = header_value(&headers, SIGNATURE_HEADER) else {
            warn!("Missing X-Hub-Signature-256 header");
            return Err(StatusCode::UNAUTHORIZED);
        };

        if !verify_github_signature(&body, signature, secret) {
            warn!("Invalid webhook signature");
            return Err(StatusCode::UNAUTHORIZED);
        }
        debug!("Webhook signature verified");
    }

    let ctx = state.context();
    let result = match event_type {
        "issue_comment" => {
            let event: IssueCommentEvent = parse_payload(&body)?;
            match GenericCommentEvent::from_issue_comment(&event) {
                Some(generic) => handle_generic_comment(&ctx, &generic).await,
                None => Ok(Outcome::ignored()),
            }
        }
        "pull_request_review" => {
            let event: ReviewEvent = parse_payload(&body)?;
            handle_review(&ctx, &event).await
        }
        "pull_request" => {
            let event: PullRequestEvent = parse_payload(&body)?;
            handle_pull_request(&ctx, &event).await
        }
        _ => {
            debug!(event_type = %event_type, "Ignoring unhandled webhook event");
            return Ok(Json(json!({
                "status": "ignored",
                "reason": "unhandled_event_type"
            })));
        }
    };

    respond(event_type, delivery_id, result)
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, StatusCode> {
    serde_json::from_slice(body).map_err(|e| {
        error!("Failed to parse webhook payload: {e}");
        StatusCode::BAD_REQUEST
    })
}

fn respond(
    event_type: &str,
    delivery_id: &str,
    result: Result<Outcome, LgtmError>,
) -> Result<Json<Value>, StatusCode> {
    match result {
        Ok(outcome) => {
            for failure in &outcome.secondary_failures {
                warn!(
                    delivery_id = %delivery_id,
                    step = ?failure.step,
                    error = %failure.message,
                    "Best-effort step failed"
                );
            }
            info!(
                event_type = %event_type,
                delivery_id = %delivery_id,
                action = outcome.action.as_str(),
                "Handled GitHub webhook"
            );
            let status = if outcome.is_degraded() {
                "degraded"
            } else {
                "ok"
            };
            Ok(Json(json!({
                "status": status,
                "action": outcome.action.as_str(),
                "secondary_failures": outcome.secondary_failures.len(),
            })))
        }
        Err(e) => {
            error!(
                event_type = %event_type,
                delivery_id = %delivery_id,
                error = %e,
                "Failed to handle GitHub webhook"
            );
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
