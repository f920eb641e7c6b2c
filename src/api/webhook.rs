//! GitHub webhook receiver.

use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{error, info};

use crate::config::{EVENT_HEADER, SIGNATURE_HEADER};
use crate::error::{AppError, AppResult};
use crate::models::{WebhookEvent, WebhookParseError};
use crate::services::{SignatureVerifier, WebhookDispatcher};

/// Receive a GitHub webhook delivery.
///
/// The signature is checked against the raw body before anything is parsed.
#[utoipa::path(
    post,
    path = "/api/v1/github/webhook",
    tag = "GitHub",
    request_body(content = String, description = "Raw webhook payload", content_type = "application/json"),
    params(
        ("X-Hub-Signature-256" = String, Header, description = "sha256=<hex> HMAC of the body"),
        ("X-GitHub-Event" = String, Header, description = "Event type")
    ),
    responses(
        (status = 200, description = "Event processed", body = String),
        (status = 400, description = "Missing, unsupported or malformed event", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid signature", body = crate::error::ErrorResponse),
        (status = 500, description = "Event processing failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn receive_webhook(
    req: HttpRequest,
    body: web::Bytes,
    verifier: web::Data<SignatureVerifier>,
    dispatcher: web::Data<WebhookDispatcher>,
) -> AppResult<HttpResponse> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if !verifier.verify(&body, signature) {
        return Err(AppError::Signature);
    }

    let event_type = req
        .headers()
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(WebhookParseError::MissingEventType)?;

    let event = WebhookEvent::parse(event_type, &body)?;
    info!(event = event.kind(), action = event.action(), "Webhook received");

    if let Err(e) = dispatcher.dispatch(&event).await {
        error!(
            event = event.kind(),
            action = event.action(),
            "Webhook processing failed: {}",
            e
        );
        return Err(e);
    }

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Event processed successfully"))
}

/// Configure webhook routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/github/webhook").route(web::post().to(receive_webhook)));
}
