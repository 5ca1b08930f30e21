//! Axum routes and error mapping for the approval service.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use workpay::proof::PaymentProof;
use workpay::proto::{ApprovalRequest, ErrorBody, PaymentRequiredBody, ReviewOutcome};
use workpay::verify::{ChainVerifier, ReceiptVerifier};
use workpay_http::constants::{AGENT_ID_HEADER, PAYMENT_HEADER, PAYMENT_REQUIRED_HEADER};
use workpay_http::headers::encode_payment_required;

use crate::approval::{ApprovalEngine, ApprovalError};
use crate::store::MarketStore;

/// `POST /approve` - reviews a job completion.
///
/// The caller identifies itself with the `x-agent-id` header
/// (authentication happens upstream) and may carry a payment proof in
/// `x-payment`. Approval without an acceptable proof is answered with a
/// 402 challenge carrying the payment terms in both body and header.
pub async fn post_review<S, C, R>(
    State(engine): State<Arc<ApprovalEngine<S, C, R>>>,
    headers: HeaderMap,
    Json(request): Json<ApprovalRequest>,
) -> Response
where
    S: MarketStore,
    C: ChainVerifier,
    R: ReceiptVerifier,
{
    let Some(caller_id) = headers
        .get(AGENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    else {
        let body = ErrorBody {
            error: format!("Missing {AGENT_ID_HEADER} header"),
        };
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    };

    let proof = headers
        .get(PAYMENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(PaymentProof::parse);

    match engine.review(caller_id, &request, proof.as_ref()).await {
        Ok(outcome) => (StatusCode::OK, Json::<ReviewOutcome>(outcome)).into_response(),
        Err(error) => error.into_response(),
    }
}

/// `GET /health` - liveness probe.
pub async fn get_health() -> &'static str {
    "ok"
}

impl IntoResponse for ApprovalError {
    fn into_response(self) -> Response {
        if let Self::PaymentRequired(requirement) = self {
            let header = encode_payment_required(&requirement).ok();
            let body = PaymentRequiredBody::new(*requirement);
            let mut response =
                (StatusCode::PAYMENT_REQUIRED, Json(body)).into_response();
            if let Some(value) = header.as_deref().and_then(|h| HeaderValue::from_str(h).ok()) {
                response
                    .headers_mut()
                    .insert(PAYMENT_REQUIRED_HEADER, value);
            }
            return response;
        }

        let status = match &self {
            Self::JobNotFound => StatusCode::NOT_FOUND,
            Self::InvalidStatus { .. }
            | Self::MissingCompletion
            | Self::AlreadyReviewed
            | Self::WorkerWalletMissing => StatusCode::BAD_REQUEST,
            Self::NotPoster | Self::PosterWalletMissing => StatusCode::FORBIDDEN,
            Self::Infrastructure(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PaymentRequired(_) => unreachable!("handled above"),
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the service router over a shared approval engine.
pub fn approval_router<S, C, R>(engine: Arc<ApprovalEngine<S, C, R>>) -> axum::Router
where
    S: MarketStore + 'static,
    C: ChainVerifier + 'static,
    R: ReceiptVerifier + 'static,
{
    axum::Router::new()
        .route("/approve", post(post_review::<S, C, R>))
        .route("/health", get(get_health))
        .with_state(engine)
}
