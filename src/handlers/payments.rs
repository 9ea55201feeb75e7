use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::PathRejection, FromRequestParts, Path, State},
    http::{header, request::Parts, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::convert::Infallible;
use tracing::{debug, error};

use crate::handlers::endpoints::{PaymentRequest, PaymentResponse};
use crate::handlers::AppState;
use crate::models::payment::{
    CreatePaymentRequest, DeletePaymentRequest, GetPaymentRequest, ListPaymentsRequest, Payment,
    UpdatePaymentRequest,
};
use crate::services::ApiError;

/// Request metadata attached to error logs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub user_agent: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            user_agent,
        })
    }
}

/// Path segments that do not decode (for instance invalid UTF-8) can never be
/// a payment id.
fn path_id(id: Result<Path<String>, PathRejection>) -> Result<String, ApiError> {
    id.map(|Path(id)| id).map_err(|rejection| {
        debug!("Rejected payment id segment: {}", rejection.body_text());
        ApiError::InvalidPaymentId
    })
}

pub fn decode_get_payment_request(id: String) -> PaymentRequest {
    PaymentRequest::Get(GetPaymentRequest { payment_id: id })
}

pub fn decode_get_list_of_payments_request() -> PaymentRequest {
    PaymentRequest::List(ListPaymentsRequest)
}

pub fn decode_post_payment_request(body: &[u8]) -> Result<PaymentRequest, ApiError> {
    let payment: Payment = serde_json::from_slice(body).map_err(ApiError::InvalidBody)?;
    Ok(PaymentRequest::Create(CreatePaymentRequest { payment }))
}

pub fn decode_update_payment_request(id: String, body: &[u8]) -> Result<PaymentRequest, ApiError> {
    let payment: Payment = serde_json::from_slice(body).map_err(ApiError::InvalidBody)?;
    Ok(PaymentRequest::Update(UpdatePaymentRequest {
        payment_id: id,
        payment,
    }))
}

pub fn decode_delete_payment_request(id: String) -> PaymentRequest {
    PaymentRequest::Delete(DeletePaymentRequest { payment_id: id })
}

/// 200 with JSON for reads, 201 with JSON for creation, 202 with an empty
/// body for update and delete.
pub fn encode_response(response: PaymentResponse) -> Response {
    match response {
        PaymentResponse::Get(resp) => (StatusCode::OK, Json(resp)).into_response(),
        PaymentResponse::List(resp) => (StatusCode::OK, Json(resp)).into_response(),
        PaymentResponse::Create(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        PaymentResponse::Update(_) | PaymentResponse::Delete(_) => {
            StatusCode::ACCEPTED.into_response()
        }
    }
}

pub fn encode_error(ctx: &RequestContext, err: ApiError) -> Response {
    error!(
        error = %err,
        detail = %err.detail().unwrap_or_default(),
        http.method = %ctx.method,
        http.path = %ctx.path,
        http.user_agent = %ctx.user_agent,
        "request failed"
    );
    err.into_response()
}

async fn serve(
    state: &AppState,
    ctx: &RequestContext,
    decoded: Result<PaymentRequest, ApiError>,
) -> Response {
    let result = match decoded {
        Ok(request) => state.endpoints.call(request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => encode_response(response),
        Err(e) => encode_error(ctx, e),
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    serve(&state, &ctx, path_id(id).map(decode_get_payment_request)).await
}

pub async fn get_list_of_payments(State(state): State<AppState>, ctx: RequestContext) -> Response {
    serve(&state, &ctx, Ok(decode_get_list_of_payments_request())).await
}

pub async fn post_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> Response {
    serve(&state, &ctx, decode_post_payment_request(&body)).await
}

pub async fn update_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Response {
    let decoded = path_id(id).and_then(|id| decode_update_payment_request(id, &body));
    serve(&state, &ctx, decoded).await
}

pub async fn delete_payment(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    serve(&state, &ctx, path_id(id).map(decode_delete_payment_request)).await
}
