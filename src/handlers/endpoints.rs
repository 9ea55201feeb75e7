use std::sync::Arc;

use crate::models::payment::{
    CreatePaymentRequest, CreatePaymentResponse, DeletePaymentRequest, DeletePaymentResponse,
    GetPaymentRequest, GetPaymentResponse, ListPaymentsRequest, ListPaymentsResponse,
    UpdatePaymentRequest, UpdatePaymentResponse,
};
use crate::services::{ApiError, PaymentService};

/// A decoded request for one of the five payment operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentRequest {
    Get(GetPaymentRequest),
    List(ListPaymentsRequest),
    Create(CreatePaymentRequest),
    Update(UpdatePaymentRequest),
    Delete(DeletePaymentRequest),
}

/// The service result matching each `PaymentRequest` variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentResponse {
    Get(GetPaymentResponse),
    List(ListPaymentsResponse),
    Create(CreatePaymentResponse),
    Update(UpdatePaymentResponse),
    Delete(DeletePaymentResponse),
}

/// Adapts transport requests to service calls; results and errors pass
/// through unchanged.
#[derive(Clone)]
pub struct Endpoints {
    service: Arc<dyn PaymentService>,
}

impl Endpoints {
    pub fn new(service: Arc<dyn PaymentService>) -> Self {
        Self { service }
    }

    pub async fn call(&self, request: PaymentRequest) -> Result<PaymentResponse, ApiError> {
        match request {
            PaymentRequest::Get(req) => self.service.get_payment(req).await.map(PaymentResponse::Get),
            PaymentRequest::List(req) => self
                .service
                .get_list_of_payments(req)
                .await
                .map(PaymentResponse::List),
            PaymentRequest::Create(req) => self
                .service
                .post_payment(req)
                .await
                .map(PaymentResponse::Create),
            PaymentRequest::Update(req) => self
                .service
                .update_payment(req)
                .await
                .map(PaymentResponse::Update),
            PaymentRequest::Delete(req) => self
                .service
                .delete_payment(req)
                .await
                .map(PaymentResponse::Delete),
        }
    }
}
