use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::app::config::Config;
use crate::models::payment::{
    CreatePaymentRequest, CreatePaymentResponse, DeletePaymentRequest, DeletePaymentResponse,
    GetPaymentRequest, GetPaymentResponse, Links, ListPaymentsRequest, ListPaymentsResponse,
    UpdatePaymentRequest, UpdatePaymentResponse,
};
use crate::repository::PaymentRepository;
use crate::services::error::ApiError;
use crate::services::validator::PaymentValidator;

/// The operations exposed by the payments API.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn get_payment(&self, req: GetPaymentRequest) -> Result<GetPaymentResponse, ApiError>;

    async fn get_list_of_payments(
        &self,
        req: ListPaymentsRequest,
    ) -> Result<ListPaymentsResponse, ApiError>;

    async fn post_payment(&self, req: CreatePaymentRequest)
        -> Result<CreatePaymentResponse, ApiError>;

    async fn update_payment(
        &self,
        req: UpdatePaymentRequest,
    ) -> Result<UpdatePaymentResponse, ApiError>;

    async fn delete_payment(
        &self,
        req: DeletePaymentRequest,
    ) -> Result<DeletePaymentResponse, ApiError>;
}

/// Builds the service stack used by the HTTP layer: the core service
/// behind the payload validator.
pub fn new_payment_service(
    repository: Arc<dyn PaymentRepository>,
    config: &Config,
) -> Arc<dyn PaymentService> {
    Arc::new(PaymentValidator::new(CorePaymentService::new(repository, config)))
}

/// One repository call per operation plus response shaping.
pub struct CorePaymentService {
    repository: Arc<dyn PaymentRepository>,
    public_host: String,
}

impl CorePaymentService {
    pub fn new(repository: Arc<dyn PaymentRepository>, config: &Config) -> Self {
        Self {
            repository,
            public_host: config.public_host.clone(),
        }
    }

    fn collection_link(&self) -> Links {
        Links {
            self_link: format!("{}/v1/payments/", self.public_host),
        }
    }

    fn resource_link(&self, id: &Uuid) -> Links {
        Links {
            self_link: format!("{}/v1/payments/{}/", self.public_host, id),
        }
    }
}

// Ids reaching this layer unvalidated cannot match any stored payment.
fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound)
}

#[async_trait]
impl PaymentService for CorePaymentService {
    async fn get_payment(&self, req: GetPaymentRequest) -> Result<GetPaymentResponse, ApiError> {
        let payment = self.repository.get_payment(parse_id(&req.payment_id)?).await?;
        Ok(GetPaymentResponse { payment })
    }

    async fn get_list_of_payments(
        &self,
        _req: ListPaymentsRequest,
    ) -> Result<ListPaymentsResponse, ApiError> {
        let data = self.repository.list_payments().await?;
        Ok(ListPaymentsResponse {
            data,
            links: self.collection_link(),
        })
    }

    async fn post_payment(
        &self,
        req: CreatePaymentRequest,
    ) -> Result<CreatePaymentResponse, ApiError> {
        let id = self.repository.create_payment(req.payment).await?;
        info!("Created payment {}", id);

        Ok(CreatePaymentResponse {
            id: id.to_string(),
            links: self.resource_link(&id),
        })
    }

    async fn update_payment(
        &self,
        req: UpdatePaymentRequest,
    ) -> Result<UpdatePaymentResponse, ApiError> {
        let id = parse_id(&req.payment_id)?;
        self.repository.update_payment(id, req.payment).await?;
        info!("Updated payment {}", id);

        Ok(UpdatePaymentResponse { id: req.payment_id })
    }

    async fn delete_payment(
        &self,
        req: DeletePaymentRequest,
    ) -> Result<DeletePaymentResponse, ApiError> {
        let id = parse_id(&req.payment_id)?;
        self.repository.delete_payment(id).await?;
        info!("Deleted payment {}", id);

        Ok(DeletePaymentResponse { id: req.payment_id })
    }
}
