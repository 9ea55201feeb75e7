pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::payment::Payment;

pub use memory::InMemoryPaymentRepository;
pub use postgres::PgPaymentRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("payment not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage for payment aggregates. Reads always return the fully hydrated
/// aggregate and never see soft-deleted payments.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn get_payment(&self, id: Uuid) -> Result<Payment, RepositoryError>;

    /// All live payments, oldest first.
    async fn list_payments(&self) -> Result<Vec<Payment>, RepositoryError>;

    /// Stores the payment under a freshly generated id and returns that id.
    async fn create_payment(&self, payment: Payment) -> Result<Uuid, RepositoryError>;

    async fn update_payment(&self, id: Uuid, payment: Payment) -> Result<(), RepositoryError>;

    /// Marks the payment as deleted without removing it.
    async fn delete_payment(&self, id: Uuid) -> Result<(), RepositoryError>;
}
