use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use uuid::Uuid;

use super::{PaymentRepository, RepositoryError};
use crate::models::payment::Payment;

#[derive(Debug, Clone)]
struct StoredPayment {
    payment: Payment,
    sequence: u64,
    deleted_at: Option<DateTime<Utc>>,
}

impl StoredPayment {
    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Process-local payment storage, used with `STORAGE=memory` and in tests.
pub struct InMemoryPaymentRepository {
    storage: DashMap<Uuid, StoredPayment>,
    sequence: AtomicU64,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
            sequence: AtomicU64::new(0),
        }
    }
}

impl Default for InMemoryPaymentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn get_payment(&self, id: Uuid) -> Result<Payment, RepositoryError> {
        self.storage
            .get(&id)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.payment.clone())
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, RepositoryError> {
        let mut live: Vec<(u64, Payment)> = self
            .storage
            .iter()
            .filter(|entry| entry.is_live())
            .map(|entry| (entry.sequence, entry.payment.clone()))
            .collect();
        live.sort_by_key(|(sequence, _)| *sequence);

        Ok(live.into_iter().map(|(_, payment)| payment).collect())
    }

    async fn create_payment(&self, mut payment: Payment) -> Result<Uuid, RepositoryError> {
        let id = Uuid::new_v4();
        payment.id = id;
        self.storage.insert(
            id,
            StoredPayment {
                payment,
                sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
                deleted_at: None,
            },
        );
        debug!("Stored payment {}", id);
        Ok(id)
    }

    async fn update_payment(&self, id: Uuid, mut payment: Payment) -> Result<(), RepositoryError> {
        let mut entry = self
            .storage
            .get_mut(&id)
            .filter(|entry| entry.is_live())
            .ok_or(RepositoryError::NotFound)?;

        payment.id = id;
        entry.payment = payment;
        debug!("Updated payment {}", id);
        Ok(())
    }

    async fn delete_payment(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut entry = self
            .storage
            .get_mut(&id)
            .filter(|entry| entry.is_live())
            .ok_or(RepositoryError::NotFound)?;

        entry.deleted_at = Some(Utc::now());
        debug!("Soft deleted payment {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::sample_payment;

    #[tokio::test]
    async fn test_create_assigns_fresh_id() {
        let repo = InMemoryPaymentRepository::new();
        let mut payment = sample_payment();
        payment.id = Uuid::new_v4();

        let id = repo.create_payment(payment.clone()).await.unwrap();
        assert_ne!(id, payment.id);

        let stored = repo.get_payment(id).await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.attributes, payment.attributes);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_but_keeps_record() {
        let repo = InMemoryPaymentRepository::new();
        let id = repo.create_payment(sample_payment()).await.unwrap();

        repo.delete_payment(id).await.unwrap();

        assert!(matches!(repo.get_payment(id).await, Err(RepositoryError::NotFound)));
        assert!(matches!(repo.delete_payment(id).await, Err(RepositoryError::NotFound)));
        assert!(repo.list_payments().await.unwrap().is_empty());
        assert!(repo.storage.get(&id).unwrap().deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_list_is_in_creation_order() {
        let repo = InMemoryPaymentRepository::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(repo.create_payment(sample_payment()).await.unwrap());
        }
        repo.delete_payment(ids[2]).await.unwrap();

        let listed: Vec<Uuid> = repo
            .list_payments()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(listed, vec![ids[0], ids[1], ids[3], ids[4]]);
    }

    #[tokio::test]
    async fn test_update_keeps_path_id() {
        let repo = InMemoryPaymentRepository::new();
        let id = repo.create_payment(sample_payment()).await.unwrap();

        let mut changed = sample_payment();
        changed.id = Uuid::new_v4();
        changed.attributes.amount = "999.99".to_string();
        repo.update_payment(id, changed).await.unwrap();

        let stored = repo.get_payment(id).await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.attributes.amount, "999.99");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = InMemoryPaymentRepository::new();
        let result = repo.update_payment(Uuid::new_v4(), sample_payment()).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }
}
