use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::models::payment::{
    CreatePaymentRequest, CreatePaymentResponse, DeletePaymentRequest, DeletePaymentResponse,
    GetPaymentRequest, GetPaymentResponse, ListPaymentsRequest, ListPaymentsResponse, Payment,
    UpdatePaymentRequest, UpdatePaymentResponse,
};
use crate::services::error::ApiError;
use crate::services::payment_service::PaymentService;
use crate::utils::validation::missing_fields;

/// Rejects malformed ids and incomplete payloads before they reach the
/// wrapped service.
pub struct PaymentValidator<S> {
    next: S,
}

impl<S: PaymentService> PaymentValidator<S> {
    pub fn new(next: S) -> Self {
        Self { next }
    }
}

pub fn validate_payment_id(id: &str) -> Result<(), ApiError> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ApiError::InvalidPaymentId)
}

pub fn validate_payload(payment: &Payment) -> Result<(), ApiError> {
    let missing = missing_fields(payment);
    if missing.is_empty() {
        Ok(())
    } else {
        warn!("Payment payload is missing fields: {}", missing.join(", "));
        Err(ApiError::InvalidPaymentPayload { missing })
    }
}

#[async_trait]
impl<S: PaymentService> PaymentService for PaymentValidator<S> {
    async fn get_payment(&self, req: GetPaymentRequest) -> Result<GetPaymentResponse, ApiError> {
        validate_payment_id(&req.payment_id)?;
        self.next.get_payment(req).await
    }

    async fn get_list_of_payments(
        &self,
        req: ListPaymentsRequest,
    ) -> Result<ListPaymentsResponse, ApiError> {
        self.next.get_list_of_payments(req).await
    }

    async fn post_payment(
        &self,
        req: CreatePaymentRequest,
    ) -> Result<CreatePaymentResponse, ApiError> {
        validate_payload(&req.payment)?;
        self.next.post_payment(req).await
    }

    async fn update_payment(
        &self,
        req: UpdatePaymentRequest,
    ) -> Result<UpdatePaymentResponse, ApiError> {
        validate_payment_id(&req.payment_id)?;
        validate_payload(&req.payment)?;
        self.next.update_payment(req).await
    }

    async fn delete_payment(
        &self,
        req: DeletePaymentRequest,
    ) -> Result<DeletePaymentResponse, ApiError> {
        validate_payment_id(&req.payment_id)?;
        self.next.delete_payment(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::{sample_payment, Links};
    use proptest::prelude::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Succeeds on every call and counts how many reached it.
    #[derive(Default)]
    struct CountingService {
        calls: Arc<AtomicUsize>,
    }

    impl CountingService {
        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[async_trait]
    impl PaymentService for CountingService {
        async fn get_payment(&self, _req: GetPaymentRequest) -> Result<GetPaymentResponse, ApiError> {
            self.hit();
            Ok(GetPaymentResponse { payment: sample_payment() })
        }

        async fn get_list_of_payments(
            &self,
            _req: ListPaymentsRequest,
        ) -> Result<ListPaymentsResponse, ApiError> {
            self.hit();
            Ok(ListPaymentsResponse {
                data: vec![],
                links: Links { self_link: String::new() },
            })
        }

        async fn post_payment(
            &self,
            _req: CreatePaymentRequest,
        ) -> Result<CreatePaymentResponse, ApiError> {
            self.hit();
            Ok(CreatePaymentResponse {
                id: Uuid::nil().to_string(),
                links: Links { self_link: String::new() },
            })
        }

        async fn update_payment(
            &self,
            req: UpdatePaymentRequest,
        ) -> Result<UpdatePaymentResponse, ApiError> {
            self.hit();
            Ok(UpdatePaymentResponse { id: req.payment_id })
        }

        async fn delete_payment(
            &self,
            req: DeletePaymentRequest,
        ) -> Result<DeletePaymentResponse, ApiError> {
            self.hit();
            Ok(DeletePaymentResponse { id: req.payment_id })
        }
    }

    fn validator() -> (PaymentValidator<CountingService>, Arc<AtomicUsize>) {
        let inner = CountingService::default();
        let calls = inner.calls.clone();
        (PaymentValidator::new(inner), calls)
    }

    fn incomplete_payment() -> Payment {
        let mut payment = sample_payment();
        payment.attributes.amount.clear();
        payment
    }

    #[tokio::test]
    async fn test_invalid_id_short_circuits() {
        let (validator, calls) = validator();

        let get = validator
            .get_payment(GetPaymentRequest { payment_id: "not-a-uuid".to_string() })
            .await;
        let update = validator
            .update_payment(UpdatePaymentRequest {
                payment_id: "not-a-uuid".to_string(),
                payment: sample_payment(),
            })
            .await;
        let delete = validator
            .delete_payment(DeletePaymentRequest { payment_id: "abcd".to_string() })
            .await;

        assert!(matches!(get, Err(ApiError::InvalidPaymentId)));
        assert!(matches!(update, Err(ApiError::InvalidPaymentId)));
        assert!(matches!(delete, Err(ApiError::InvalidPaymentId)));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_missing_field_short_circuits() {
        let (validator, calls) = validator();

        let post = validator
            .post_payment(CreatePaymentRequest { payment: incomplete_payment() })
            .await;
        let update = validator
            .update_payment(UpdatePaymentRequest {
                payment_id: Uuid::new_v4().to_string(),
                payment: incomplete_payment(),
            })
            .await;

        match post {
            Err(ApiError::InvalidPaymentPayload { missing }) => {
                assert_eq!(missing, vec!["attributes.amount"]);
            }
            other => panic!("expected invalid payload, got {other:?}"),
        }
        assert!(matches!(update, Err(ApiError::InvalidPaymentPayload { .. })));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_update_checks_id_before_payload() {
        let (validator, _) = validator();

        let result = validator
            .update_payment(UpdatePaymentRequest {
                payment_id: "bad".to_string(),
                payment: incomplete_payment(),
            })
            .await;

        assert!(matches!(result, Err(ApiError::InvalidPaymentId)));
    }

    #[tokio::test]
    async fn test_valid_requests_are_delegated() {
        let (validator, calls) = validator();
        let id = Uuid::new_v4().to_string();

        validator
            .get_payment(GetPaymentRequest { payment_id: id.clone() })
            .await
            .unwrap();
        validator.get_list_of_payments(ListPaymentsRequest).await.unwrap();
        validator
            .post_payment(CreatePaymentRequest { payment: sample_payment() })
            .await
            .unwrap();
        validator
            .update_payment(UpdatePaymentRequest {
                payment_id: id.clone(),
                payment: sample_payment(),
            })
            .await
            .unwrap();
        validator
            .delete_payment(DeletePaymentRequest { payment_id: id })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn test_accepted_uuid_forms() {
        let id = Uuid::new_v4();
        assert!(validate_payment_id(&id.to_string()).is_ok());
        assert!(validate_payment_id(&id.simple().to_string()).is_ok());
        assert!(validate_payment_id(&id.braced().to_string()).is_ok());
        assert!(validate_payment_id(&id.urn().to_string()).is_ok());
        assert!(validate_payment_id("").is_err());
    }

    /// JSON pointer of every required field, with the path reported for it.
    fn required_fields() -> Vec<(String, String)> {
        let mut fields = vec![
            ("/type".to_string(), "type".to_string()),
            ("/organisation_id".to_string(), "organisation_id".to_string()),
        ];
        let mut add = |pointer: String, path: String| fields.push((pointer, path));

        for name in [
            "amount",
            "currency",
            "end_to_end_reference",
            "numeric_reference",
            "payment_id",
            "payment_purpose",
            "payment_scheme",
            "payment_type",
            "processing_date",
            "reference",
            "scheme_payment_sub_type",
            "scheme_payment_type",
        ] {
            add(format!("/attributes/{name}"), format!("attributes.{name}"));
        }
        for party in ["beneficiary_party", "debtor_party"] {
            for name in [
                "account_number",
                "bank_id",
                "bank_id_code",
                "account_name",
                "account_number_code",
                "address",
                "name",
            ] {
                add(
                    format!("/attributes/{party}/{name}"),
                    format!("attributes.{party}.{name}"),
                );
            }
        }
        for name in ["account_number", "bank_id", "bank_id_code"] {
            add(
                format!("/attributes/sponsor_party/{name}"),
                format!("attributes.sponsor_party.{name}"),
            );
        }
        for name in [
            "bearer_code",
            "receiver_charges_amount",
            "receiver_charges_currency",
            "sender_charges",
        ] {
            add(
                format!("/attributes/charges_information/{name}"),
                format!("attributes.charges_information.{name}"),
            );
        }
        for index in 0..2 {
            for name in ["amount", "currency"] {
                add(
                    format!("/attributes/charges_information/sender_charges/{index}/{name}"),
                    format!("attributes.charges_information.sender_charges[{index}].{name}"),
                );
            }
        }
        for name in ["contract_reference", "exchange_rate", "original_amount", "original_currency"] {
            add(format!("/attributes/fx/{name}"), format!("attributes.fx.{name}"));
        }
        fields
    }

    #[derive(Debug, Clone, Copy)]
    enum Clear {
        Absent,
        Null,
        Empty,
    }

    fn clear_field(json: &mut Value, pointer: &str, clear: Clear) {
        let (parent, key) = pointer.rsplit_once('/').unwrap();
        let object = json.pointer_mut(parent).unwrap().as_object_mut().unwrap();
        match clear {
            Clear::Absent => {
                object.remove(key);
            }
            Clear::Null => {
                object.insert(key.to_string(), Value::Null);
            }
            Clear::Empty => {
                let empty = match key {
                    "organisation_id" => json!(Uuid::nil()),
                    "sender_charges" => json!([]),
                    _ => json!(""),
                };
                object.insert(key.to_string(), empty);
            }
        }
    }

    fn missing_of<T>(result: Result<T, ApiError>) -> Option<Vec<String>> {
        match result {
            Err(ApiError::InvalidPaymentPayload { missing }) => Some(missing),
            _ => None,
        }
    }

    #[test]
    fn test_required_fields_cover_every_reported_path() {
        let mut reported = crate::utils::validation::missing_fields(&Payment::default());
        reported.push("attributes.charges_information.sender_charges[0].amount".to_string());
        reported.push("attributes.charges_information.sender_charges[0].currency".to_string());
        reported.push("attributes.charges_information.sender_charges[1].amount".to_string());
        reported.push("attributes.charges_information.sender_charges[1].currency".to_string());
        reported.sort();

        let mut listed: Vec<String> = required_fields().into_iter().map(|(_, path)| path).collect();
        listed.sort();

        assert_eq!(listed, reported);
    }

    proptest! {
        #[test]
        fn prop_any_cleared_required_field_never_reaches_service(
            index in 0..required_fields().len(),
            clear in prop_oneof![Just(Clear::Absent), Just(Clear::Null), Just(Clear::Empty)],
        ) {
            let (pointer, path) = required_fields().swap_remove(index);
            let mut json = serde_json::to_value(sample_payment()).unwrap();
            clear_field(&mut json, &pointer, clear);
            let payment: Payment = serde_json::from_value(json).unwrap();

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (validator, calls) = validator();

            runtime.block_on(async {
                let post = validator
                    .post_payment(CreatePaymentRequest { payment: payment.clone() })
                    .await;
                let update = validator
                    .update_payment(UpdatePaymentRequest {
                        payment_id: Uuid::new_v4().to_string(),
                        payment,
                    })
                    .await;
                prop_assert_eq!(missing_of(post), Some(vec![path.clone()]));
                prop_assert_eq!(missing_of(update), Some(vec![path.clone()]));
                Ok(())
            })?;

            prop_assert_eq!(calls.load(Ordering::Relaxed), 0);
        }

        #[test]
        fn prop_non_uuid_ids_never_reach_service(id in "\\PC*") {
            prop_assume!(Uuid::parse_str(&id).is_err());

            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (validator, calls) = validator();

            runtime.block_on(async {
                let get = validator
                    .get_payment(GetPaymentRequest { payment_id: id.clone() })
                    .await;
                let delete = validator
                    .delete_payment(DeletePaymentRequest { payment_id: id.clone() })
                    .await;
                prop_assert!(matches!(get, Err(ApiError::InvalidPaymentId)));
                prop_assert!(matches!(delete, Err(ApiError::InvalidPaymentId)));
                Ok(())
            })?;

            prop_assert_eq!(calls.load(Ordering::Relaxed), 0);
        }
    }
}
