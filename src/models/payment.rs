use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};
use uuid::Uuid;

/// A payment resource. Missing or `null` JSON fields decode to empty values
/// so the validator can report them instead of the body being rejected.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    #[serde_as(as = "DefaultOnNull")]
    pub id: Uuid,
    #[serde(rename = "type")]
    #[serde_as(as = "DefaultOnNull")]
    pub kind: String,
    #[serde_as(as = "DefaultOnNull")]
    pub version: u32,
    #[serde_as(as = "DefaultOnNull")]
    pub organisation_id: Uuid,
    #[serde_as(as = "DefaultOnNull")]
    pub attributes: Attributes,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    #[serde_as(as = "DefaultOnNull")]
    pub amount: String,
    #[serde_as(as = "DefaultOnNull")]
    pub beneficiary_party: BeneficiaryParty,
    #[serde_as(as = "DefaultOnNull")]
    pub charges_information: ChargesInformation,
    #[serde_as(as = "DefaultOnNull")]
    pub currency: String,
    #[serde_as(as = "DefaultOnNull")]
    pub debtor_party: DebtorParty,
    #[serde_as(as = "DefaultOnNull")]
    pub end_to_end_reference: String,
    #[serde(rename = "fx")]
    #[serde_as(as = "DefaultOnNull")]
    pub forex: Forex,
    #[serde_as(as = "DefaultOnNull")]
    pub numeric_reference: String,
    /// Scheme-level payment reference, unrelated to `Payment::id`.
    #[serde_as(as = "DefaultOnNull")]
    pub payment_id: String,
    #[serde_as(as = "DefaultOnNull")]
    pub payment_purpose: String,
    #[serde_as(as = "DefaultOnNull")]
    pub payment_scheme: String,
    #[serde_as(as = "DefaultOnNull")]
    pub payment_type: String,
    #[serde_as(as = "DefaultOnNull")]
    pub processing_date: String,
    #[serde_as(as = "DefaultOnNull")]
    pub reference: String,
    #[serde_as(as = "DefaultOnNull")]
    pub scheme_payment_sub_type: String,
    #[serde_as(as = "DefaultOnNull")]
    pub scheme_payment_type: String,
    #[serde_as(as = "DefaultOnNull")]
    pub sponsor_party: SponsorParty,
}

/// Bank account identification shared by every party.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SponsorParty {
    #[serde_as(as = "DefaultOnNull")]
    pub account_number: String,
    #[serde_as(as = "DefaultOnNull")]
    pub bank_id: String,
    #[serde_as(as = "DefaultOnNull")]
    pub bank_id_code: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtorParty {
    #[serde(flatten)]
    pub sponsor: SponsorParty,
    #[serde_as(as = "DefaultOnNull")]
    pub account_name: String,
    #[serde_as(as = "DefaultOnNull")]
    pub account_number_code: String,
    #[serde_as(as = "DefaultOnNull")]
    pub address: String,
    #[serde_as(as = "DefaultOnNull")]
    pub name: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeneficiaryParty {
    #[serde(flatten)]
    pub debtor: DebtorParty,
    #[serde_as(as = "DefaultOnNull")]
    pub account_type: i32,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargesInformation {
    #[serde_as(as = "DefaultOnNull")]
    pub bearer_code: String,
    #[serde_as(as = "DefaultOnNull")]
    pub sender_charges: Vec<Charge>,
    #[serde_as(as = "DefaultOnNull")]
    pub receiver_charges_amount: String,
    #[serde_as(as = "DefaultOnNull")]
    pub receiver_charges_currency: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Charge {
    #[serde_as(as = "DefaultOnNull")]
    pub amount: String,
    #[serde_as(as = "DefaultOnNull")]
    pub currency: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Forex {
    #[serde_as(as = "DefaultOnNull")]
    pub contract_reference: String,
    #[serde_as(as = "DefaultOnNull")]
    pub exchange_rate: String,
    #[serde_as(as = "DefaultOnNull")]
    pub original_amount: String,
    #[serde_as(as = "DefaultOnNull")]
    pub original_currency: String,
}

// Requests and responses exchanged between transport, endpoints and service.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetPaymentRequest {
    pub payment_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPaymentsRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePaymentRequest {
    pub payment: Payment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePaymentRequest {
    pub payment_id: String,
    pub payment: Payment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePaymentRequest {
    pub payment_id: String,
}

/// Hyperlink envelope attached to collection and creation responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GetPaymentResponse {
    pub payment: Payment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPaymentsResponse {
    pub data: Vec<Payment>,
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePaymentResponse {
    pub id: String,
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePaymentResponse {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletePaymentResponse {
    pub id: String,
}

#[cfg(test)]
pub(crate) fn sample_payment() -> Payment {
    let sponsor = |n: &str| SponsorParty {
        account_number: format!("5600{n}"),
        bank_id: "203301".to_string(),
        bank_id_code: "GBDSC".to_string(),
    };
    let debtor = |n: &str, name: &str| DebtorParty {
        sponsor: sponsor(n),
        account_name: format!("{name} account"),
        account_number_code: "BBAN".to_string(),
        address: "1 The Beneficiary Localtown SE2".to_string(),
        name: name.to_string(),
    };

    Payment {
        id: Uuid::nil(),
        kind: "Payment".to_string(),
        version: 0,
        organisation_id: Uuid::parse_str("743d5b63-8e6f-432e-a8fa-c5d8d2ee5fcb")
            .expect("valid organisation id"),
        attributes: Attributes {
            amount: "100.21".to_string(),
            beneficiary_party: BeneficiaryParty {
                debtor: debtor("1", "Wilfred Jeremiah Owens"),
                account_type: 0,
            },
            charges_information: ChargesInformation {
                bearer_code: "SHAR".to_string(),
                sender_charges: vec![
                    Charge { amount: "5.00".to_string(), currency: "GBP".to_string() },
                    Charge { amount: "10.00".to_string(), currency: "USD".to_string() },
                ],
                receiver_charges_amount: "1.00".to_string(),
                receiver_charges_currency: "USD".to_string(),
            },
            currency: "GBP".to_string(),
            debtor_party: debtor("2", "Emelia Jane Brown"),
            end_to_end_reference: "Wil piano Jan".to_string(),
            forex: Forex {
                contract_reference: "FX123".to_string(),
                exchange_rate: "2.00000".to_string(),
                original_amount: "200.42".to_string(),
                original_currency: "USD".to_string(),
            },
            numeric_reference: "1002001".to_string(),
            payment_id: "123456789012345678".to_string(),
            payment_purpose: "Paying for goods/services".to_string(),
            payment_scheme: "FPS".to_string(),
            payment_type: "Credit".to_string(),
            processing_date: "2017-01-18".to_string(),
            reference: "Payment for Em's piano lessons".to_string(),
            scheme_payment_sub_type: "InternetBanking".to_string(),
            scheme_payment_type: "ImmediatePayment".to_string(),
            sponsor_party: sponsor("3"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parties_serialize_flat() {
        let payment = sample_payment();
        let json = serde_json::to_value(&payment).unwrap();

        let beneficiary = &json["attributes"]["beneficiary_party"];
        assert_eq!(beneficiary["account_number"], "56001");
        assert_eq!(beneficiary["name"], "Wilfred Jeremiah Owens");
        assert_eq!(beneficiary["account_type"], 0);
        assert_eq!(json["type"], "Payment");
        assert!(json["attributes"]["fx"].is_object());
    }

    #[test]
    fn test_missing_fields_decode_to_empty() {
        let payment: Payment =
            serde_json::from_str(r#"{"type":"Payment","attributes":{"currency":"GBP"}}"#).unwrap();

        assert_eq!(payment.kind, "Payment");
        assert_eq!(payment.attributes.currency, "GBP");
        assert!(payment.attributes.amount.is_empty());
        assert!(payment.organisation_id.is_nil());
        assert!(payment.attributes.charges_information.sender_charges.is_empty());
    }

    #[test]
    fn test_null_fields_decode_to_empty() {
        let payment: Payment = serde_json::from_str(
            r#"{"type":null,"version":null,"organisation_id":null,"attributes":{
                "amount":null,
                "charges_information":{"sender_charges":null},
                "beneficiary_party":{"account_number":null,"name":null,"account_type":null},
                "fx":null
            }}"#,
        )
        .unwrap();

        assert!(payment.kind.is_empty());
        assert_eq!(payment.version, 0);
        assert!(payment.organisation_id.is_nil());
        assert!(payment.attributes.amount.is_empty());
        assert!(payment.attributes.charges_information.sender_charges.is_empty());
        assert_eq!(payment.attributes.beneficiary_party, BeneficiaryParty::default());
        assert_eq!(payment.attributes.forex, Forex::default());
    }

    #[test]
    fn test_malformed_organisation_id_is_rejected() {
        let result = serde_json::from_str::<Payment>(r#"{"organisation_id":"nope"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_links_use_self_key() {
        let links = Links { self_link: "localhost:8080/v1/payments/".to_string() };
        assert_eq!(
            serde_json::to_string(&links).unwrap(),
            r#"{"self":"localhost:8080/v1/payments/"}"#
        );
    }
}
