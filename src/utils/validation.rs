// Required-field checks for payment payloads

use crate::models::payment::{
    Attributes, BeneficiaryParty, Charge, ChargesInformation, DebtorParty, Forex, Payment,
    SponsorParty,
};

/// Types whose required fields can be checked recursively. Missing fields
/// are reported with their JSON path, e.g. `attributes.fx.exchange_rate`.
pub trait Required {
    fn collect_missing(&self, path: &str, missing: &mut Vec<String>);
}

/// Returns every missing required field of the payment, empty when valid.
pub fn missing_fields(payment: &Payment) -> Vec<String> {
    let mut missing = Vec::new();
    payment.collect_missing("", &mut missing);
    missing
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

fn require(value: &str, path: &str, field: &str, missing: &mut Vec<String>) {
    if value.is_empty() {
        missing.push(join(path, field));
    }
}

impl Required for Payment {
    fn collect_missing(&self, path: &str, missing: &mut Vec<String>) {
        require(&self.kind, path, "type", missing);
        if self.organisation_id.is_nil() {
            missing.push(join(path, "organisation_id"));
        }
        self.attributes.collect_missing(&join(path, "attributes"), missing);
    }
}

impl Required for Attributes {
    fn collect_missing(&self, path: &str, missing: &mut Vec<String>) {
        require(&self.amount, path, "amount", missing);
        require(&self.currency, path, "currency", missing);
        require(&self.end_to_end_reference, path, "end_to_end_reference", missing);
        require(&self.numeric_reference, path, "numeric_reference", missing);
        require(&self.payment_id, path, "payment_id", missing);
        require(&self.payment_purpose, path, "payment_purpose", missing);
        require(&self.payment_scheme, path, "payment_scheme", missing);
        require(&self.payment_type, path, "payment_type", missing);
        require(&self.processing_date, path, "processing_date", missing);
        require(&self.reference, path, "reference", missing);
        require(&self.scheme_payment_sub_type, path, "scheme_payment_sub_type", missing);
        require(&self.scheme_payment_type, path, "scheme_payment_type", missing);

        self.beneficiary_party
            .collect_missing(&join(path, "beneficiary_party"), missing);
        self.charges_information
            .collect_missing(&join(path, "charges_information"), missing);
        self.debtor_party
            .collect_missing(&join(path, "debtor_party"), missing);
        self.forex.collect_missing(&join(path, "fx"), missing);
        self.sponsor_party
            .collect_missing(&join(path, "sponsor_party"), missing);
    }
}

impl Required for SponsorParty {
    fn collect_missing(&self, path: &str, missing: &mut Vec<String>) {
        require(&self.account_number, path, "account_number", missing);
        require(&self.bank_id, path, "bank_id", missing);
        require(&self.bank_id_code, path, "bank_id_code", missing);
    }
}

impl Required for DebtorParty {
    fn collect_missing(&self, path: &str, missing: &mut Vec<String>) {
        self.sponsor.collect_missing(path, missing);
        require(&self.account_name, path, "account_name", missing);
        require(&self.account_number_code, path, "account_number_code", missing);
        require(&self.address, path, "address", missing);
        require(&self.name, path, "name", missing);
    }
}

impl Required for BeneficiaryParty {
    // account_type is a plain integer, zero is a valid account type
    fn collect_missing(&self, path: &str, missing: &mut Vec<String>) {
        self.debtor.collect_missing(path, missing);
    }
}

impl Required for ChargesInformation {
    fn collect_missing(&self, path: &str, missing: &mut Vec<String>) {
        require(&self.bearer_code, path, "bearer_code", missing);
        require(&self.receiver_charges_amount, path, "receiver_charges_amount", missing);
        require(
            &self.receiver_charges_currency,
            path,
            "receiver_charges_currency",
            missing,
        );

        if self.sender_charges.is_empty() {
            missing.push(join(path, "sender_charges"));
        }
        for (index, charge) in self.sender_charges.iter().enumerate() {
            charge.collect_missing(&join(path, &format!("sender_charges[{index}]")), missing);
        }
    }
}

impl Required for Charge {
    fn collect_missing(&self, path: &str, missing: &mut Vec<String>) {
        require(&self.amount, path, "amount", missing);
        require(&self.currency, path, "currency", missing);
    }
}

impl Required for Forex {
    fn collect_missing(&self, path: &str, missing: &mut Vec<String>) {
        require(&self.contract_reference, path, "contract_reference", missing);
        require(&self.exchange_rate, path, "exchange_rate", missing);
        require(&self.original_amount, path, "original_amount", missing);
        require(&self.original_currency, path, "original_currency", missing);
    }
}
