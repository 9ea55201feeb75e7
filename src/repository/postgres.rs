use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, Transaction};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{PaymentRepository, RepositoryError};
use crate::app::config::Config;
use crate::models::payment::{
    Attributes, BeneficiaryParty, Charge, ChargesInformation, DebtorParty, Forex, Payment,
    SponsorParty,
};

const ROLE_BENEFICIARY: &str = "beneficiary";
const ROLE_DEBTOR: &str = "debtor";
const ROLE_SPONSOR: &str = "sponsor";

const SELECT_PAYMENTS: &str = "\
    SELECT p.id, p.type AS kind, p.version, p.organisation_id, \
           a.amount, a.currency, a.end_to_end_reference, a.numeric_reference, \
           a.scheme_payment_id, a.payment_purpose, a.payment_scheme, a.payment_type, \
           a.processing_date, a.reference, a.scheme_payment_sub_type, a.scheme_payment_type, \
           a.bearer_code, a.receiver_charges_amount, a.receiver_charges_currency, \
           a.fx_contract_reference, a.fx_exchange_rate, a.fx_original_amount, \
           a.fx_original_currency \
    FROM payments p \
    JOIN payment_attributes a ON a.payment_id = p.id \
    WHERE p.deleted_at IS NULL";

fn connect_options(config: &Config) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.db_host)
        .port(config.db_port)
        .database(&config.db_name)
        .username(&config.db_user)
        .password(&config.db_password)
        .application_name(&config.app_name)
}

fn pool_options(config: &Config) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_secs))
}

/// Opens the connection pool described by the database section of the config.
pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options(config)
        .connect_with(connect_options(config))
        .await?;

    info!(
        "Connected to postgres at {}:{}/{}",
        config.db_host, config.db_port, config.db_name
    );
    Ok(pool)
}

/// Applies the embedded schema migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn hydrate(&self, rows: Vec<PaymentRow>) -> Result<Vec<Payment>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

        let parties: Vec<PartyRow> = sqlx::query_as(
            "SELECT payment_id, role, account_number, bank_id, bank_id_code, \
                    account_name, account_number_code, address, name, account_type \
             FROM payment_parties WHERE payment_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let charges: Vec<ChargeRow> = sqlx::query_as(
            "SELECT payment_id, amount, currency FROM payment_sender_charges \
             WHERE payment_id = ANY($1) ORDER BY payment_id, position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(assemble(rows, parties, charges))
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    kind: String,
    version: i64,
    organisation_id: Uuid,
    amount: String,
    currency: String,
    end_to_end_reference: String,
    numeric_reference: String,
    scheme_payment_id: String,
    payment_purpose: String,
    payment_scheme: String,
    payment_type: String,
    processing_date: String,
    reference: String,
    scheme_payment_sub_type: String,
    scheme_payment_type: String,
    bearer_code: String,
    receiver_charges_amount: String,
    receiver_charges_currency: String,
    fx_contract_reference: String,
    fx_exchange_rate: String,
    fx_original_amount: String,
    fx_original_currency: String,
}

#[derive(Debug, Clone, FromRow)]
struct PartyRow {
    payment_id: Uuid,
    role: String,
    account_number: String,
    bank_id: String,
    bank_id_code: String,
    account_name: String,
    account_number_code: String,
    address: String,
    name: String,
    account_type: i32,
}

impl PartyRow {
    fn sponsor(&self) -> SponsorParty {
        SponsorParty {
            account_number: self.account_number.clone(),
            bank_id: self.bank_id.clone(),
            bank_id_code: self.bank_id_code.clone(),
        }
    }

    fn debtor(&self) -> DebtorParty {
        DebtorParty {
            sponsor: self.sponsor(),
            account_name: self.account_name.clone(),
            account_number_code: self.account_number_code.clone(),
            address: self.address.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, FromRow)]
struct ChargeRow {
    payment_id: Uuid,
    amount: String,
    currency: String,
}

/// Stitches root rows together with their parties and charges. Charges are
/// expected in position order per payment.
fn assemble(rows: Vec<PaymentRow>, parties: Vec<PartyRow>, charges: Vec<ChargeRow>) -> Vec<Payment> {
    let mut parties_by_payment: HashMap<(Uuid, String), PartyRow> = parties
        .into_iter()
        .map(|party| ((party.payment_id, party.role.clone()), party))
        .collect();

    let mut charges_by_payment: HashMap<Uuid, Vec<Charge>> = HashMap::new();
    for charge in charges {
        charges_by_payment
            .entry(charge.payment_id)
            .or_default()
            .push(Charge {
                amount: charge.amount,
                currency: charge.currency,
            });
    }

    rows.into_iter()
        .map(|row| {
            let mut party = |role: &str| parties_by_payment.remove(&(row.id, role.to_string()));
            let beneficiary = party(ROLE_BENEFICIARY);
            let debtor = party(ROLE_DEBTOR);
            let sponsor = party(ROLE_SPONSOR);

            Payment {
                id: row.id,
                kind: row.kind,
                version: u32::try_from(row.version).unwrap_or_default(),
                organisation_id: row.organisation_id,
                attributes: Attributes {
                    amount: row.amount,
                    beneficiary_party: beneficiary
                        .map(|p| BeneficiaryParty {
                            debtor: p.debtor(),
                            account_type: p.account_type,
                        })
                        .unwrap_or_default(),
                    charges_information: ChargesInformation {
                        bearer_code: row.bearer_code,
                        sender_charges: charges_by_payment.remove(&row.id).unwrap_or_default(),
                        receiver_charges_amount: row.receiver_charges_amount,
                        receiver_charges_currency: row.receiver_charges_currency,
                    },
                    currency: row.currency,
                    debtor_party: debtor.map(|p| p.debtor()).unwrap_or_default(),
                    end_to_end_reference: row.end_to_end_reference,
                    forex: Forex {
                        contract_reference: row.fx_contract_reference,
                        exchange_rate: row.fx_exchange_rate,
                        original_amount: row.fx_original_amount,
                        original_currency: row.fx_original_currency,
                    },
                    numeric_reference: row.numeric_reference,
                    payment_id: row.scheme_payment_id,
                    payment_purpose: row.payment_purpose,
                    payment_scheme: row.payment_scheme,
                    payment_type: row.payment_type,
                    processing_date: row.processing_date,
                    reference: row.reference,
                    scheme_payment_sub_type: row.scheme_payment_sub_type,
                    scheme_payment_type: row.scheme_payment_type,
                    sponsor_party: sponsor.map(|p| p.sponsor()).unwrap_or_default(),
                },
            }
        })
        .collect()
}

async fn insert_details(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    attributes: &Attributes,
) -> Result<(), sqlx::Error> {
    let charges = &attributes.charges_information;
    let fx = &attributes.forex;

    sqlx::query(
        "INSERT INTO payment_attributes (payment_id, amount, currency, end_to_end_reference, \
             numeric_reference, scheme_payment_id, payment_purpose, payment_scheme, payment_type, \
             processing_date, reference, scheme_payment_sub_type, scheme_payment_type, \
             bearer_code, receiver_charges_amount, receiver_charges_currency, \
             fx_contract_reference, fx_exchange_rate, fx_original_amount, fx_original_currency) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                 $17, $18, $19, $20)",
    )
    .bind(id)
    .bind(&attributes.amount)
    .bind(&attributes.currency)
    .bind(&attributes.end_to_end_reference)
    .bind(&attributes.numeric_reference)
    .bind(&attributes.payment_id)
    .bind(&attributes.payment_purpose)
    .bind(&attributes.payment_scheme)
    .bind(&attributes.payment_type)
    .bind(&attributes.processing_date)
    .bind(&attributes.reference)
    .bind(&attributes.scheme_payment_sub_type)
    .bind(&attributes.scheme_payment_type)
    .bind(&charges.bearer_code)
    .bind(&charges.receiver_charges_amount)
    .bind(&charges.receiver_charges_currency)
    .bind(&fx.contract_reference)
    .bind(&fx.exchange_rate)
    .bind(&fx.original_amount)
    .bind(&fx.original_currency)
    .execute(&mut **tx)
    .await?;

    let beneficiary = &attributes.beneficiary_party;
    let parties: [(&str, &DebtorParty, i32); 3] = [
        (ROLE_BENEFICIARY, &beneficiary.debtor, beneficiary.account_type),
        (ROLE_DEBTOR, &attributes.debtor_party, 0),
        (
            ROLE_SPONSOR,
            &DebtorParty {
                sponsor: attributes.sponsor_party.clone(),
                ..DebtorParty::default()
            },
            0,
        ),
    ];
    for (role, party, account_type) in parties {
        sqlx::query(
            "INSERT INTO payment_parties (payment_id, role, account_number, bank_id, \
                 bank_id_code, account_name, account_number_code, address, name, account_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(id)
        .bind(role)
        .bind(&party.sponsor.account_number)
        .bind(&party.sponsor.bank_id)
        .bind(&party.sponsor.bank_id_code)
        .bind(&party.account_name)
        .bind(&party.account_number_code)
        .bind(&party.address)
        .bind(&party.name)
        .bind(account_type)
        .execute(&mut **tx)
        .await?;
    }

    for (position, charge) in charges.sender_charges.iter().enumerate() {
        sqlx::query(
            "INSERT INTO payment_sender_charges (payment_id, position, amount, currency) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(position as i32)
        .bind(&charge.amount)
        .bind(&charge.currency)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

async fn delete_details(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<(), sqlx::Error> {
    for table in ["payment_sender_charges", "payment_parties", "payment_attributes"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE payment_id = $1"))
            .bind(id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn get_payment(&self, id: Uuid) -> Result<Payment, RepositoryError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!("{SELECT_PAYMENTS} AND p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let row = row.ok_or(RepositoryError::NotFound)?;
        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, RepositoryError> {
        let rows: Vec<PaymentRow> =
            sqlx::query_as(&format!("{SELECT_PAYMENTS} ORDER BY p.created_at, p.id"))
                .fetch_all(&self.pool)
                .await?;

        self.hydrate(rows).await
    }

    async fn create_payment(&self, payment: Payment) -> Result<Uuid, RepositoryError> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO payments (id, type, version, organisation_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(&payment.kind)
        .bind(i64::from(payment.version))
        .bind(payment.organisation_id)
        .execute(&mut *tx)
        .await?;
        insert_details(&mut tx, id, &payment.attributes).await?;

        tx.commit().await?;
        debug!("Inserted payment {}", id);
        Ok(id)
    }

    async fn update_payment(&self, id: Uuid, payment: Payment) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE payments SET type = $2, version = $3, organisation_id = $4, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(&payment.kind)
        .bind(i64::from(payment.version))
        .bind(payment.organisation_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        delete_details(&mut tx, id).await?;
        insert_details(&mut tx, id, &payment.attributes).await?;

        tx.commit().await?;
        debug!("Updated payment {}", id);
        Ok(())
    }

    async fn delete_payment(&self, id: Uuid) -> Result<(), RepositoryError> {
        let deleted = sqlx::query(
            "UPDATE payments SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        debug!("Soft deleted payment {}", id);
        Ok(())
    }
}
