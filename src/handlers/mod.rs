pub mod endpoints;
pub mod metrics;
pub mod payments;

use axum::{
    handler::Handler,
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::app::config::Config;
use crate::repository::PaymentRepository;
use crate::services::new_payment_service;
use endpoints::Endpoints;
use metrics::{HttpMetrics, Instrument};

#[derive(Clone)]
pub struct AppState {
    pub endpoints: Endpoints,
    pub metrics: Arc<HttpMetrics>,
}

impl AppState {
    pub fn build(repository: Arc<dyn PaymentRepository>, config: &Config) -> Self {
        Self {
            endpoints: Endpoints::new(new_payment_service(repository, config)),
            metrics: Arc::new(HttpMetrics::new()),
        }
    }

    fn instrument(&self, handler: &'static str) -> Instrument {
        Instrument {
            metrics: self.metrics.clone(),
            handler,
        }
    }
}

/// Public API routes. Each route answers with or without the trailing slash.
pub fn router(state: AppState) -> Router {
    let track = |name| middleware::from_fn_with_state(state.instrument(name), metrics::track);

    let collection = get(payments::get_list_of_payments.layer(track("get_list_of_payments")))
        .post(payments::post_payment.layer(track("post_payment")));
    let resource = get(payments::get_payment.layer(track("get_payment_by_id")))
        .put(payments::update_payment.layer(track("put_payment")))
        .delete(payments::delete_payment.layer(track("delete_payment")));

    Router::new()
        .route("/", get(welcome_handler))
        .route("/v1/payments", collection.clone())
        .route("/v1/payments/", collection)
        .route("/v1/payments/:id", resource.clone())
        .route("/v1/payments/:id/", resource)
        .with_state(state)
}

/// Observability routes served on the ops port.
pub fn ops_router(metrics: Arc<HttpMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics::get_metrics))
        .route("/healthz", get(metrics::health_handler))
        .with_state(metrics)
}

async fn welcome_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Welcome to the Payments API!\n")
}
