use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use prometheus_client::encoding::{text::encode, EncodeLabelSet};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

pub const COMPONENT: &str = "payments";

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub component: String,
    pub handler: String,
    pub code: String,
    pub method: String,
    pub success: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DurationLabels {
    pub component: String,
    pub handler: String,
    pub success: String,
}

/// Request counters and latency histograms, labelled per handler.
pub struct HttpMetrics {
    registry: Registry,
    requests_total: Family<RequestLabels, Counter>,
    request_duration_seconds: Family<DurationLabels, Histogram>,
}

impl HttpMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        // Exposed as http_requests_total
        let requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "http_requests",
            "Number of requests received",
            requests_total.clone(),
        );

        // 5ms .. ~10s
        let request_duration_seconds: Family<DurationLabels, Histogram> =
            Family::new_with_constructor(|| {
                Histogram::new(exponential_buckets(0.005, 2.0, 12))
            });
        registry.register(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            request_duration_seconds.clone(),
        );

        Self {
            registry,
            requests_total,
            request_duration_seconds,
        }
    }

    pub fn record(&self, handler: &str, method: &str, status: StatusCode, elapsed_secs: f64) {
        let success = status.is_success().to_string();

        self.requests_total
            .get_or_create(&RequestLabels {
                component: COMPONENT.to_string(),
                handler: handler.to_string(),
                code: status.as_u16().to_string(),
                method: method.to_lowercase(),
                success: success.clone(),
            })
            .inc();

        self.request_duration_seconds
            .get_or_create(&DurationLabels {
                component: COMPONENT.to_string(),
                handler: handler.to_string(),
                success,
            })
            .observe(elapsed_secs);
    }

    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for HttpMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware state naming the handler being measured.
#[derive(Clone)]
pub struct Instrument {
    pub metrics: Arc<HttpMetrics>,
    pub handler: &'static str,
}

pub async fn track(State(instrument): State<Instrument>, request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    instrument.metrics.record(
        instrument.handler,
        &method,
        response.status(),
        started.elapsed().as_secs_f64(),
    );
    response
}

pub async fn get_metrics(State(metrics): State<Arc<HttpMetrics>>) -> Response {
    match metrics.encode() {
        Ok(body) => (
            [(
                header::CONTENT_TYPE,
                "application/openmetrics-text; version=1.0.0; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}
