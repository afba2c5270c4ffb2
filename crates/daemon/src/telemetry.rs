//! Telemetry setup for OpenTelemetry integration
//!
//! Built only with the `telemetry` feature and activated by `OTEL_EXPORTER_OTLP_ENDPOINT`.

use tracing_subscriber::{Layer, Registry};

pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[cfg(feature = "telemetry")]
const DEFAULT_SERVICE_NAME: &str = "batchline";

/// Outcome of telemetry setup, logged once the subscriber is installed
pub enum TelemetryStatus {
    NotConfigured,
    FeatureDisabled,
    Enabled { endpoint: String, service_name: String },
    Failed(String),
}

impl TelemetryStatus {
    pub fn log(&self) {
        match self {
            TelemetryStatus::NotConfigured => {
                tracing::debug!("OpenTelemetry not configured (OTEL_EXPORTER_OTLP_ENDPOINT not set)")
            }
            TelemetryStatus::FeatureDisabled => {
                tracing::warn!("OpenTelemetry endpoint set but feature 'telemetry' not enabled");
                tracing::warn!("Rebuild with: cargo build --features telemetry");
            }
            TelemetryStatus::Enabled {
                endpoint,
                service_name,
            } => tracing::info!(
                service_name = %service_name,
                endpoint = %endpoint,
                "OpenTelemetry initialized"
            ),
            TelemetryStatus::Failed(error) => tracing::warn!(
                error = %error,
                "Failed to initialize OpenTelemetry (continuing without it)"
            ),
        }
    }
}

/// OTLP export layer, if enabled
///
/// # Environment Variables
///
/// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
/// - `OTEL_SERVICE_NAME`: Service name (default: batchline)
pub fn layer() -> (Option<BoxedLayer>, TelemetryStatus) {
    let endpoint = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => endpoint,
        Err(_) => return (None, TelemetryStatus::NotConfigured),
    };

    enable(endpoint)
}

#[cfg(feature = "telemetry")]
fn enable(endpoint: String) -> (Option<BoxedLayer>, TelemetryStatus) {
    let service_name =
        std::env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string());
    match otlp_layer(&endpoint, &service_name) {
        Ok(layer) => (
            Some(layer),
            TelemetryStatus::Enabled {
                endpoint,
                service_name,
            },
        ),
        Err(e) => (None, TelemetryStatus::Failed(e.to_string())),
    }
}

#[cfg(not(feature = "telemetry"))]
fn enable(_endpoint: String) -> (Option<BoxedLayer>, TelemetryStatus) {
    (None, TelemetryStatus::FeatureDisabled)
}

#[cfg(feature = "telemetry")]
fn otlp_layer(
    endpoint: &str,
    service_name: &str,
) -> anyhow::Result<BoxedLayer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .build();

    let tracer = provider.tracer(service_name.to_string());
    opentelemetry::global::set_tracer_provider(provider);

    Ok(tracing_opentelemetry::layer().with_tracer(tracer).boxed())
}

/// Flush pending spans before exit
pub fn shutdown() {
    #[cfg(feature = "telemetry")]
    opentelemetry::global::shutdown_tracer_provider();
}
