use std::error::Error;

use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    trace::{SdkTracerProvider, Tracer},
};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Registry;

use crate::app::config::TelemetryConfig;

pub type OtelLayer = OpenTelemetryLayer<Registry, Tracer>;

/// OTLP span export for this process.
///
/// The caller owns the pipeline and must call `shutdown` before exit, or
/// spans still queued in the batch exporter are lost.
pub struct OtlpPipeline {
    provider: SdkTracerProvider,
}

impl OtlpPipeline {
    /// Returns `None` when no collector endpoint is configured.
    pub fn install(
        config: &TelemetryConfig,
    ) -> Result<Option<(Self, OtelLayer)>, Box<dyn Error + Send + Sync>> {
        let Some(endpoint) = config.otlp_endpoint.as_deref() else {
            return Ok(None);
        };

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;
        let provider = SdkTracerProvider::builder()
            .with_resource(service_resource(config))
            .with_batch_exporter(exporter)
            .build();

        global::set_text_map_propagator(TraceContextPropagator::new());
        global::set_tracer_provider(provider.clone());

        let layer = OpenTelemetryLayer::new(provider.tracer(config.tracer_name.clone()));
        Ok(Some((Self { provider }, layer)))
    }

    pub fn shutdown(self) {
        if let Err(err) = self.provider.shutdown() {
            tracing::warn!(error = %err, "OTLP exporter did not flush cleanly");
        }
    }
}

fn service_resource(config: &TelemetryConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build()
}
