use std::error::Error;

use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{app::config::TelemetryConfig, telemetry::otel::OtlpPipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    pub level: Level,
}

impl LogSettings {
    pub fn parse(format: Option<&str>, level: Option<&str>) -> Self {
        let format = match format.map(str::trim) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let level = match level.map(str::trim) {
            Some("trace") => Level::TRACE,
            Some("debug") => Level::DEBUG,
            Some("warn") => Level::WARN,
            Some("error") => Level::ERROR,
            _ => Level::INFO,
        };

        Self { format, level }
    }

    fn default_filter(&self) -> String {
        let level = self.level.as_str().to_lowercase();
        format!("{level},tower_http=info,sqlx=warn")
    }
}

/// Keeps exporters alive until the server stops.
pub struct TelemetryGuard {
    otlp: Option<OtlpPipeline>,
}

impl TelemetryGuard {
    pub fn shutdown(self) {
        if let Some(pipeline) = self.otlp {
            pipeline.shutdown();
        }
    }
}

pub fn init_tracing(config: &TelemetryConfig) -> Result<TelemetryGuard, Box<dyn Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.default_filter()));

    let (otlp, otel_layer) = match OtlpPipeline::install(config)? {
        Some((pipeline, layer)) => (Some(pipeline), Some(layer)),
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(otel_layer)
        .with(env_filter);

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true);

    match config.log.format {
        LogFormat::Json => registry.with(fmt_layer.json()).try_init()?,
        LogFormat::Pretty => registry.with(fmt_layer.pretty()).try_init()?,
    }

    Ok(TelemetryGuard { otlp })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_pretty_info() {
        let settings = LogSettings::parse(None, None);
        assert_eq!(settings.format, LogFormat::Pretty);
        assert_eq!(settings.level, Level::INFO);
        assert_eq!(settings.default_filter(), "info,tower_http=info,sqlx=warn");
    }

    #[test]
    fn reads_json_and_level() {
        let settings = LogSettings::parse(Some("json"), Some(" debug"));
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.level, Level::DEBUG);
    }
}
