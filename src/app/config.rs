use std::{net::SocketAddr, time::Duration};

use crate::{
    error::AppError,
    telemetry::subscriber::LogSettings,
    threading::{SortStrategy, cache::DEFAULT_MAX_CACHED_POSTS},
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_SERVICE_NAME: &str = "pet-feed-api";
const DEFAULT_TRACER_NAME: &str = "pet-feed";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

/// Log output and optional OTLP export. Export is off unless a collector
/// endpoint is set.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log: LogSettings,
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
    pub tracer_name: String,
}

impl TelemetryConfig {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            log: LogSettings::parse(
                lookup("LOG_FORMAT").as_deref(),
                lookup("LOG_LEVEL").as_deref(),
            ),
            otlp_endpoint: non_blank("OTEL_EXPORTER_OTLP_ENDPOINT"),
            service_name: non_blank("OTEL_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            tracer_name: non_blank("OTEL_TRACER_NAME")
                .unwrap_or_else(|| DEFAULT_TRACER_NAME.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub bind_addr: SocketAddr,
    pub cors_allowed_origin: String,
    pub jwt_secret: String,
    pub default_sort: SortStrategy,
    pub cache_max_posts: usize,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::Internal(format!("{key} missing")))
        };

        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 20),
            min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 1),
            acquire_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                15,
            )),
        };

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|err| AppError::Internal(format!("BIND_ADDR invalid: {err}")))?;

        let default_sort = match lookup("COMMENT_DEFAULT_SORT") {
            Some(value) => value
                .parse::<SortStrategy>()
                .map_err(|err| AppError::Internal(format!("COMMENT_DEFAULT_SORT invalid: {err}")))?,
            None => SortStrategy::default(),
        };

        Ok(Self {
            database,
            bind_addr,
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            jwt_secret: required("JWT_SECRET")?,
            default_sort,
            cache_max_posts: parse_or(&lookup, "COMMENT_CACHE_MAX_POSTS", DEFAULT_MAX_CACHED_POSTS),
            telemetry: TelemetryConfig::from_lookup(&lookup),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tracing::Level;

    use super::*;
    use crate::telemetry::{otel::OtlpPipeline, subscriber::LogFormat};

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn applies_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pets"),
            ("JWT_SECRET", "secret"),
        ])
        .expect("valid");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.database.acquire_timeout, Duration::from_secs(15));
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.default_sort, SortStrategy::Top);
        assert_eq!(config.cache_max_posts, DEFAULT_MAX_CACHED_POSTS);
        assert_eq!(config.telemetry.otlp_endpoint, None);
        assert_eq!(config.telemetry.service_name, "pet-feed-api");
        assert_eq!(config.telemetry.tracer_name, "pet-feed");
        assert_eq!(config.telemetry.log.format, LogFormat::Pretty);
    }

    #[test]
    fn blank_otlp_endpoint_installs_no_exporter() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pets"),
            ("JWT_SECRET", "secret"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "   "),
            ("OTEL_SERVICE_NAME", ""),
        ])
        .expect("valid");
        assert_eq!(config.telemetry.otlp_endpoint, None);
        assert_eq!(config.telemetry.service_name, "pet-feed-api");
        assert!(matches!(OtlpPipeline::install(&config.telemetry), Ok(None)));
    }

    #[test]
    fn reads_telemetry_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pets"),
            ("JWT_SECRET", "secret"),
            ("LOG_FORMAT", "json"),
            ("LOG_LEVEL", "warn"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", " http://collector:4317 "),
            ("OTEL_SERVICE_NAME", "pet-feed-staging"),
            ("OTEL_TRACER_NAME", "threads"),
        ])
        .expect("valid");
        let telemetry = config.telemetry;
        assert_eq!(telemetry.log.format, LogFormat::Json);
        assert_eq!(telemetry.log.level, Level::WARN);
        assert_eq!(telemetry.otlp_endpoint.as_deref(), Some("http://collector:4317"));
        assert_eq!(telemetry.service_name, "pet-feed-staging");
        assert_eq!(telemetry.tracer_name, "threads");
    }

    #[test]
    fn requires_database_url_and_secret() {
        assert!(matches!(
            config_from(&[("JWT_SECRET", "secret")]),
            Err(AppError::Internal(message)) if message.contains("DATABASE_URL")
        ));
        assert!(matches!(
            config_from(&[("DATABASE_URL", "postgres://localhost/pets")]),
            Err(AppError::Internal(message)) if message.contains("JWT_SECRET")
        ));
    }

    #[test]
    fn reads_overrides_and_ignores_garbage_numbers() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pets"),
            ("JWT_SECRET", "secret"),
            ("DATABASE_MAX_CONNECTIONS", "not-a-number"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("COMMENT_DEFAULT_SORT", "recent"),
            ("COMMENT_CACHE_MAX_POSTS", "16"),
        ])
        .expect("valid");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.default_sort, SortStrategy::Recent);
        assert_eq!(config.cache_max_posts, 16);
    }

    #[test]
    fn rejects_unknown_default_sort() {
        let result = config_from(&[
            ("DATABASE_URL", "postgres://localhost/pets"),
            ("JWT_SECRET", "secret"),
            ("COMMENT_DEFAULT_SORT", "hot"),
        ]);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
