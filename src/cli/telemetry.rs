//! Log output and optional OTLP span export.

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use opentelemetry::{KeyValue, global, trace::TracerProvider as _};
use opentelemetry_otlp::{WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    Resource,
    trace::{SdkTracerProvider, Tracer},
};
use std::{env::var, time::Duration};
use tonic::{
    metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue},
    transport::ClientTlsConfig,
};
use tracing::{Level, debug};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};
use ulid::Ulid;

const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(3);

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// OTLP exporter settings read from the standard `OTEL_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OtlpSettings {
    endpoint: String,
    headers: Vec<(String, String)>,
    timeout: Duration,
    instance_id: String,
}

impl OtlpSettings {
    /// `None` when no collector endpoint is configured.
    fn from_env() -> Option<Self> {
        let endpoint = var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .filter(|ep| !ep.trim().is_empty())?;

        let headers = var("OTEL_EXPORTER_OTLP_HEADERS")
            .map(|raw| parse_header_pairs(&raw))
            .unwrap_or_default();

        let timeout = var("OTEL_EXPORTER_OTLP_TIMEOUT")
            .ok()
            .and_then(|ms| ms.trim().parse::<u64>().ok())
            .map_or(DEFAULT_EXPORT_TIMEOUT, Duration::from_millis);

        let instance_id =
            var("OTEL_SERVICE_INSTANCE_ID").unwrap_or_else(|_| Ulid::new().to_string());

        Some(Self {
            endpoint: with_scheme(&endpoint),
            headers,
            timeout,
            instance_id,
        })
    }

    /// Host to verify the collector certificate against, for `https` endpoints.
    fn tls_domain(&self) -> Option<&str> {
        let authority = self.endpoint.strip_prefix("https://")?.split('/').next()?;
        authority.split(':').next().filter(|host| !host.is_empty())
    }

    fn metadata(&self) -> Result<MetadataMap> {
        let mut metadata = MetadataMap::with_capacity(self.headers.len());

        for (name, value) in &self.headers {
            let name = name.to_ascii_lowercase();
            let key = MetadataKey::<Ascii>::from_bytes(name.as_bytes())
                .map_err(|e| anyhow!("invalid OTLP header name {name}: {e}"))?;
            let value: MetadataValue<Ascii> = value
                .parse()
                .map_err(|e| anyhow!("invalid OTLP header value for {name}: {e}"))?;
            metadata.insert(key, value);
        }

        Ok(metadata)
    }
}

// `k1=v1,k2=v2`; entries without a key are skipped.
fn parse_header_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

// gRPC collectors default to https when no scheme is given.
fn with_scheme(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    }
}

fn init_tracer(settings: &OtlpSettings) -> Result<Tracer> {
    let mut exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(settings.endpoint.as_str())
        .with_timeout(settings.timeout);

    if let Some(domain) = settings.tls_domain() {
        exporter = exporter.with_tls_config(
            ClientTlsConfig::new()
                .domain_name(domain.to_string())
                .with_native_roots(),
        );
    }

    if !settings.headers.is_empty() {
        exporter = exporter.with_metadata(settings.metadata()?);
    }

    let exporter = exporter
        .build()
        .context("failed to build OTLP span exporter")?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder_empty()
                .with_attributes([
                    KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                    KeyValue::new("service.instance.id", settings.instance_id.clone()),
                ])
                .build(),
        )
        .build();

    let _ = TRACER_PROVIDER.set(provider.clone());
    global::set_tracer_provider(provider.clone());

    Ok(provider.tracer(env!("CARGO_PKG_NAME")))
}

/// Install the global subscriber.
///
/// Logs go to stdout as text or JSON. Spans are also exported over OTLP/gRPC
/// when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// # Errors
///
/// Returns an error if the exporter or the subscriber cannot be installed
pub fn init(verbosity_level: Option<Level>, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity_level.unwrap_or(Level::ERROR).into())
        .from_env_lossy()
        .add_directive("hyper=error".parse()?)
        .add_directive("tokio=error".parse()?)
        .add_directive("sqlx=warn".parse()?)
        .add_directive("opentelemetry_sdk=warn".parse()?);

    let text_layer = (format == LogFormat::Text).then(|| fmt::layer().with_target(false));
    let json_layer = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
    });

    let otel_layer = match OtlpSettings::from_env() {
        Some(settings) => Some(tracing_opentelemetry::layer().with_tracer(init_tracer(&settings)?)),
        None => None,
    };

    let subscriber = Registry::default()
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Flush pending spans; does nothing when export was never enabled.
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            debug!("tracer provider shutdown failed: {e}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const OTEL_VARS: [&str; 4] = [
        "OTEL_EXPORTER_OTLP_ENDPOINT",
        "OTEL_EXPORTER_OTLP_HEADERS",
        "OTEL_EXPORTER_OTLP_TIMEOUT",
        "OTEL_SERVICE_INSTANCE_ID",
    ];

    #[test]
    fn log_format_from_name() {
        assert_eq!(LogFormat::from_name("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_name("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_name("text"), LogFormat::Text);
        assert_eq!(LogFormat::from_name("pretty"), LogFormat::Text);
    }

    #[test]
    fn no_endpoint_disables_export() {
        temp_env::with_vars_unset(OTEL_VARS, || {
            assert_eq!(OtlpSettings::from_env(), None);
        });

        temp_env::with_var("OTEL_EXPORTER_OTLP_ENDPOINT", Some("  "), || {
            assert_eq!(OtlpSettings::from_env(), None);
        });
    }

    #[test]
    fn settings_from_env() {
        temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_ENDPOINT", Some("collector.internal:4317/")),
                (
                    "OTEL_EXPORTER_OTLP_HEADERS",
                    Some("Authorization = Bearer abc, x-tenant=credstore"),
                ),
                ("OTEL_EXPORTER_OTLP_TIMEOUT", Some("1500")),
                ("OTEL_SERVICE_INSTANCE_ID", Some("node-1")),
            ],
            || {
                let settings = OtlpSettings::from_env().unwrap();

                assert_eq!(settings.endpoint, "https://collector.internal:4317");
                assert_eq!(settings.timeout, Duration::from_millis(1500));
                assert_eq!(settings.instance_id, "node-1");
                assert_eq!(settings.tls_domain(), Some("collector.internal"));

                let metadata = settings.metadata().unwrap();
                assert_eq!(metadata.len(), 2);
                assert_eq!(
                    metadata.get("authorization").unwrap().to_str().unwrap(),
                    "Bearer abc"
                );
            },
        );
    }

    #[test]
    fn plain_http_endpoint_skips_tls() {
        temp_env::with_vars(
            [
                ("OTEL_EXPORTER_OTLP_ENDPOINT", Some("http://localhost:4317")),
                ("OTEL_EXPORTER_OTLP_HEADERS", None),
                ("OTEL_EXPORTER_OTLP_TIMEOUT", Some("soon")),
                ("OTEL_SERVICE_INSTANCE_ID", None),
            ],
            || {
                let settings = OtlpSettings::from_env().unwrap();

                assert_eq!(settings.endpoint, "http://localhost:4317");
                assert_eq!(settings.tls_domain(), None);
                assert_eq!(settings.timeout, DEFAULT_EXPORT_TIMEOUT);
                assert!(settings.headers.is_empty());
                assert!(!settings.instance_id.is_empty());
            },
        );
    }

    #[test]
    fn header_pairs_skip_malformed() {
        assert!(parse_header_pairs("").is_empty());
        assert_eq!(
            parse_header_pairs("a=1,broken,=orphan, b = 2 "),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let settings = OtlpSettings {
            endpoint: "http://localhost:4317".to_string(),
            headers: vec![("x-token".to_string(), "line\nbreak".to_string())],
            timeout: DEFAULT_EXPORT_TIMEOUT,
            instance_id: "test".to_string(),
        };

        assert!(settings.metadata().is_err());
    }

    #[test]
    fn shutdown_without_export_is_noop() {
        shutdown_tracer();
    }
}
