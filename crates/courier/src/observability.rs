//! Tracing setup for the `courier` binary.
//!
//! Events go to stderr, filtered by `RUST_LOG` when it is set and by
//! [`TracingConfig::default_level`] otherwise. Building with the
//! `observability` feature also exports spans through OpenTelemetry's stdout
//! exporter.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Output settings for [`init_tracing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub default_level: String,
    /// One JSON object per event instead of human-readable lines
    pub json: bool,
}

impl TracingConfig {
    /// Text output at `default_level`.
    pub fn new(default_level: impl Into<String>) -> Self {
        Self {
            default_level: default_level.into(),
            json: false,
        }
    }

    /// Switch between JSON and text output.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// Keeps span export alive; dropping it flushes pending spans.
#[must_use = "dropping the guard stops span export"]
#[derive(Debug, Default)]
pub struct TracingGuard {
    #[cfg(feature = "observability")]
    provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        tracing::debug!("Shutting down tracing");
        #[cfg(feature = "observability")]
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to flush spans: {e}");
            }
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if the filter directive is invalid or a global subscriber is
/// already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<TracingGuard, Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.default_level))?;

    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    let fmt = if config.json { fmt.json().boxed() } else { fmt.boxed() };

    let registry = tracing_subscriber::registry().with(filter).with(fmt);

    #[cfg(not(feature = "observability"))]
    let guard = TracingGuard::default();

    #[cfg(feature = "observability")]
    let (registry, guard) = {
        let provider = otel::provider();
        let registry = registry.with(otel::layer(&provider));
        (registry, TracingGuard { provider: Some(provider) })
    };

    registry.try_init()?;
    Ok(guard)
}

#[cfg(feature = "observability")]
mod otel {
    use opentelemetry::{KeyValue, global, trace::TracerProvider};
    use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
    use opentelemetry_stdout::SpanExporter;
    use tracing_subscriber::registry::LookupSpan;

    const SERVICE: &str = env!("CARGO_PKG_NAME");

    pub(super) fn provider() -> SdkTracerProvider {
        let resource = Resource::builder()
            .with_service_name(SERVICE)
            .with_attributes([KeyValue::new("service.version", env!("CARGO_PKG_VERSION"))])
            .build();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(SpanExporter::default())
            .with_resource(resource)
            .build();
        global::set_tracer_provider(provider.clone());
        provider
    }

    pub(super) fn layer<S>(provider: &SdkTracerProvider) -> impl tracing_subscriber::Layer<S>
    where
        S: tracing::Subscriber + for<'span> LookupSpan<'span>,
    {
        tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE))
    }
}
