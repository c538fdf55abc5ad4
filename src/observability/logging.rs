//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Bridge spans into the OpenTelemetry trace pipeline
//! - Stamp every log line emitted inside a traced call with its trace and
//!   span identifiers
//!
//! # Design Decisions
//! - Log level from `RUST_LOG`, falling back to the configured filter
//! - Correlation ids are read from the OpenTelemetry data that
//!   `tracing-opentelemetry` stores on each span, so no extra bookkeeping
//!   is needed per request

use std::fmt;

use opentelemetry::trace::{SpanId, TraceContextExt, TraceId};
use tracing::{Event, Subscriber};
use tracing_opentelemetry::OtelData;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::observability::telemetry::{Telemetry, TelemetryError};

/// Install the global subscriber: env filter, correlated fmt output and
/// the OpenTelemetry span bridge.
///
/// Fails if a global subscriber is already installed.
pub fn init(telemetry: &Telemetry, default_filter: &str) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().event_format(CorrelatedFormat::default()))
        .with(tracing_opentelemetry::layer().with_tracer(telemetry.tracer()))
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

/// Event formatter that prefixes `trace_id=… span_id=…` when the event
/// happens inside an OpenTelemetry-backed span.
#[derive(Debug, Default)]
pub struct CorrelatedFormat {
    inner: format::Format,
}

impl<S, N> FormatEvent<S, N> for CorrelatedFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        if let Some((trace_id, span_id)) = current_ids(ctx) {
            write!(writer, "trace_id={} span_id={} ", trace_id, span_id)?;
        }
        self.inner.format_event(ctx, writer, event)
    }
}

fn current_ids<S, N>(ctx: &FmtContext<'_, S, N>) -> Option<(TraceId, SpanId)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    let span = ctx.lookup_current()?;
    let extensions = span.extensions();
    let otel = extensions.get::<OtelData>()?;

    let span_id = otel.builder.span_id?;
    let trace_id = otel
        .builder
        .trace_id
        .unwrap_or_else(|| otel.parent_cx.span().span_context().trace_id());

    if trace_id == TraceId::INVALID {
        return None;
    }
    Some((trace_id, span_id))
}
