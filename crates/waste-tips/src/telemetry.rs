use crate::config::TelemetryConfig;
use serde_json::{Map, Value};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

/// Request header Cloud Run sets on every incoming request.
pub const CLOUD_TRACE_HEADER: &str = "x-cloud-trace-context";

const TRACE_KEY: &str = "logging.googleapis.com/trace";
const SPAN_ID_KEY: &str = "logging.googleapis.com/spanId";

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    if config.gcp_enabled {
        let subscriber = cloud_logging_subscriber(env_filter, &config.project_id, std::io::stdout);
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|err| TelemetryError::Subscriber(Box::new(err)))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .with_ansi(false)
            .try_init()
            .map_err(TelemetryError::Subscriber)
    }
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            })
        }
    }
}

/// Subscriber writing one Cloud Logging structured entry per line.
pub(crate) fn cloud_logging_subscriber<W>(
    env_filter: EnvFilter,
    project_id: &str,
    writer: W,
) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(env_filter)
        .with(SpanFieldRecorder)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(CloudLoggingFormat::new(project_id))
                .with_writer(writer),
        )
}

/// Trace and span ids taken from `X-Cloud-Trace-Context: TRACE_ID/SPAN_ID;o=OPTIONS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudTraceContext {
    pub trace_id: String,
    pub span_id: Option<String>,
}

pub fn parse_cloud_trace_context(value: &str) -> Option<CloudTraceContext> {
    let ids = value.split(';').next().unwrap_or_default().trim();
    let (trace_id, span_id) = match ids.split_once('/') {
        Some((trace_id, span_id)) => (trace_id, Some(span_id)),
        None => (ids, None),
    };

    if trace_id.len() != 32 || !trace_id.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    let span_id = span_id
        .filter(|id| !id.is_empty() && id.bytes().all(|byte| byte.is_ascii_digit()))
        .map(str::to_owned);

    Some(CloudTraceContext {
        trace_id: trace_id.to_string(),
        span_id,
    })
}

fn severity(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        _ => "DEBUG",
    }
}

struct JsonVisitor<'a>(&'a mut Map<String, Value>);

impl Visit for JsonVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.0
            .insert(field.name().to_string(), Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0
            .insert(field.name().to_string(), Value::from(format!("{value:?}")));
    }
}

/// Span fields kept in the span's extensions so events can read them.
struct SpanFields(Map<String, Value>);

struct SpanFieldRecorder;

impl<S> Layer<S> for SpanFieldRecorder
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = Map::new();
        attrs.record(&mut JsonVisitor(&mut fields));
        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(SpanFields(fields)) = extensions.get_mut::<SpanFields>() {
            values.record(&mut JsonVisitor(fields));
        }
    }
}

struct CloudLoggingFormat {
    project_id: String,
}

impl CloudLoggingFormat {
    fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for CloudLoggingFormat
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
        let mut entry = Map::new();

        // Outer spans first so inner spans override shared keys.
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                if let Some(SpanFields(fields)) = span.extensions().get::<SpanFields>() {
                    entry.extend(fields.iter().map(|(key, value)| (key.clone(), value.clone())));
                }
            }
        }

        if let Some(Value::String(trace_id)) = entry.remove("trace_id") {
            entry.insert(
                TRACE_KEY.to_string(),
                Value::from(format!("projects/{}/traces/{trace_id}", self.project_id)),
            );
        }
        if let Some(span_id) = entry.remove("span_id") {
            entry.insert(SPAN_ID_KEY.to_string(), span_id);
        }

        event.record(&mut JsonVisitor(&mut entry));

        let metadata = event.metadata();
        entry.insert("severity".to_string(), Value::from(severity(metadata.level())));
        entry.insert("target".to_string(), Value::from(metadata.target()));

        let mut time = String::new();
        if SystemTime.format_time(&mut Writer::new(&mut time)).is_ok() {
            entry.insert("time".to_string(), Value::from(time));
        }

        let line = serde_json::to_string(&entry).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}
