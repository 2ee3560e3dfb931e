//! Tool registry and handlers.
//!
//! Three query tools, each forwarding to one of the local observability
//! backends with a single form-encoded POST and returning the raw response
//! body as text. The registry is process-wide read-only state, built once.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

const DEFAULT_LOGS_URL: &str = "http://127.0.0.1:9428";
const DEFAULT_METRICS_URL: &str = "http://127.0.0.1:8428";
const DEFAULT_TRACES_URL: &str = "http://127.0.0.1:10428";

const DEFAULT_LIMIT: &str = "20";

/// Non-success response from a query backend. The body is carried verbatim
/// as diagnostic text; there is no retry.
#[derive(Error, Debug)]
#[error("HTTP {status} from {url}: {body}")]
pub struct BackendError {
    pub status: reqwest::StatusCode,
    pub url: String,
    pub body: String,
}

/// Backend base URLs plus the shared HTTP client.
#[derive(Clone, Debug)]
pub struct Backends {
    pub logs_url: String,
    pub metrics_url: String,
    pub traces_url: String,
    client: reqwest::Client,
}

fn env_url(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Backends {
    pub fn from_env() -> Self {
        Self {
            logs_url: env_url("OBS_LOGS_URL", DEFAULT_LOGS_URL),
            metrics_url: env_url("OBS_METRICS_URL", DEFAULT_METRICS_URL),
            traces_url: env_url("OBS_TRACES_URL", DEFAULT_TRACES_URL),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub static REGISTRY: Lazy<Vec<ToolSpec>> = Lazy::new(|| {
    vec![
        ToolSpec {
            name: "query_logs",
            description: "Run a LogsQL query against local VictoriaLogs.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "limit": { "type": "number", "minimum": 1, "maximum": 500 },
                },
                "required": ["query"],
            }),
        },
        ToolSpec {
            name: "query_metrics",
            description: "Run a PromQL/MetricsQL query against local VictoriaMetrics.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                },
                "required": ["query"],
            }),
        },
        ToolSpec {
            name: "query_traces",
            description: "Run a trace query against local VictoriaTraces (LogsQL-compatible adapter).",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "limit": { "type": "number", "minimum": 1, "maximum": 500 },
                },
                "required": ["query"],
            }),
        },
    ]
});

/// Basic argument coercion only: scalars are stringified, everything else is
/// rejected. Strict schema enforcement is not a goal here.
fn string_arg(arguments: &Map<String, Value>, key: &str) -> Result<String> {
    match arguments.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(other) => anyhow::bail!("argument {key:?} must be a scalar, got {other}"),
        None => anyhow::bail!("missing required argument: {key}"),
    }
}

fn limit_arg(arguments: &Map<String, Value>) -> String {
    match arguments.get("limit") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => DEFAULT_LIMIT.to_string(),
    }
}

async fn post_form(backends: &Backends, url: String, params: Vec<(&str, String)>) -> Result<String> {
    let response = backends
        .client
        .post(&url)
        .form(&params)
        .send()
        .await
        .with_context(|| format!("POST {url}"))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("read response body from {url}"))?;

    if !status.is_success() {
        return Err(BackendError { status, url, body }.into());
    }
    Ok(body)
}

/// Invokes the named tool and returns its textual result.
/// An unknown name is a per-request error, not a registry mutation point.
pub async fn call(
    backends: &Backends,
    name: &str,
    arguments: &Map<String, Value>,
) -> Result<String> {
    match name {
        "query_logs" => {
            let query = string_arg(arguments, "query")?;
            let url = format!("{}/select/logsql/query", backends.logs_url);
            post_form(backends, url, vec![("query", query), ("limit", limit_arg(arguments))]).await
        }
        "query_metrics" => {
            let query = string_arg(arguments, "query")?;
            let url = format!("{}/prometheus/api/v1/query", backends.metrics_url);
            post_form(backends, url, vec![("query", query)]).await
        }
        "query_traces" => {
            let query = string_arg(arguments, "query")?;
            let url = format!("{}/select/logsql/query", backends.traces_url);
            post_form(backends, url, vec![("query", query), ("limit", limit_arg(arguments))]).await
        }
        other => anyhow::bail!("Unknown tool: {other}"),
    }
}
