//! Observability MCP Server
//!
//! Exposes local observability backends to AI agents via the MCP protocol
//! over stdio (Content-Length framing).
//!
//! ## Tools
//!
//! - `query_logs` - Run a LogsQL query against local VictoriaLogs
//! - `query_metrics` - Run a PromQL/MetricsQL query against local VictoriaMetrics
//! - `query_traces` - Run a trace query against local VictoriaTraces
//!
//! Backend base URLs default to the local harness ports and can be
//! overridden with `OBS_LOGS_URL`, `OBS_METRICS_URL`, `OBS_TRACES_URL`.

use anyhow::Result;

mod dispatch;
mod framing;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    // Configure logging to stderr only (stdout is for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Starting observability MCP server");

    let backends = tools::Backends::from_env();
    dispatch::serve(tokio::io::stdin(), tokio::io::stdout(), backends).await?;

    log::info!("Observability MCP server stopped");
    Ok(())
}
