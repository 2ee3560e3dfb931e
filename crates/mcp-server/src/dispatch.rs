//! Request dispatcher and server reactor.
//!
//! One task reads the input stream and decodes frames strictly
//! sequentially; each decoded call is dispatched onto its own task so slow
//! backends never stall decoding. Responses are funneled through a single
//! writer task, so every response lands on the stream as one complete,
//! non-interleaved frame, in the order results become available.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::framing::{encode_frame, FrameDecoder};
use crate::tools::{self, Backends, REGISTRY};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "observability-mcp-server";
const ERROR_CODE: i64 = -32000;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

fn result_response(id: &Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: &Value, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": ERROR_CODE, "message": message },
    })
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
    })
}

async fn handle_request(request: &Request, backends: &Backends) -> Result<Value> {
    match request.method.as_str() {
        "initialize" => {
            log::info!("initialize from client: {:?}", request.params);
            Ok(initialize_result())
        }
        "tools/list" => Ok(json!({ "tools": &*REGISTRY })),
        // A client that (incorrectly) sends this as a call still gets an
        // acknowledgement rather than an unsupported-method error.
        "notifications/initialized" => Ok(Value::Null),
        "tools/call" => {
            let params: CallParams =
                serde_json::from_value(request.params.clone().unwrap_or_else(|| json!({})))
                    .context("invalid tools/call params")?;
            let text = tools::call(backends, &params.name, &params.arguments).await?;
            Ok(json!({ "content": [{ "type": "text", "text": text }] }))
        }
        other => anyhow::bail!("Unsupported method: {other}"),
    }
}

async fn send_response(tx: &mpsc::Sender<Vec<u8>>, response: Value) {
    match encode_frame(&response) {
        Ok(frame) => {
            if tx.send(frame).await.is_err() {
                log::error!("response dropped: writer task is gone");
            }
        }
        Err(err) => log::error!("failed to encode response frame: {err}"),
    }
}

/// Routes one decoded message. Calls (id present) are answered exactly once,
/// whatever the outcome; notifications are never answered. Every spawned
/// handler lands in `pending`, so the reactor can drain in-flight calls.
fn dispatch_message(
    message: Value,
    backends: &Backends,
    tx: &mpsc::Sender<Vec<u8>>,
    pending: &mut JoinSet<()>,
) {
    let request = match serde_json::from_value::<Request>(message.clone()) {
        Ok(request) => request,
        Err(err) => {
            // A shape mismatch must not crash the dispatcher; a call still
            // owes its caller exactly one response.
            log::warn!("undecodable message: {err}");
            if let Some(id) = message.get("id").filter(|id| !id.is_null()).cloned() {
                let tx = tx.clone();
                pending.spawn(async move {
                    send_response(&tx, error_response(&id, &format!("Invalid request: {err}")))
                        .await;
                });
            }
            return;
        }
    };

    let Some(id) = request.id.clone().filter(|id| !id.is_null()) else {
        log::debug!("notification: {}", request.method);
        return;
    };

    let backends = backends.clone();
    let tx = tx.clone();
    pending.spawn(async move {
        let response = match handle_request(&request, &backends).await {
            Ok(result) => result_response(&id, result),
            Err(err) => {
                log::warn!("request {id} ({}) failed: {err:#}", request.method);
                error_response(&id, &format!("{err:#}"))
            }
        };
        send_response(&tx, response).await;
    });
}

async fn run_write_loop<W: AsyncWrite + Unpin>(mut write: W, mut rx: mpsc::Receiver<Vec<u8>>) {
    while let Some(frame) = rx.recv().await {
        let result = async {
            write.write_all(&frame).await?;
            write.flush().await
        }
        .await;
        if let Err(err) = result {
            log::error!("failed to write response frame: {err}");
            break;
        }
    }
}

/// Serves one stream session: reads until EOF or an unrecoverable frame
/// error, then drains in-flight responses before returning.
pub async fn serve<R, W>(mut read: R, write: W, backends: Backends) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Vec<u8>>(16);
    let writer = tokio::spawn(run_write_loop(write, rx));
    let mut pending = JoinSet::new();

    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 8 * 1024];
    'session: loop {
        let n = read.read(&mut chunk).await.context("read input stream")?;
        if n == 0 {
            break;
        }
        decoder.extend(&chunk[..n]);

        loop {
            match decoder.next_frame() {
                Ok(Some(message)) => dispatch_message(message, &backends, &tx, &mut pending),
                Ok(None) => break,
                Err(err) => {
                    // No further frames can be reliably located; the session
                    // is unusable past this point.
                    log::error!("fatal frame error, closing session: {err}");
                    break 'session;
                }
            }
        }

        // Reap handlers that already finished so the set stays bounded.
        while pending.try_join_next().is_some() {}
    }

    // Once dispatched, a call runs to completion even after the input ends.
    while pending.join_next().await.is_some() {}
    drop(tx);
    writer.await.context("join writer task")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tokio::io::AsyncWriteExt;

    /// Feeds raw bytes to a server session and returns its responses keyed
    /// by id. Responses may complete out of order, so order is not asserted.
    async fn run_session(input: Vec<u8>) -> HashMap<String, Value> {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server);
        let (mut client_read, mut client_write) = tokio::io::split(client);

        let session = tokio::spawn(serve(server_read, server_write, Backends::from_env()));

        client_write.write_all(&input).await.expect("write input");
        client_write.shutdown().await.expect("shutdown input");

        let mut bytes = Vec::new();
        client_read
            .read_to_end(&mut bytes)
            .await
            .expect("read responses");
        session.await.expect("join session").expect("serve");

        let mut decoder = FrameDecoder::new();
        decoder.extend(&bytes);
        let mut responses = HashMap::new();
        while let Some(message) = decoder.next_frame().expect("decode response") {
            let id = message.get("id").expect("response id").to_string();
            assert!(
                responses.insert(id, message).is_none(),
                "duplicate response for one id"
            );
        }
        responses
    }

    fn frames(messages: &[Value]) -> Vec<u8> {
        let mut out = Vec::new();
        for message in messages {
            out.extend(encode_frame(message).expect("encode"));
        }
        out
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let responses = run_session(frames(&[json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": { "protocolVersion": "2024-11-05", "clientInfo": { "name": "t" } }
        })]))
        .await;

        let result = &responses["1"]["result"];
        assert_eq!(result["serverInfo"]["name"], "observability-mcp-server");
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tools_list_returns_the_registry() {
        let responses = run_session(frames(&[
            json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
        ]))
        .await;

        let tools = responses["1"]["result"]["tools"].as_array().unwrap();
        let mut names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        names.sort_unstable();
        assert_eq!(names, ["query_logs", "query_metrics", "query_traces"]);
        for tool in tools {
            assert!(tool["description"].is_string());
            assert!(tool["inputSchema"].is_object());
        }
    }

    #[tokio::test]
    async fn unknown_tool_errors_without_poisoning_the_session() {
        let responses = run_session(frames(&[
            json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                    "params": { "name": "no_such_tool", "arguments": {} } }),
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
        ]))
        .await;

        assert_eq!(responses.len(), 2);
        let error = &responses["1"]["error"];
        assert_eq!(error["code"], ERROR_CODE);
        assert!(error["message"].as_str().unwrap().contains("no_such_tool"));
        assert!(responses["2"]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn unknown_method_errors_per_request() {
        let responses = run_session(frames(&[
            json!({ "jsonrpc": "2.0", "id": 9, "method": "resources/list" }),
        ]))
        .await;

        let message = responses["9"]["error"]["message"].as_str().unwrap();
        assert!(message.contains("Unsupported method: resources/list"));
    }

    #[tokio::test]
    async fn notifications_are_never_answered() {
        let responses = run_session(frames(&[
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
            json!({ "jsonrpc": "2.0", "method": "resources/list" }),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" }),
        ]))
        .await;

        assert_eq!(responses.len(), 1);
        assert!(responses.contains_key("1"));
    }

    #[tokio::test]
    async fn initialized_sent_as_a_call_is_acknowledged_with_null() {
        let responses = run_session(frames(&[
            json!({ "jsonrpc": "2.0", "id": 7, "method": "notifications/initialized" }),
        ]))
        .await;

        let response = responses["7"].as_object().unwrap();
        assert!(response.contains_key("result"));
        assert_eq!(response["result"], Value::Null);
        assert!(!response.contains_key("error"));
    }

    #[tokio::test]
    async fn tools_call_is_served_without_prior_initialize() {
        // No handshake ordering: tools/call is independently dispatchable.
        let responses = run_session(frames(&[
            json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                    "params": { "name": "not_registered", "arguments": {} } }),
        ]))
        .await;

        assert!(responses["1"].get("error").is_some());
    }

    #[tokio::test]
    async fn malformed_call_params_get_an_error_response() {
        let responses = run_session(frames(&[
            json!({ "jsonrpc": "2.0", "id": 4, "method": "tools/call",
                    "params": { "arguments": {} } }),
        ]))
        .await;

        let message = responses["4"]["error"]["message"].as_str().unwrap();
        assert!(message.contains("invalid tools/call params"));
    }

    #[tokio::test]
    async fn call_with_non_request_shape_still_gets_one_response() {
        let responses = run_session(frames(&[
            json!({ "jsonrpc": "2.0", "id": 5, "params": {} }),
        ]))
        .await;

        let message = responses["5"]["error"]["message"].as_str().unwrap();
        assert!(message.contains("Invalid request"));
    }

    #[tokio::test]
    async fn frame_error_ends_the_session_after_in_flight_work() {
        let mut input = frames(&[json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" })]);
        input.extend_from_slice(b"Content-Type: text/plain\r\n\r\n");
        input.extend(frames(&[
            json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
        ]));

        let responses = run_session(input).await;
        assert_eq!(responses.len(), 1);
        assert!(responses.contains_key("1"));
    }
}
