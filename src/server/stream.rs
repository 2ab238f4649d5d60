//! Bidirectional stream serving.
//!
//! One task decodes requests off the read half sequentially; every decoded
//! request runs on its own worker task, so a slow call never blocks the
//! ones behind it. Responses go out in completion order - clients
//! correlate by id - and each response is a single write, so framing
//! adapters (e.g. a websocket bridge) see one message per response.
//!
//! On EOF the loop stops decoding and waits for every outstanding worker
//! before returning. A failed write cancels the per-connection context:
//! in-flight handlers can observe it, and later sends become no-ops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::codec::{decode_error, Encoder, FrameDecoder};
use crate::error::RpcError;
use crate::handler::CallContext;
use crate::protocol::{Request, RequestId, Response};

use super::Server;

/// Read buffer size for the decode loop.
const READ_BUFFER_SIZE: usize = 64 * 1024;

impl Server {
    /// Serve JSON-RPC over any bidirectional byte stream.
    ///
    /// Returns after the read side reaches EOF (or the stream turns out to
    /// be garbage) and all outstanding calls have finished. The supplied
    /// context is the caller's handle on the connection: cancelling it is
    /// visible to handlers, and handlers see it cancelled when a write
    /// fails. A stuck handler stalls the final drain; the core imposes no
    /// timeout on user code.
    pub async fn serve_conn<S>(&self, cx: CallContext, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        // Child context: write failures cancel this connection without
        // touching the caller's token.
        let cx = cx.child();
        let (mut reader, write_half) = tokio::io::split(stream);
        let writer = Arc::new(WritePath::new(write_half));

        let mut decoder = FrameDecoder::new();
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let mut workers: Vec<JoinHandle<()>> = Vec::new();

        'serve: loop {
            // Drain every complete request already buffered.
            loop {
                match decoder.try_next::<Request>() {
                    Ok(Some(request)) => workers.push(self.spawn_call(request, &cx, &writer)),
                    Ok(None) => break,
                    Err(err) => {
                        // The broken input may have been a notification the
                        // client expects no response for; send best effort.
                        let response =
                            Response::error(RequestId::default(), decode_error(&err));
                        send(&writer, self.encoder().as_ref(), &cx, &response).await;
                        break 'serve;
                    }
                }
            }

            match reader.read(&mut buf).await {
                Ok(0) => {
                    loop {
                        match decoder.finish::<Request>() {
                            Ok(Some(request)) => {
                                workers.push(self.spawn_call(request, &cx, &writer))
                            }
                            Ok(None) => break,
                            Err(err) => {
                                let response =
                                    Response::error(RequestId::default(), decode_error(&err));
                                send(&writer, self.encoder().as_ref(), &cx, &response).await;
                                break;
                            }
                        }
                    }
                    break 'serve;
                }
                Ok(n) => decoder.extend(&buf[..n]),
                Err(err) => {
                    let response = Response::error(
                        RequestId::default(),
                        RpcError::invalid_request(err.to_string()),
                    );
                    send(&writer, self.encoder().as_ref(), &cx, &response).await;
                    break 'serve;
                }
            }
        }

        // Graceful drain: notifications and slow calls alike finish on
        // their own schedule.
        for worker in workers {
            if worker.await.is_err() {
                tracing::error!("worker task panicked");
            }
        }
    }

    fn spawn_call<W>(
        &self,
        request: Request,
        cx: &CallContext,
        writer: &Arc<WritePath<W>>,
    ) -> JoinHandle<()>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let framed = self.frame(request);
        let encoder = self.encoder().clone();
        let cx = cx.clone();
        let writer = writer.clone();

        tokio::spawn(async move {
            let notification = framed.notification;
            let response = framed.run(cx.clone()).await;
            if notification {
                return;
            }
            send(&writer, encoder.as_ref(), &cx, &response).await;
        })
    }
}

/// Serialized write side of a connection.
///
/// The mutex gives each response an atomic write; the flag marks the
/// stream dead after the first failure so later sends become no-ops
/// instead of hammering a broken transport.
struct WritePath<W> {
    writer: Mutex<W>,
    broken: AtomicBool,
}

impl<W> WritePath<W> {
    fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            broken: AtomicBool::new(false),
        }
    }
}

/// Encode into a buffer, then write the buffer in one call under the
/// writer lock. The first write failure marks the path broken and cancels
/// the connection context so in-flight handlers can observe it.
async fn send<W: AsyncWrite + Unpin>(
    path: &WritePath<W>,
    encoder: &dyn Encoder,
    cx: &CallContext,
    response: &Response,
) {
    let mut buf = Vec::new();
    if let Err(err) = encoder.encode(response, &mut buf) {
        tracing::error!("response encode failed: {err}");
        cx.cancel();
        return;
    }

    let mut writer = path.writer.lock().await;
    if path.broken.load(Ordering::Acquire) {
        return;
    }
    let outcome = match writer.write_all(&buf).await {
        Ok(()) => writer.flush().await,
        Err(err) => Err(err),
    };
    if let Err(err) = outcome {
        tracing::debug!("write failed, cancelling connection: {err}");
        path.broken.store(true, Ordering::Release);
        cx.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tokio::io::duplex;

    fn collect_responses(bytes: Vec<u8>) -> Vec<Value> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    async fn run_conn(server: Server, input: &str) -> Vec<Value> {
        let (mut client, transport) = duplex(READ_BUFFER_SIZE);
        let server = Arc::new(server);

        let serving = {
            let server = server.clone();
            tokio::spawn(async move { server.serve_conn(CallContext::new(), transport).await })
        };

        client.write_all(input.as_bytes()).await.unwrap();
        client.shutdown().await.unwrap();

        let mut output = Vec::new();
        client.read_to_end(&mut output).await.unwrap();
        serving.await.unwrap();

        collect_responses(output)
    }

    fn echo_server() -> Server {
        let mut server = Server::new();
        server.register("echo", |s: String| async move { s });
        server
    }

    #[tokio::test]
    async fn test_round_trip() {
        let responses = run_conn(
            echo_server(),
            r#"{"jsonrpc":"2.0","id":1,"method":"echo","params":"a"}"#,
        )
        .await;

        assert_eq!(responses, vec![json!({"jsonrpc":"2.0","id":1,"result":"a"})]);
    }

    #[tokio::test]
    async fn test_multiple_requests_one_buffer() {
        let input = r#"{"jsonrpc":"2.0","id":1,"method":"echo","params":"a"}
{"jsonrpc":"2.0","id":2,"method":"echo","params":"b"}"#;
        let mut responses = run_conn(echo_server(), input).await;

        responses.sort_by_key(|v| v["id"].as_i64());
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["result"], json!("a"));
        assert_eq!(responses[1]["result"], json!("b"));
    }

    #[tokio::test]
    async fn test_notifications_are_silent() {
        let input = r#"{"jsonrpc":"2.0","method":"echo","params":"quiet"}
{"jsonrpc":"2.0","id":9,"method":"echo","params":"loud"}"#;
        let responses = run_conn(echo_server(), input).await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], json!(9));
    }

    #[tokio::test]
    async fn test_parse_error_terminates_connection() {
        let responses = run_conn(echo_server(), "{oops").await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], json!(-32700));
        assert_eq!(responses[0]["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_method_on_stream() {
        let responses = run_conn(
            echo_server(),
            r#"{"jsonrpc":"2.0","id":null,"method":"missing"}"#,
        )
        .await;

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["error"]["code"], json!(-32601));
        assert_eq!(responses[0]["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_handler_observes_write_failure_cancellation() {
        let mut server = Server::new();
        server.register("wait", |cx: CallContext| async move {
            cx.cancelled().await;
            "cancelled"
        });
        // Response larger than the duplex buffer: its write cannot finish
        // against a gone client, so it fails regardless of timing.
        server.register("boom", || async { "x".repeat(1024) });

        let (mut client, transport) = duplex(64);
        let server = Arc::new(server);
        let serving = {
            let server = server.clone();
            tokio::spawn(async move { server.serve_conn(CallContext::new(), transport).await })
        };

        // First call parks on cancellation; the second completes and its
        // response write fails because the client is gone.
        client
            .write_all(
                concat!(
                    r#"{"jsonrpc":"2.0","id":1,"method":"wait"}"#,
                    "\n",
                    r#"{"jsonrpc":"2.0","id":2,"method":"boom"}"#,
                    "\n",
                )
                .as_bytes(),
            )
            .await
            .unwrap();
        drop(client);

        // The connection drains: the failed write cancels the context,
        // releasing the parked handler.
        serving.await.unwrap();
    }
}
