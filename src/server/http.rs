//! HTTP adapter - one JSON-RPC transaction per POST.
//!
//! The transport gates are the only places a non-2xx status appears:
//! a missing `application/json` content type is `415`, a non-POST method
//! is `405`. Past the gates, every protocol-level failure (bad JSON,
//! unknown method, wrong arity) is a `200 OK` carrying the JSON-RPC error
//! form, and a notification is a `204` with no body.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method as HttpMethod, Request as HttpRequest, Response as HttpResponse, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::codec::{decode_error, FrameDecoder};
use crate::error::RpcError;
use crate::handler::CallContext;
use crate::protocol::{Request, RequestId, Response};

use super::Server;

impl Server {
    /// Serve one HTTP transaction with a fresh call context.
    pub async fn serve_http<B>(&self, req: HttpRequest<B>) -> HttpResponse<Full<Bytes>>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        self.serve_http_with(CallContext::new(), req).await
    }

    /// Serve one HTTP transaction under a caller-supplied context, e.g. to
    /// expose per-request values to handlers.
    pub async fn serve_http_with<B>(
        &self,
        cx: CallContext,
        req: HttpRequest<B>,
    ) -> HttpResponse<Full<Bytes>>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        if content_type != Some("application/json") {
            return plain(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported Content-Type: must be application/json",
            );
        }
        if req.method() != HttpMethod::POST {
            return plain(
                StatusCode::METHOD_NOT_ALLOWED,
                "Unsupported method: must be POST",
            );
        }

        let body = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                let error = RpcError::invalid_request(err.to_string());
                return self.json_response(&Response::error(RequestId::default(), error));
            }
        };

        let mut decoder = FrameDecoder::new();
        decoder.extend(&body);
        let framed = match decoder.finish::<Request>() {
            Ok(Some(request)) => self.frame(request),
            // Empty body: the decoder hit end of input before any value.
            Ok(None) => {
                let error = RpcError::invalid_request("EOF");
                return self.json_response(&Response::error(RequestId::default(), error));
            }
            Err(err) => {
                return self.json_response(&Response::error(RequestId::default(), decode_error(&err)))
            }
        };

        let notification = framed.notification;
        let response = framed.run(cx).await;
        if notification {
            return empty(StatusCode::NO_CONTENT);
        }
        self.json_response(&response)
    }

    fn json_response(&self, response: &Response) -> HttpResponse<Full<Bytes>> {
        let mut buf = Vec::new();
        if let Err(err) = self.encoder().encode(response, &mut buf) {
            tracing::error!("response encode failed: {err}");
            buf.clear();
        }
        HttpResponse::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(buf)))
            .unwrap()
    }
}

fn plain(status: StatusCode, message: &'static str) -> HttpResponse<Full<Bytes>> {
    HttpResponse::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from_static(message.as_bytes())))
        .unwrap()
}

fn empty(status: StatusCode) -> HttpResponse<Full<Bytes>> {
    HttpResponse::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Accept loop: serve HTTP/1 connections from the listener until it fails.
///
/// Each connection runs on its own task with a shared [`Server`].
pub async fn serve(server: Arc<Server>, listener: TcpListener) -> std::io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        let server = server.clone();

        tokio::spawn(async move {
            let io = TokioIo::new(socket);
            let service = service_fn(move |req| {
                let server = server.clone();
                async move { Ok::<_, Infallible>(server.serve_http(req).await) }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!("http connection error from {peer}: {err}");
            }
        });
    }
}
