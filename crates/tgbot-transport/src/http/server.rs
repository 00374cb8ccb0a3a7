//! `axum` listener for the webhook protocol.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body as AxumBody, Bytes};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use tgbot_core::{Body, Context};
use tgbot_framework::{SECRET_HEADER, Webhook, WebhookResponse};

use crate::error::{TransportError, TransportResult};

struct ServerState {
    webhook: Webhook,
    ctx: Context,
}

/// A bound webhook listener.
///
/// Every request on `path` goes through [`Webhook::handle`]; other paths get
/// a 404.
pub struct WebhookServer {
    listener: TcpListener,
    path: String,
    state: Arc<ServerState>,
}

impl WebhookServer {
    /// Binds `addr` and prepares to serve `webhook` on `path`.
    pub async fn bind(addr: &str, path: &str, webhook: Webhook, ctx: Context) -> TransportResult<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Ok(Self {
            listener,
            path,
            state: Arc::new(ServerState { webhook, ctx }),
        })
    }

    pub fn local_addr(&self) -> TransportResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until `shutdown` is cancelled, then drains open requests.
    pub async fn serve(self, shutdown: CancellationToken) -> TransportResult<()> {
        let addr = self.local_addr()?;
        let router = Router::new()
            .route(&self.path, any(webhook_handler))
            .with_state(self.state);

        info!(addr = %addr, path = %self.path, "webhook server listening");
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await?;
        info!(addr = %addr, "webhook server stopped");
        Ok(())
    }
}

async fn webhook_handler(
    State(state): State<Arc<ServerState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    trace!(method = %method, len = body.len(), "webhook request");
    let secret = headers.get(SECRET_HEADER).and_then(|value| value.to_str().ok());
    let response = state
        .webhook
        .handle(&state.ctx, method.as_str(), secret, &body)
        .await;
    debug!(status = response.status, "webhook response");
    into_response(response)
}

fn into_response(response: WebhookResponse) -> Response {
    let WebhookResponse {
        status,
        content_type,
        body,
    } = response;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match body {
        Body::Full(bytes) => AxumBody::from(bytes),
        Body::Stream(stream) => AxumBody::from_stream(stream),
    };
    match content_type {
        Some(content_type) => (status, [(CONTENT_TYPE, content_type)], body).into_response(),
        None => (status, body).into_response(),
    }
}
