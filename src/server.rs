//! Session entry point (§2 component 8): accepts an already-upgraded WebSocket stream,
//! splits it into read/write halves, and spawns one session task per connection. Performing
//! the HTTP upgrade itself is an external collaborator's job (§1) — the caller owns the
//! `TcpListener`/`accept_async` (or an HTTP framework's upgrade path) and hands the resulting
//! stream to [`Gateway::connect`], mirroring the teacher's `Server::connect` → `Client::spawn`
//! shape exactly: a thin struct that owns shared config/factory state and spawns one task per
//! accepted stream, nothing more.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use triomphe::Arc;

use crate::config::GatewayConfig;
use crate::dispatcher;
use crate::framer::Framer;
use crate::native::NativeConsumerFactory;
use crate::session::{Session, SessionId};

/// Holds the state every session needs (config, native-consumer factory, ID allocator) and
/// spawns one session task per connected stream.
pub struct Gateway {
    config: Arc<GatewayConfig>,
    factory: Arc<dyn NativeConsumerFactory>,
    next_session_id: AtomicU64,
}

impl Gateway {
    pub fn new(config: GatewayConfig, factory: Arc<dyn NativeConsumerFactory>) -> Self {
        Gateway {
            config: Arc::new(config),
            factory,
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Spawn a session for an already-upgraded WebSocket stream.
    pub fn connect<S>(self: &Arc<Self>, ws_stream: WebSocketStream<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let gateway = self.clone();
        crate::spawn::spawn(async move { gateway.serve(ws_stream).await });
    }

    async fn serve<S>(self: Arc<Self>, ws_stream: WebSocketStream<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let id = SessionId(self.next_session_id.fetch_add(1, Ordering::Relaxed));
        let (sink, mut stream) = ws_stream.split();
        let (quit_sender, mut quit_receiver) = tokio::sync::oneshot::channel();
        let outbound = Framer::spawn(sink, quit_sender);
        let mut session = Session::new(id, self.config.clone(), self.factory.clone(), outbound);

        tracing::debug!(session = %id, "session opened");
        loop {
            tokio::select! {
                biased;
                _ = &mut quit_receiver => break,
                message = stream.next() => {
                    match message {
                        Some(Ok(WsMessage::Text(text))) => dispatcher::dispatch(&mut session, &text).await,
                        Some(Ok(WsMessage::Close(_))) | None => break,
                        Some(Ok(_)) => {
                            // Binary/ping/pong frames carry no client→server protocol meaning (§6.1).
                        }
                        Some(Err(error)) => {
                            tracing::warn!(session = %id, %error, "websocket read error");
                            break;
                        }
                    }
                }
            }
        }

        session.shutdown().await;
        tracing::debug!(session = %id, "session closed");
    }
}
