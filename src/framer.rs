//! The outbound half of a session: a dedicated task that serializes [`OutboundFrame`]s onto
//! the WebSocket sink, batching as many as are already queued before each flush. Grounded on
//! `src/client/replier.rs`'s `Replier`, which does the same drain-then-flush dance for RESP
//! replies and reports failure via a oneshot rather than propagating an error nobody awaits.

use futures_util::{Sink, SinkExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::response::OutboundFrame;

pub struct Framer<S> {
    sink: S,
    frame_receiver: mpsc::UnboundedReceiver<OutboundFrame>,
    quit_sender: Option<oneshot::Sender<()>>,
}

impl<S> Framer<S>
where
    S: Sink<WsMessage, Error = WsError> + Unpin + Send + 'static,
{
    /// Spawn the framer and return the sender handlers post frames to. `quit_sender` fires
    /// once, the moment a write fails, so the read loop can tear the session down.
    pub fn spawn(sink: S, quit_sender: oneshot::Sender<()>) -> mpsc::UnboundedSender<OutboundFrame> {
        let (frame_sender, frame_receiver) = mpsc::unbounded_channel();
        let framer = Framer {
            sink,
            frame_receiver,
            quit_sender: Some(quit_sender),
        };
        crate::spawn::spawn(framer.listen());
        frame_sender
    }

    async fn listen(mut self) {
        if self.listen_inner().await.is_err() {
            if let Some(quit) = self.quit_sender.take() {
                _ = quit.send(());
            }
        }
    }

    async fn listen_inner(&mut self) -> Result<(), WsError> {
        while let Some(frame) = self.frame_receiver.recv().await {
            self.write(frame).await?;

            // Drain anything already queued before paying for a flush.
            while let Ok(frame) = self.frame_receiver.try_recv() {
                self.write(frame).await?;
            }

            self.sink.flush().await?;
        }
        Ok(())
    }

    async fn write(&mut self, frame: OutboundFrame) -> Result<(), WsError> {
        let message = match frame {
            OutboundFrame::Text(text) => WsMessage::Text(text.into()),
            OutboundFrame::Binary(bytes) => WsMessage::Binary(bytes.into()),
        };
        self.sink.send(message).await
    }
}
