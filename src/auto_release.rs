//! Auto-Release Timer (§4.3): a periodic sweep of expired messages, running only while a
//! session has auto-commit enabled. Created on successful first subscribe, stopped on
//! session close by dropping its [`TaskHandle`].

use std::time::Duration;

use triomphe::Arc;
use web_time::Instant;

use crate::message_buffer::MessageBuffer;
use crate::spawn::{spawn_with_handle, TaskHandle};
use crate::worker::Worker;

const TICK: Duration = Duration::from_millis(100);

/// Start the sweep loop for one session. The returned handle aborts the loop on drop.
pub fn start(buffer: Arc<MessageBuffer>, worker: Arc<Worker>) -> TaskHandle<()> {
    spawn_with_handle(async move {
        let mut ticker = tokio::time::interval(TICK);
        loop {
            ticker.tick().await;
            let freed = buffer.sweep_expired(Instant::now()).await;
            for handle in freed {
                if let Err(error) = worker.free_result(handle).await {
                    tracing::warn!(?handle, ?error, "failed to free auto-released result");
                }
            }
        }
    })
}
