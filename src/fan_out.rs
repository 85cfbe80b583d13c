//! Offset Fan-out (§4.13): parallel per-partition native queries with order-preserving
//! reassembly for `committed`/`position`. Grounded on the reference implementation's
//! goroutine-per-partition + channel + `sort.Interface` pattern (every request gets its own
//! index, a success and an error channel are drained after `sync.WaitGroup.Wait`, and results
//! are sorted back into input order); here that becomes `tokio::spawn` per partition plus
//! direct indexing, since the index is already known and doesn't need re-deriving by a sort.

use std::future::Future;

use triomphe::Arc;

use crate::error::{ActionError, NativeError};
use crate::protocol::TopicVgroupId;
use crate::worker::{Worker, WorkerError};

async fn run<F, Fut>(worker: Arc<Worker>, inputs: Vec<TopicVgroupId>, query: F) -> Result<Vec<i64>, ActionError>
where
    F: Fn(Arc<Worker>, TopicVgroupId) -> Fut,
    Fut: Future<Output = Result<i64, WorkerError>> + Send + 'static,
{
    let handles: Vec<_> = inputs
        .into_iter()
        .map(|input| tokio::spawn(query(worker.clone(), input)))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    let mut first_error: Option<NativeError> = None;
    for handle in handles {
        let outcome = match handle.await {
            Ok(Ok(offset)) => Ok(offset),
            Ok(Err(WorkerError::Native(error))) => Err(error),
            Ok(Err(WorkerError::NotInitialized)) => Err(NativeError {
                code: -1,
                message: "tmq not init".to_owned(),
            }),
            Err(_join_error) => Err(NativeError {
                code: -1,
                message: "fan-out task panicked".to_owned(),
            }),
        };
        match outcome {
            Ok(offset) => results.push(offset),
            Err(error) => {
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
    }

    if let Some(error) = first_error {
        return Err(ActionError::FanOut(error));
    }
    Ok(results)
}

/// `committed(topic, vgroup)` for every input, in caller order (§4.13, §6.1).
pub async fn committed(worker: Arc<Worker>, inputs: Vec<TopicVgroupId>) -> Result<Vec<i64>, ActionError> {
    run(worker, inputs, |worker, input| async move {
        worker.committed(input.topic, input.vgroup_id).await
    })
    .await
}

/// `position(topic, vgroup)` for every input, in caller order (§4.13, §6.1).
pub async fn position(worker: Arc<Worker>, inputs: Vec<TopicVgroupId>) -> Result<Vec<i64>, ActionError> {
    run(worker, inputs, |worker, input| async move {
        worker.position(input.topic, input.vgroup_id).await
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::fake::{FakeConsumerFactory, Script};
    use crate::native::ConsumerConfig;

    async fn subscribed_worker() -> Arc<Worker> {
        let worker = Arc::new(Worker::new(Arc::new(FakeConsumerFactory { script: Script::default() })));
        worker.new_consumer(ConsumerConfig::default()).await.unwrap();
        worker.subscribe(vec!["t1".to_owned()]).await.unwrap();
        worker
    }

    fn id(topic: &str, vgroup_id: i32) -> TopicVgroupId {
        TopicVgroupId { topic: topic.to_owned(), vgroup_id }
    }

    #[tokio::test]
    async fn results_preserve_caller_supplied_order() {
        let worker = subscribed_worker().await;
        worker.seek("t1".to_owned(), 2, 50).await.unwrap();
        worker.seek("t1".to_owned(), 1, 10).await.unwrap();
        worker.seek("t1".to_owned(), 0, 90).await.unwrap();

        let inputs = vec![id("t1", 2), id("t1", 1), id("t1", 0)];
        let result = position(worker, inputs).await.unwrap();
        assert_eq!(result, vec![50, 10, 90]);
    }

    #[tokio::test]
    async fn uninitialized_worker_reports_not_init_as_the_error() {
        let worker = Arc::new(Worker::new(Arc::new(FakeConsumerFactory { script: Script::default() })));
        let error = committed(worker, vec![id("t1", 0)]).await.unwrap_err();
        match error {
            ActionError::FanOut(native) => assert_eq!(native.message, "tmq not init"),
            other => panic!("expected FanOut, got {other:?}"),
        }
    }
}
