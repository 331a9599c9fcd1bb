//! Module `dispatch`
//!
//! The execution broker. Callers hand it an operation and await the result;
//! the broker tags the operation with a fresh correlation id, forwards it to
//! the worker and completes the caller when the matching response comes
//! back, or fails it once the request timeout elapses.

use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time;

use crate::broker::protocol::{Operation, Request, Response};
use crate::broker::registry::PendingRegistry;
use crate::broker::worker::FileWorker;
use crate::error::BrokerError;

/// Default time a caller waits for its response
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a registry entry when its caller stops waiting, however that happens
struct PendingGuard<'a> {
    pending: &'a Mutex<PendingRegistry>,
    id: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(self.id);
    }
}

/// Correlates dispatched operations with worker responses
pub struct ExecutionBroker {
    next_id: AtomicU64,
    pending: Arc<Mutex<PendingRegistry>>,
    requests: Mutex<Option<UnboundedSender<Request>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    response_pump: JoinHandle<()>,
    timeout: Duration,
}

impl ExecutionBroker {
    /// Spawns `worker` as the background unit and a broker in front of it
    pub fn spawn(worker: FileWorker, timeout: Duration) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        let worker_task = tokio::spawn(worker.run(request_rx, response_tx));

        let broker = Self::with_channels(request_tx, response_rx, timeout);
        *lock(&broker.worker) = Some(worker_task);
        broker
    }

    /// Builds a broker over an already running worker reachable through the
    /// given channels
    pub fn with_channels(
        requests: UnboundedSender<Request>,
        responses: UnboundedReceiver<Response>,
        timeout: Duration,
    ) -> Self {
        let pending = Arc::new(Mutex::new(PendingRegistry::default()));
        let response_pump = tokio::spawn(pump_responses(responses, Arc::clone(&pending)));

        Self {
            next_id: AtomicU64::new(1),
            pending,
            requests: Mutex::new(Some(requests)),
            worker: Mutex::new(None),
            response_pump,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of requests still waiting for a response
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Sends `operation` to the worker and waits for its outcome
    pub async fn dispatch(&self, operation: Operation) -> Result<(), BrokerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let kind = operation.kind();

        let (completion, outcome) = oneshot::channel();
        lock(&self.pending).insert(id.clone(), completion);
        let _guard = PendingGuard {
            pending: &self.pending,
            id: &id,
        };

        let sender = lock(&self.requests).clone();
        let Some(sender) = sender else {
            return Err(BrokerError::ShuttingDown);
        };
        let request = Request {
            id: id.clone(),
            operation,
        };
        if sender.send(request).is_err() {
            warn!("Worker is gone, cannot dispatch {} request {}", kind, id);
            return Err(BrokerError::Disconnected);
        }
        debug!("Dispatched {} request {}", kind, id);

        match time::timeout(self.timeout, outcome).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BrokerError::Disconnected),
            Err(_) => {
                warn!(
                    "{} request {} timed out after {:?}",
                    kind, id, self.timeout
                );
                Err(BrokerError::Timeout {
                    id: id.clone(),
                    waited: self.timeout,
                })
            }
        }
    }

    /// Rejects every waiting caller, stops accepting requests and waits for
    /// the worker to finish what is already queued
    pub async fn shutdown(&self) {
        let sender = lock(&self.requests).take();
        let rejected = lock(&self.pending).reject_all(|| BrokerError::ShuttingDown);
        drop(sender);

        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!("File worker terminated abnormally: {}", e);
            }
        }

        info!(
            "Execution broker shut down ({} pending requests rejected)",
            rejected
        );
    }
}

impl Drop for ExecutionBroker {
    fn drop(&mut self) {
        self.response_pump.abort();
    }
}

/// Routes worker responses to their waiting callers
async fn pump_responses(
    mut responses: UnboundedReceiver<Response>,
    pending: Arc<Mutex<PendingRegistry>>,
) {
    while let Some(response) = responses.recv().await {
        let id = response.id.clone();
        if !lock(&pending).resolve(response) {
            debug!("Discarding response for request {} with no waiting caller", id);
        }
    }

    let orphaned = lock(&pending).reject_all(|| BrokerError::Disconnected);
    if orphaned > 0 {
        warn!("Worker channel closed with {} requests in flight", orphaned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::protocol::{DeletePayload, SaveTextPayload};

    fn delete(path: &str) -> Operation {
        Operation::DeleteFile(DeletePayload {
            path: path.to_string(),
        })
    }

    fn save(path: &str) -> Operation {
        Operation::SaveText(SaveTextPayload {
            text: String::new(),
            filepath: path.to_string(),
        })
    }

    #[tokio::test]
    async fn responses_are_matched_by_id_not_order() {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        // answers the second request first, and fails the first one
        tokio::spawn(async move {
            let first = request_rx.recv().await.unwrap();
            let second = request_rx.recv().await.unwrap();
            response_tx.send(Response::success(second.id)).unwrap();
            response_tx
                .send(Response::failure(first.id, "disk full".into()))
                .unwrap();
        });

        let broker =
            ExecutionBroker::with_channels(request_tx, response_rx, Duration::from_secs(5));
        let (a, b) = tokio::join!(broker.dispatch(save("/a")), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            broker.dispatch(save("/b")).await
        });

        match a {
            Err(BrokerError::OperationFailed(msg)) => assert_eq!(msg, "disk full"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(b.is_ok());
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn late_response_after_timeout_is_dropped() {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        // answers the first request too late, then the next one promptly
        tokio::spawn(async move {
            let slow = request_rx.recv().await.unwrap();
            tokio::time::sleep(Duration::from_millis(300)).await;
            response_tx.send(Response::success(slow.id)).unwrap();
            let fast = request_rx.recv().await.unwrap();
            response_tx.send(Response::success(fast.id)).unwrap();
        });

        let broker =
            ExecutionBroker::with_channels(request_tx, response_rx, Duration::from_millis(100));

        let first = broker.dispatch(delete("/slow")).await;
        assert!(matches!(first, Err(BrokerError::Timeout { ref id, .. }) if id == "1"));
        assert_eq!(broker.pending_count(), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(broker.dispatch(delete("/fast")).await.is_ok());
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn expired_response_does_not_disturb_a_waiting_request() {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        let broker = Arc::new(ExecutionBroker::with_channels(
            request_tx,
            response_rx,
            Duration::from_millis(300),
        ));

        // holds both requests until the first has expired, then answers the
        // expired one before the one still waiting
        let monitor = Arc::clone(&broker);
        tokio::spawn(async move {
            let slow = request_rx.recv().await.unwrap();
            let waiting = request_rx.recv().await.unwrap();
            while monitor.pending_count() != 1 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            response_tx.send(Response::success(slow.id)).unwrap();
            response_tx
                .send(Response::failure(waiting.id, "quota exceeded".into()))
                .unwrap();
        });

        let (first, second) = tokio::join!(broker.dispatch(delete("/slow")), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            broker.dispatch(delete("/waiting")).await
        });

        assert!(matches!(first, Err(BrokerError::Timeout { ref id, .. }) if id == "1"));
        match second {
            Err(BrokerError::OperationFailed(msg)) => assert_eq!(msg, "quota exceeded"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn shutdown_rejects_waiting_callers() {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
        let (_response_tx, response_rx) = mpsc::unbounded_channel::<Response>();

        // receives requests but never answers
        tokio::spawn(async move { while request_rx.recv().await.is_some() {} });

        let broker = Arc::new(ExecutionBroker::with_channels(
            request_tx,
            response_rx,
            Duration::from_secs(30),
        ));
        let waiting = {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move { broker.dispatch(delete("/x")).await })
        };

        while broker.pending_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        broker.shutdown().await;

        assert!(matches!(waiting.await.unwrap(), Err(BrokerError::ShuttingDown)));
        assert!(matches!(
            broker.dispatch(delete("/y")).await,
            Err(BrokerError::ShuttingDown)
        ));
        assert_eq!(broker.pending_count(), 0);
    }

    #[tokio::test]
    async fn ids_are_unique_and_increasing() {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<Request>();
        let (response_tx, response_rx) = mpsc::unbounded_channel();

        let echo = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(request) = request_rx.recv().await {
                seen.push(request.id.clone());
                response_tx.send(Response::success(request.id)).unwrap();
                if seen.len() == 3 {
                    break;
                }
            }
            seen
        });

        let broker =
            ExecutionBroker::with_channels(request_tx, response_rx, Duration::from_secs(5));
        for path in ["/a", "/b", "/c"] {
            broker.dispatch(delete(path)).await.unwrap();
        }
        assert_eq!(echo.await.unwrap(), vec!["1", "2", "3"]);
    }
}
