//! Module `registry`
//!
//! Tracks dispatched requests that are still waiting for a worker reply.
//! An entry lives from dispatch until its response arrives, its caller
//! times out, or the broker shuts down.

use std::collections::HashMap;
use tokio::sync::oneshot;

use crate::broker::protocol::Response;
use crate::error::BrokerError;

/// Completion side of a waiting caller
pub type Completion = oneshot::Sender<Result<(), BrokerError>>;

/// Registry that maps correlation ids to waiting callers
#[derive(Default)]
pub struct PendingRegistry {
    pending: HashMap<String, Completion>,
}

impl PendingRegistry {
    /// Registers a waiting caller under `id`, replacing any previous entry
    pub fn insert(&mut self, id: String, completion: Completion) {
        self.pending.insert(id, completion);
    }

    /// Removes and returns the entry for `id`, if any
    pub fn remove(&mut self, id: &str) -> Option<Completion> {
        self.pending.remove(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Completes the caller waiting on `response.id`.
    ///
    /// Returns `false` when nobody is waiting, e.g. the caller already timed
    /// out; such responses are simply dropped.
    pub fn resolve(&mut self, response: Response) -> bool {
        let Some(completion) = self.remove(&response.id) else {
            return false;
        };

        let outcome = if response.success {
            Ok(())
        } else {
            Err(BrokerError::OperationFailed(
                response
                    .error
                    .unwrap_or_else(|| "unknown worker error".to_string()),
            ))
        };
        // The caller may have given up between lookup and send
        let _ = completion.send(outcome);
        true
    }

    /// Fails every waiting caller with the error built by `reason`
    pub fn reject_all(&mut self, reason: impl Fn() -> BrokerError) -> usize {
        let count = self.pending.len();
        for (_, completion) in self.pending.drain() {
            let _ = completion.send(Err(reason()));
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_completes_matching_caller_only() {
        let mut registry = PendingRegistry::default();
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, _rx_b) = oneshot::channel();
        registry.insert("a".into(), tx_a);
        registry.insert("b".into(), tx_b);

        assert!(registry.resolve(Response::failure("a".into(), "boom".into())));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("b").is_some());

        match rx_a.await.unwrap() {
            Err(BrokerError::OperationFailed(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut registry = PendingRegistry::default();
        assert!(!registry.resolve(Response::success("ghost".into())));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn reject_all_empties_the_registry() {
        let mut registry = PendingRegistry::default();
        let (tx, rx) = oneshot::channel();
        registry.insert("1".into(), tx);

        assert_eq!(registry.reject_all(|| BrokerError::ShuttingDown), 1);
        assert_eq!(registry.len(), 0);
        assert!(matches!(rx.await.unwrap(), Err(BrokerError::ShuttingDown)));
    }
}
