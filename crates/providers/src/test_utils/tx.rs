use crate::{TxCandidate, TxManager, TxManagerError, TxReceipt};
use std::sync::Arc;

use alloy_primitives::keccak256;
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct MockTxState {
    sent: Vec<TxCandidate>,
    failures: usize,
}

/// A [`TxManager`] recording the sent candidates.
#[derive(Debug, Clone, Default)]
pub struct MockTxManager {
    state: Arc<Mutex<MockTxState>>,
}

impl MockTxManager {
    /// Returns the candidates sent so far.
    pub fn sent(&self) -> Vec<TxCandidate> {
        self.state.lock().sent.clone()
    }

    /// Fails the next `count` submissions.
    pub fn fail_next(&self, count: usize) {
        self.state.lock().failures = count;
    }
}

#[async_trait::async_trait]
impl TxManager for MockTxManager {
    async fn send(&self, candidate: TxCandidate) -> Result<TxReceipt, TxManagerError> {
        let mut state = self.state.lock();
        if state.failures > 0 {
            state.failures -= 1;
            return Err(TxManagerError::Other("mock failure"))
        }
        let hash = keccak256(&candidate.data);
        state.sent.push(candidate);
        Ok(TxReceipt { hash, block_number: Some(state.sent.len() as u64) })
    }
}
