//! Encoding and decoding of the batch payload.

use crate::{block::to_u64, BlockContext, DecodingError, EncodingError};
use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolCall;
use rollup_l1::appendTxBatchCall;
use rollup_node_primitives::DerivationBlock;

/// A batch of L2 blocks, as posted to the sequencer inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPayload {
    /// The blocks of the batch, in order.
    pub blocks: Vec<DerivationBlock>,
}

impl BatchPayload {
    /// Returns a new instance of [`BatchPayload`].
    pub const fn new(blocks: Vec<DerivationBlock>) -> Self {
        Self { blocks }
    }

    /// Returns the number of the last block in the batch.
    pub fn last_block_number(&self) -> Option<u64> {
        self.blocks.last().map(|b| b.number)
    }

    /// Encodes the payload into an `appendTxBatch` call.
    pub fn encode(&self) -> Result<appendTxBatchCall, EncodingError> {
        let first = self.blocks.first().ok_or(EncodingError::EmptyBatch)?;

        let mut contexts = Vec::with_capacity(self.blocks.len() * BlockContext::WORDS);
        let mut tx_lengths = Vec::new();
        let mut tx_batch = Vec::new();

        for block in &self.blocks {
            contexts.extend(BlockContext::from(block).to_words());
            for tx in &block.transactions {
                tx_lengths.push(U256::from(tx.len()));
                tx_batch.extend_from_slice(tx);
            }
        }

        Ok(appendTxBatchCall {
            contexts,
            txLengths: tx_lengths,
            firstL2BlockNumber: U256::from(first.number),
            txBatch: tx_batch.into(),
        })
    }

    /// Encodes the payload into the calldata of an `appendTxBatch` call.
    pub fn to_calldata(&self) -> Result<Bytes, EncodingError> {
        Ok(self.encode()?.abi_encode().into())
    }

    /// Decodes the payload from an `appendTxBatch` call. The transactions are split into blocks
    /// using the contexts and transaction lengths only.
    pub fn decode(call: &appendTxBatchCall) -> Result<Self, DecodingError> {
        if call.contexts.len() % BlockContext::WORDS != 0 {
            return Err(DecodingError::MalformedContexts(call.contexts.len()))
        }
        let contexts = call
            .contexts
            .chunks_exact(BlockContext::WORDS)
            .map(BlockContext::try_from_words)
            .collect::<Result<Vec<_>, _>>()?;

        let first = contexts.first().ok_or(DecodingError::EmptyBatch)?;
        let expected = to_u64(&call.firstL2BlockNumber)?;
        if first.number != expected {
            return Err(DecodingError::FirstBlockMismatch { expected, got: first.number })
        }

        let tx_count = call.txLengths.len();
        let declared = contexts.iter().try_fold(0u64, |acc, c| acc.checked_add(c.num_txs));
        if declared != Some(tx_count as u64) {
            return Err(DecodingError::TransactionCountMismatch {
                expected: declared.unwrap_or(u64::MAX),
                got: tx_count,
            })
        }

        let mut lengths = call.txLengths.iter();
        let mut buf = call.txBatch.as_ref();
        let mut blocks = Vec::with_capacity(contexts.len());

        for context in contexts {
            // bounded by the transaction lengths count checked above.
            let num_txs = context.num_txs as usize;
            let mut transactions = Vec::with_capacity(num_txs);
            for length in lengths.by_ref().take(num_txs) {
                let length = usize::try_from(to_u64(length)?).map_err(|_| DecodingError::Eof)?;
                if buf.len() < length {
                    return Err(DecodingError::Eof)
                }
                let (tx, rest) = buf.split_at(length);
                transactions.push(Bytes::copy_from_slice(tx));
                buf = rest;
            }
            blocks.push(DerivationBlock::new(context.number, context.timestamp, transactions));
        }

        if !buf.is_empty() {
            return Err(DecodingError::TrailingBytes(buf.len()))
        }

        Ok(Self { blocks })
    }

    /// Decodes the payload from the calldata of an `appendTxBatch` call.
    pub fn decode_calldata(calldata: &[u8]) -> Result<Self, DecodingError> {
        Self::decode(&appendTxBatchCall::abi_decode(calldata)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::bytes;

    fn blocks() -> Vec<DerivationBlock> {
        vec![
            DerivationBlock::new(50, 1_000, vec![bytes!("0x01aabb"), bytes!("0x02cc")]),
            DerivationBlock::new(51, 1_002, vec![]),
            DerivationBlock::new(52, 1_004, vec![bytes!("0x03ddeeff00")]),
        ]
    }

    #[test]
    fn test_encode_layout() -> eyre::Result<()> {
        let call = BatchPayload::new(blocks()).encode()?;

        let words = |values: &[u64]| values.iter().map(|v| U256::from(*v)).collect::<Vec<_>>();
        assert_eq!(call.contexts, words(&[2, 50, 1_000, 0, 51, 1_002, 1, 52, 1_004]));
        assert_eq!(call.txLengths, words(&[3, 2, 5]));
        assert_eq!(call.firstL2BlockNumber, U256::from(50));
        assert_eq!(call.txBatch, bytes!("0x01aabb02cc03ddeeff00"));

        Ok(())
    }

    #[test]
    fn test_decode_calldata() -> eyre::Result<()> {
        let calldata = BatchPayload::new(blocks()).to_calldata()?;
        assert_eq!(calldata[..4], appendTxBatchCall::SELECTOR);

        let payload = BatchPayload::decode_calldata(&calldata)?;
        assert_eq!(payload.blocks, blocks());
        assert_eq!(payload.last_block_number(), Some(52));

        Ok(())
    }

    #[test]
    fn test_encode_empty_batch() {
        assert!(matches!(BatchPayload::default().encode(), Err(EncodingError::EmptyBatch)));
    }

    #[test]
    fn test_decode_malformed() -> eyre::Result<()> {
        let valid = BatchPayload::new(blocks()).encode()?;

        let mut call = valid.clone();
        call.contexts.pop();
        assert!(matches!(BatchPayload::decode(&call), Err(DecodingError::MalformedContexts(8))));

        let mut call = valid.clone();
        call.firstL2BlockNumber = U256::from(49);
        assert!(matches!(
            BatchPayload::decode(&call),
            Err(DecodingError::FirstBlockMismatch { expected: 49, got: 50 })
        ));

        let mut call = valid.clone();
        call.txLengths.push(U256::from(1));
        assert!(matches!(
            BatchPayload::decode(&call),
            Err(DecodingError::TransactionCountMismatch { expected: 3, got: 4 })
        ));

        let mut call = valid.clone();
        call.txLengths[2] = U256::from(6);
        assert!(matches!(BatchPayload::decode(&call), Err(DecodingError::Eof)));

        let mut call = valid.clone();
        call.txLengths[2] = U256::from(4);
        assert!(matches!(BatchPayload::decode(&call), Err(DecodingError::TrailingBytes(1))));

        let mut call = valid;
        call.contexts[1] = U256::MAX;
        assert!(matches!(BatchPayload::decode(&call), Err(DecodingError::Overflow(_))));

        let empty = appendTxBatchCall {
            contexts: vec![],
            txLengths: vec![],
            firstL2BlockNumber: U256::ZERO,
            txBatch: Bytes::new(),
        };
        assert!(matches!(BatchPayload::decode(&empty), Err(DecodingError::EmptyBatch)));

        Ok(())
    }
}
