//! The codec of the batches of L2 blocks appended to the sequencer inbox.
//!
//! A batch is posted as the calldata of `appendTxBatch(contexts, txLengths, firstL2BlockNumber,
//! txBatch)`:
//! - `contexts` is the flattened list of `(numTxs, blockNumber, timestamp)` triples, one per
//!   block.
//! - `txLengths` holds the byte length of each encoded transaction, in order.
//! - `txBatch` is the concatenation of all the encoded transactions.

pub use block::BlockContext;
mod block;

pub use error::{CodecError, DecodingError, EncodingError};
mod error;

pub use payload::BatchPayload;
mod payload;
