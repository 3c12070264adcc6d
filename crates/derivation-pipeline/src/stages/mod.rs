//! The stages of the derivation pipeline, from the L1 headers to the L2 fork choice.

mod header;
pub use header::L1HeaderRetrievalStage;

mod processor;
pub use processor::L1TxProcessor;

mod retriever;
pub use retriever::{FilteredBlock, L1TxRetriever};

mod updater;
pub use updater::L2ForkchoiceUpdater;
