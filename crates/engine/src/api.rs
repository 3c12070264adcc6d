use super::EngineError;
use alloy_primitives::{Address, Bytes, B256, U64};
use alloy_provider::Provider;
use alloy_rpc_types_engine::{
    ExecutionPayloadV1, ForkchoiceState as AlloyForkchoiceState, ForkchoiceUpdated, PayloadId,
    PayloadStatus, PayloadStatusEnum,
};
use tracing::{debug, error, trace, warn};

/// The payload attributes of a derived block. The engine builds the block from the provided
/// transactions only.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupPayloadAttributes {
    /// The block timestamp.
    pub timestamp: U64,
    /// The randomness of the block.
    pub prev_randao: B256,
    /// The fee recipient.
    pub suggested_fee_recipient: Address,
    /// The encoded transactions of the block.
    pub transactions: Vec<Bytes>,
    /// Disables the inclusion of transactions from the pool.
    pub no_tx_pool: bool,
}

impl RollupPayloadAttributes {
    /// Returns the attributes building a block with exactly the provided transactions.
    pub fn new(timestamp: u64, suggested_fee_recipient: Address, transactions: Vec<Bytes>) -> Self {
        Self {
            timestamp: U64::from(timestamp),
            prev_randao: B256::ZERO,
            suggested_fee_recipient,
            transactions,
            no_tx_pool: true,
        }
    }
}

/// Calls `engine_newPayloadV1` and logs the result.
pub(crate) async fn new_payload<P: Provider>(
    provider: &P,
    execution_payload: ExecutionPayloadV1,
) -> Result<PayloadStatusEnum, EngineError> {
    let response: PayloadStatus =
        provider.raw_request("engine_newPayloadV1".into(), (execution_payload,)).await?;

    match &response.status {
        PayloadStatusEnum::Invalid { validation_error } => {
            error!(target: "rollup::engine", ?validation_error, "execution payload is invalid");
        }
        PayloadStatusEnum::Syncing => {
            debug!(target: "rollup::engine", "execution client is syncing");
        }
        PayloadStatusEnum::Accepted => {
            error!(target: "rollup::engine", "execution payload part of side chain");
        }
        PayloadStatusEnum::Valid => {
            trace!(target: "rollup::engine", "execution payload valid");
        }
    };

    Ok(response.status)
}

/// Calls `engine_forkchoiceUpdatedV1` and logs the result.
pub(crate) async fn forkchoice_updated<P: Provider>(
    provider: &P,
    fcs: AlloyForkchoiceState,
    attributes: Option<RollupPayloadAttributes>,
) -> Result<ForkchoiceUpdated, EngineError> {
    let forkchoice_updated: ForkchoiceUpdated =
        provider.raw_request("engine_forkchoiceUpdatedV1".into(), (fcs, attributes)).await?;

    match &forkchoice_updated.payload_status.status {
        PayloadStatusEnum::Invalid { validation_error } => {
            error!(target: "rollup::engine", ?validation_error, "failed to issue forkchoice");
        }
        PayloadStatusEnum::Syncing => {
            debug!(target: "rollup::engine", "head has been seen before, but not part of the chain");
        }
        PayloadStatusEnum::Accepted => {
            warn!(target: "rollup::engine", "forkchoice update returned an accepted status");
        }
        PayloadStatusEnum::Valid => {
            trace!(target: "rollup::engine", "forkchoice updated");
        }
    };

    Ok(forkchoice_updated)
}

/// Calls `engine_getPayloadV1`.
pub(crate) async fn get_payload<P: Provider>(
    provider: &P,
    id: PayloadId,
) -> Result<ExecutionPayloadV1, EngineError> {
    Ok(provider.raw_request("engine_getPayloadV1".into(), (id,)).await?)
}

/// Maps a non valid status to an [`EngineError`].
pub fn ensure_valid(status: &PayloadStatusEnum) -> Result<(), EngineError> {
    match status {
        PayloadStatusEnum::Valid => Ok(()),
        PayloadStatusEnum::Syncing => Err(EngineError::Syncing),
        status => Err(EngineError::InvalidStatus(status.clone())),
    }
}
