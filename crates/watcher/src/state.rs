use crate::{L1HeadHandler, L1StateError, WatcherMetrics};

use parking_lot::RwLock;
use rollup_node_primitives::{BlockInfo, BlockRef, BlockTag};

/// The latest, safe and finalized L1 blocks observed by the node.
///
/// Each tag is behind its own lock: the slots are written by the syncer callbacks and read by
/// the derivation pipeline.
#[derive(Debug, Default)]
pub struct L1State {
    latest: RwLock<BlockInfo>,
    safe: RwLock<BlockInfo>,
    finalized: RwLock<BlockInfo>,
    metrics: WatcherMetrics,
}

impl L1State {
    /// Returns a new empty [`L1State`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest L1 block, or [`BlockInfo::EMPTY`] if unknown.
    pub fn latest(&self) -> BlockInfo {
        *self.latest.read()
    }

    /// Returns the safe L1 block, or [`BlockInfo::EMPTY`] if unknown.
    pub fn safe(&self) -> BlockInfo {
        *self.safe.read()
    }

    /// Returns the finalized L1 block, or [`BlockInfo::EMPTY`] if unknown.
    pub fn finalized(&self) -> BlockInfo {
        *self.finalized.read()
    }

    /// Returns the block for the tag.
    pub fn get(&self, tag: BlockTag) -> BlockInfo {
        match tag {
            BlockTag::Latest => self.latest(),
            BlockTag::Safe => self.safe(),
            BlockTag::Finalized => self.finalized(),
        }
    }

    /// Overwrites the latest block. A block that does not increase the number is still stored.
    pub fn update_latest(&self, block: BlockInfo) {
        let mut latest = self.latest.write();
        if !latest.is_empty() && block.number <= latest.number {
            tracing::warn!(target: "rollup::watcher", previous = %*latest, new = %block, "latest L1 block did not increase");
        }
        *latest = block;
        self.metrics.head_updates.increment(1);
        self.metrics.head_number.set(block.number as f64);
    }

    /// Updates the safe block. Older blocks are ignored.
    pub fn update_safe(&self, block: BlockInfo) -> Result<(), L1StateError> {
        if self.update_committed(BlockTag::Safe, &self.safe, block)? {
            self.metrics.safe_number.set(block.number as f64);
        }
        Ok(())
    }

    /// Updates the finalized block. Older blocks are ignored.
    pub fn update_finalized(&self, block: BlockInfo) -> Result<(), L1StateError> {
        if self.update_committed(BlockTag::Finalized, &self.finalized, block)? {
            self.metrics.finalized_number.set(block.number as f64);
        }
        Ok(())
    }

    /// Returns `true` if the block was stored.
    fn update_committed(
        &self,
        tag: BlockTag,
        slot: &RwLock<BlockInfo>,
        block: BlockInfo,
    ) -> Result<bool, L1StateError> {
        let mut current = slot.write();
        if !current.is_empty() {
            if block.number < current.number {
                tracing::debug!(target: "rollup::watcher", %tag, current = %*current, new = %block, "ignoring stale L1 block");
                self.metrics.stale_updates.increment(1);
                return Ok(false)
            }
            if block.number == current.number && block.hash != current.hash {
                return Err(L1StateError::ConflictingBlock {
                    tag,
                    number: block.number,
                    known: current.hash,
                    got: block.hash,
                })
            }
        }

        tracing::trace!(target: "rollup::watcher", %tag, %block, "L1 block updated");
        *current = block;
        Ok(true)
    }
}

impl L1HeadHandler for L1State {
    type Error = L1StateError;

    fn on_latest(&self, header: BlockRef) -> Result<(), Self::Error> {
        self.update_latest(header.info());
        Ok(())
    }

    fn on_safe(&self, header: BlockRef) -> Result<(), Self::Error> {
        self.update_safe(header.info())
    }

    fn on_finalized(&self, header: BlockRef) -> Result<(), Self::Error> {
        self.update_finalized(header.info())
    }
}
