use crate::{BlockInfo, L2BlockRef};

/// An error occurring when updating the [`BlockRelations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RelationError {
    /// The relation does not strictly increase the L1 block number.
    #[error("relation at l1 block {got} does not extend last relation at l1 block {last}")]
    OutOfOrder {
        /// The L1 block number of the last stored relation.
        last: u64,
        /// The L1 block number of the rejected relation.
        got: u64,
    },
}

/// A relation between an L1 block and the L2 block derived while the L1 was at that block.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BlockRelation {
    /// The L1 block.
    pub l1_block: BlockInfo,
    /// The L2 block.
    pub l2_block: BlockInfo,
}

impl BlockRelation {
    /// Returns a new instance of [`BlockRelation`].
    pub const fn new(l1_block: BlockInfo, l2_block: BlockInfo) -> Self {
        Self { l1_block, l2_block }
    }
}

impl From<&L2BlockRef> for BlockRelation {
    fn from(value: &L2BlockRef) -> Self {
        Self { l1_block: value.l1_origin, l2_block: value.info() }
    }
}

/// An ordered collection of [`BlockRelation`], sorted by strictly increasing L1 block number.
///
/// Only the unfinalized window is retained: [`BlockRelations::mark_final`] drops the relations it
/// finalizes, [`BlockRelations::mark_reorged_out`] drops the relations past a rollback point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockRelations {
    relations: Vec<BlockRelation>,
}

impl BlockRelations {
    /// Returns an empty [`BlockRelations`].
    pub const fn new() -> Self {
        Self { relations: Vec::new() }
    }

    /// Appends the relation. Fails and leaves the collection untouched if the relation's L1 block
    /// number is not strictly greater than the one of the last stored relation.
    pub fn append(&mut self, relation: BlockRelation) -> Result<(), RelationError> {
        if let Some(last) = self.relations.last() {
            if relation.l1_block.number <= last.l1_block.number {
                return Err(RelationError::OutOfOrder {
                    last: last.l1_block.number,
                    got: relation.l1_block.number,
                })
            }
        }
        self.relations.push(relation);
        Ok(())
    }

    /// Returns the L2 block of the last relation with an L1 block number lower or equal to
    /// `l1_number`, or [`BlockInfo::EMPTY`] if there is none.
    pub fn mark_safe(&self, l1_number: u64) -> BlockInfo {
        self.search(l1_number).map(|i| self.relations[i].l2_block).unwrap_or_default()
    }

    /// Same as [`BlockRelations::mark_safe`], but also drops all the relations up to and
    /// including the returned one.
    pub fn mark_final(&mut self, l1_number: u64) -> BlockInfo {
        let Some(index) = self.search(l1_number) else { return BlockInfo::EMPTY };
        let finalized = self.relations[index].l2_block;
        self.relations.drain(..=index);
        finalized
    }

    /// Drops all the relations with an L1 block number strictly greater than `l1_number`.
    pub fn mark_reorged_out(&mut self, l1_number: u64) {
        let retained = self.relations.partition_point(|r| r.l1_block.number <= l1_number);
        self.relations.truncate(retained);
    }

    /// Returns the last relation, if any.
    pub fn last(&self) -> Option<&BlockRelation> {
        self.relations.last()
    }

    /// Returns the relations as a slice.
    pub fn as_slice(&self) -> &[BlockRelation] {
        &self.relations
    }

    /// Returns the number of relations.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Returns `true` if there are no relations.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Returns the index of the last relation with an L1 block number lower or equal to
    /// `l1_number`.
    fn search(&self, l1_number: u64) -> Option<usize> {
        self.relations.partition_point(|r| r.l1_block.number <= l1_number).checked_sub(1)
    }
}
