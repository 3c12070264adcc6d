use crate::RollupStateError;

use alloy_primitives::{B256, U256};
use rollup_l1::createAssertionCall;
use rollup_node_primitives::BlockInfo;

/// The resolution status of an [`Assertion`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssertionStatus {
    /// The assertion can still be challenged.
    Pending,
    /// The assertion was confirmed.
    Confirmed,
    /// The assertion was rejected.
    Rejected,
}

/// A claim about the L2 state posted to the rollup contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    /// The assertion id, the genesis assertion has id 0.
    pub id: u64,
    /// The hash of the VM state.
    pub vm_hash: B256,
    /// The number of messages of the inbox covered by the assertion.
    pub inbox_size: U256,
    /// The id of the parent assertion.
    pub parent: u64,
    /// The status of the assertion.
    pub status: AssertionStatus,
    /// The L1 block at which the assertion was created.
    pub created_at: BlockInfo,
    /// The L1 block at which the assertion was resolved.
    pub resolved_at: Option<BlockInfo>,
}

/// The assertions of the rollup contract, as derived from the L1 transactions.
///
/// Assertions are resolved in creation order: each confirmation or rejection applies to the
/// first unresolved assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupState {
    assertions: Vec<Assertion>,
    first_unresolved: u64,
    last_confirmed: u64,
}

impl Default for RollupState {
    fn default() -> Self {
        Self::new(B256::ZERO)
    }
}

impl RollupState {
    /// Returns a new [`RollupState`] holding the confirmed genesis assertion.
    pub fn new(genesis_vm_hash: B256) -> Self {
        let genesis = Assertion {
            id: 0,
            vm_hash: genesis_vm_hash,
            inbox_size: U256::ZERO,
            parent: 0,
            status: AssertionStatus::Confirmed,
            created_at: BlockInfo::EMPTY,
            resolved_at: None,
        };
        Self { assertions: vec![genesis], first_unresolved: 1, last_confirmed: 0 }
    }

    /// Returns the assertion with the id.
    pub fn assertion(&self, id: u64) -> Option<&Assertion> {
        self.assertions.get(id as usize)
    }

    /// Returns the id of the last created assertion.
    pub fn last_created(&self) -> u64 {
        self.assertions.len() as u64 - 1
    }

    /// Returns the id of the first unresolved assertion.
    pub const fn first_unresolved(&self) -> u64 {
        self.first_unresolved
    }

    /// Returns the id of the last confirmed assertion.
    pub const fn last_confirmed(&self) -> u64 {
        self.last_confirmed
    }

    /// Creates a new assertion on top of the last created one.
    pub fn create_assertion(&mut self, l1_block: BlockInfo, call: &createAssertionCall) -> u64 {
        let id = self.assertions.len() as u64;
        self.assertions.push(Assertion {
            id,
            vm_hash: call.vmHash,
            inbox_size: call.inboxSize,
            parent: id - 1,
            status: AssertionStatus::Pending,
            created_at: l1_block,
            resolved_at: None,
        });
        tracing::debug!(target: "rollup::derivation", id, vm_hash = %call.vmHash, l1_block = %l1_block, "assertion created");
        id
    }

    /// Confirms the first unresolved assertion.
    pub fn confirm_first_unresolved(&mut self, l1_block: BlockInfo) -> Result<u64, RollupStateError> {
        let id = self.resolve_first_unresolved(l1_block, AssertionStatus::Confirmed)?;
        self.last_confirmed = id;
        tracing::debug!(target: "rollup::derivation", id, l1_block = %l1_block, "assertion confirmed");
        Ok(id)
    }

    /// Rejects the first unresolved assertion.
    pub fn reject_first_unresolved(&mut self, l1_block: BlockInfo) -> Result<u64, RollupStateError> {
        let id = self.resolve_first_unresolved(l1_block, AssertionStatus::Rejected)?;
        tracing::debug!(target: "rollup::derivation", id, l1_block = %l1_block, "assertion rejected");
        Ok(id)
    }

    /// Reverts the changes made after the L1 block: assertions created later are dropped and the
    /// resolutions made later are reopened.
    pub fn recover(&mut self, l1_block: BlockInfo) {
        self.assertions.retain(|a| a.id == 0 || a.created_at.number <= l1_block.number);
        for assertion in &mut self.assertions {
            if assertion.resolved_at.is_some_and(|at| at.number > l1_block.number) {
                assertion.status = AssertionStatus::Pending;
                assertion.resolved_at = None;
            }
        }

        self.first_unresolved = self
            .assertions
            .iter()
            .find(|a| a.status == AssertionStatus::Pending)
            .map_or(self.assertions.len() as u64, |a| a.id);
        self.last_confirmed = self
            .assertions
            .iter()
            .rev()
            .find(|a| a.status == AssertionStatus::Confirmed)
            .map_or(0, |a| a.id);
    }

    fn resolve_first_unresolved(
        &mut self,
        l1_block: BlockInfo,
        status: AssertionStatus,
    ) -> Result<u64, RollupStateError> {
        let id = self.first_unresolved;
        let assertion = self
            .assertions
            .get_mut(id as usize)
            .ok_or(RollupStateError::NoUnresolvedAssertion)?;
        assertion.status = status;
        assertion.resolved_at = Some(l1_block);
        self.first_unresolved += 1;
        Ok(id)
    }
}
