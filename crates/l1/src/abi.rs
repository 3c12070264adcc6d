#![allow(missing_docs, unreachable_pub)]

use alloy_sol_types::sol;

// Sequencer Inbox Contract
sol! {
    #[derive(Debug, PartialEq, Eq)]
    function appendTxBatch(
        uint256[] calldata contexts,
        uint256[] calldata txLengths,
        uint256 firstL2BlockNumber,
        bytes calldata txBatch
    ) external;
}

// Rollup Contract
sol! {
    #[derive(Debug, PartialEq, Eq)]
    function createAssertion(bytes32 vmHash, uint256 inboxSize) external;

    #[derive(Debug, PartialEq, Eq)]
    function confirmFirstUnresolvedAssertion() external;

    #[derive(Debug, PartialEq, Eq)]
    function rejectFirstUnresolvedAssertion() external;
}
