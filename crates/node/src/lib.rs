//! The Rollup Node: derives the L2 chain from the L1 and, when enabled, posts the sequenced L2
//! blocks back to the L1.

mod args;
pub use args::{
    BatcherArgs, ContractsArgs, DerivationArgs, L1Args, L2Args, LogArgs, RollupNodeArgs,
};

mod constants;

mod node;
pub use node::RollupNode;
