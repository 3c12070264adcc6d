//! Primitive types for the Rollup Node.

pub use block::{BlockInfo, BlockRef, BlockTag, L2BlockRef};
mod block;

pub use error::ErrorKind;
mod error;

pub use relation::{BlockRelation, BlockRelations, RelationError};
mod relation;

pub use transaction::{DerivationBlock, L1Block, L1Transaction, L2Block};
mod transaction;
