//! In-memory representation of ledger rounds.

pub mod block;
pub mod transaction;

pub use block::{AccountDelta, BlockData, BlockHeader, Certificate, Genesis, StateDelta};
pub use transaction::{
    ApplyData, EvalDelta, SignedTxnInBlock, SignedTxnWithAD, Transaction, TxType,
};
