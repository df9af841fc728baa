//! The flow interpreter: a per-run state machine with undo history and
//! pluggable persistence.

pub mod answers;
pub mod machine;
pub mod storage;

pub use answers::*;
pub use machine::*;
pub use storage::*;
