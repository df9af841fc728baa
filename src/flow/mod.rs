//! Flow definitions: the authored JSON model, the validated canonical model
//! and the store that indexes flows by equipment.

pub mod conversion;
pub mod definition;
pub mod raw;
pub mod store;

pub use conversion::*;
pub use definition::*;
pub use raw::*;
pub use store::*;
