//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the diagflow crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use diagflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let store = FlowStore::from_manifest("flows/manifest.json")?;
//! let flow = store
//!     .find_flow("Acme", "Heater", "Digital")
//!     .ok_or("no diagnostic flow exists yet")?;
//!
//! let mut session = Session::builder(flow).build()?;
//! session.respond("118")?;
//! # Ok(())
//! # }
//! ```

// Flows and lookup
pub use crate::flow::{FlowDefinition, FlowStore, IntoFlow, Node, NodeKind};

// Interpreter
pub use crate::session::{
    Answer, Answers, FileStore, FinalRecord, MemoryStore, Outcome, Response, Session,
    SessionState, SessionStore, Step,
};

// Conditions and decoding
pub use crate::condition::{Condition, ConditionContext};
pub use crate::decoder::{DecoderRegistry, EquipmentDecoder, EquipmentInfo, HeaterDecoder};

// Configuration
pub use crate::config::{EngineConfig, SessionConfig};

// Error types
pub use crate::error::{
    ConditionParseError, ConfigError, FlowLoadError, ResponseError, StorageError,
};

// Standard library re-exports commonly used with this crate
pub use std::path::Path;
pub use std::sync::Arc;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
