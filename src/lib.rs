//! # diagflow - Guided Diagnostic Flow Engine
//!
//! **diagflow** walks field technicians through equipment diagnostics. A flow is
//! a directed graph of question nodes (voltage readings, yes/no checks, choices,
//! serial/model entry, information steps) loaded from JSON and validated up
//! front, so a broken reference is a load error instead of a dead end in the
//! field.
//!
//! ## Core Workflow
//!
//! 1.  **Load Flows**: Build a `FlowStore` from an explicit manifest, a binary
//!     bundle, or programmatically with `FlowStore::builder`.
//! 2.  **Find a Flow**: `find_flow(brand, equipment_type, model)` with
//!     case- and whitespace-insensitive matching. `None` means no flow exists yet.
//! 3.  **Run a Session**: `Session::builder(flow)` with an optional decoder
//!     registry and `SessionStore`. Call `respond` for each answer, `go_back`
//!     to undo and `reset` to start over.
//! 4.  **Hand Off**: on a terminal node `respond` returns `Step::Finished` with
//!     the `FinalRecord` for the report generator.
//!
//! Routing rules use a small closed grammar (see [`condition`]) rather than a
//! general expression language.
//!
//! ## Quick Start
//!
//! ```rust
//! use diagflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let store = FlowStore::builder()
//!         .register_json(r#"{
//!             "id": "heater-power", "brand": "Acme", "equipmentType": "Heater",
//!             "model": "Digital", "title": "No power", "start": "s1",
//!             "nodes": {
//!                 "s1": { "text": "Measure supply voltage", "input": "number", "unit": "VAC",
//!                         "range": [110, 126], "pass": "ok", "fail": "fix_power" },
//!                 "ok": { "text": "Supply is fine", "input": "info", "terminal": true, "success": true },
//!                 "fix_power": { "text": "Repair the supply", "input": "info", "terminal": true }
//!             }
//!         }"#)?
//!         .build()?;
//!
//!     let flow = store.find_flow("ACME", "heater", " digital ").ok_or("no flow")?;
//!     let mut session = Session::builder(flow).build()?;
//!
//!     match session.respond(118)? {
//!         Step::Finished(record) => assert_eq!(record.outcome, Outcome::Success),
//!         Step::Advanced { .. } => unreachable!(),
//!     }
//!     Ok(())
//! }
//! ```

pub mod condition;
pub mod config;
pub mod decoder;
pub mod error;
pub mod flow;
pub mod prelude;
pub mod session;
