//! Procedure handlers, one module per area
//!
//! Every handler has the shape
//! `async fn(&CoreServices, Value) -> Result<Value, ProcedureError>`.

pub mod completion;
pub mod entries;
pub mod franchises;
pub mod milestones;
pub mod preferences;
