//! Procedure Boundary
//!
//! Exposes the services as named operations taking and returning JSON
//! objects, e.g. `milestone.reparent` with
//!
//! ```json
//! { "milestoneId": "m-1", "newParentId": "m-7" }
//! ```
//!
//! Params are camelCase and deserialised with serde; malformed params fail
//! with `INVALID_PARAMS`. Service failures map to a stable code by
//! [`ErrorCategory`](crate::services::ErrorCategory).
//!
//! [`run_stdio`] drives a [`ProcedureRouter`] over any line-oriented async
//! reader/writer pair.

pub mod handlers;
pub mod router;
pub mod stdio;
pub mod types;

pub use router::{ProcedureRouter, PROCEDURES};
pub use stdio::run_stdio;
pub use types::{ProcedureError, ProcedureRequest, ProcedureResponse};
