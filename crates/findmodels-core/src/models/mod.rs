//! Data models shared across the engine.
//!
//! Serialized field names follow the host extension's JSON so snapshots and
//! cached link payloads can be exchanged with the browser panel.

mod category;
mod link;
mod status;

pub use category::*;
pub use link::*;
pub use status::*;
