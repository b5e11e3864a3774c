//! Quill Core — domain models, plan policy, and store trait
//! definitions shared across all crates.

pub mod error;
pub mod models;
pub mod policy;
pub mod slug;
pub mod store;

pub use error::{CoreError, CoreResult};
pub use policy::{PlanPolicy, effective_permissions};
