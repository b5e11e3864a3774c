//! SurrealDB store implementations.

mod note;
mod tenant;
mod user;

pub use note::SurrealNoteStore;
pub use tenant::SurrealTenantStore;
pub use user::SurrealUserStore;
