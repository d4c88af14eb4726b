//! Domain models for notebox.
//!
//! - [`Note`]: the single persisted record type. Owned exclusively by
//!   [`crate::db::Database`]; callers only ever see copies.
//! - [`NoteInput`]: request body for both create and update (full replacement).
//! - [`DeleteConfirmation`]: acknowledgment returned by delete.
//! - [`Session`]: per-request session record carried in request extensions.
//! - [`HealthStatus`]: body of the health probe.

mod health;
mod note;
mod session;

pub use health::*;
pub use note::*;
pub use session::*;
