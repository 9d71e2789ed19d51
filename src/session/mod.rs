//! Login state persistence
//!
//! One storage-state snapshot per target, written after the user confirms a
//! manual login and read back on every strategy initialization.

pub mod state;
pub mod store;

pub use state::{Cookie, NameValue, OriginState, SessionState};
pub use store::SessionStore;
