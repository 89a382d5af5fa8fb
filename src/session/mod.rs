//! Session state and the dashboard access gate
//!
//! Provides:
//! - A single session-service interface (`SessionStore`) all API code reads
//!   the bearer token through
//! - In-memory and file-backed stores
//! - `SessionGate` for protected views, with login redirect and 401 logout
//! - `login`/`logout` helpers that own the session lifecycle

pub mod gate;
pub mod store;

pub use gate::{login, logout, GateDecision, SessionGate, DEFAULT_LANDING, LOGIN_PATH};
pub use store::{FileSessionStore, MemorySessionStore, SessionError, SessionStore, StoredSession};
