//! # pisalist-core
//!
//! Domain services of PisaList. Each service is generic over the
//! [`Repository`](pisalist_shared::repository::Repository) primitives it
//! needs and never talks to a database directly:
//!
//! - [`AuthGate`]: registration, login, token issuance and validation
//! - [`TaskLifecycle`]: task edits, completion toggling, "today" and timeline
//! - [`WishSharing`]: private wishes, publishing, community random draws
//!
//! All calls are synchronous; the HTTP boundary runs them on a blocking pool.

pub mod auth;
pub mod clock;
pub mod tasks;
pub mod validation;
pub mod wishes;

pub use auth::{AuthGate, Session};
pub use clock::{Clock, FixedClock, SystemClock};
pub use tasks::TaskLifecycle;
pub use wishes::WishSharing;
