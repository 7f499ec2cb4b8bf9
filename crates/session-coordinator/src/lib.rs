//! Session-lifecycle coordination for the patient-records console.
//!
//! Keeps a user signed in exactly as long as two independent expiry
//! rules allow, and drives a single authoritative logout decision:
//!
//! - an **inactivity watchdog** with a warning/countdown phase, reset by
//!   user activity while active, escaped only by an explicit extend once
//!   the warning has begun
//! - a **token watchdog** tracking the bearer token's expiry claim,
//!   silent by design: no warning, only the terminal callback
//!
//! # Core Invariants
//!
//! 1. **At most one logout**: `on_timeout` fires at most once per
//!    `start()`/`stop()` cycle, from whichever branch reaches its
//!    deadline first.
//! 2. **Teardown before notify**: every pending timer in both branches
//!    is cancelled before the host hears about a timeout, so the losing
//!    branch can never fire late.
//! 3. **Owned deadlines**: every scheduled deadline has exactly one
//!    owning handle that `stop()` cancels unconditionally.
//! 4. **Fail closed**: a malformed or expired token is treated as an
//!    expired session, never surfaced as an error.

pub mod callbacks;
pub mod config;
pub mod coordinator;
pub mod error;

mod inactivity;
mod timer;
mod token_watch;

#[cfg(test)]
mod tests;

pub use callbacks::{SessionCallbacks, TimeoutCause};
pub use config::{
    SessionConfig, INACTIVITY_TIMEOUT, INACTIVITY_WARNING, REVALIDATION_INTERVAL,
};
pub use coordinator::{SessionCoordinator, SessionStatus};
pub use error::{ConfigError, ConfigResult};
pub use inactivity::SessionPhase;
