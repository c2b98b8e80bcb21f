//! Pending-session lifecycle: from login to a finalised user entry.
//!
//! ```text
//! pending_calibration --complete_calibration--> calibrated (evicted)
//! pending_calibration --expiry sweep----------> expired    (evicted)
//! pending_calibration --cancel_session--------> (evicted)
//! ```
//!
//! Terminal sessions are evicted immediately, so callers cannot tell an
//! expired session from one that never existed.

mod config;
mod session;
mod session_manager;
mod session_store;
mod sweeper;

pub use config::SessionConfig;
pub use session::{PendingSession, SessionStatus};
pub use session_manager::{
    BeginSession, CalibrationCompleted, LoginStatus, SessionError, SessionManager, SessionStarted,
};
pub use sweeper::SessionSweeper;
