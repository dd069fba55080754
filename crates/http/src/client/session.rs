//! Session termination events
//!
//! When the client cannot renew a session it wipes the stored credentials and
//! tells the host application through a [`SessionListener`], which decides how
//! to send the user back to the login entry point.

use std::fmt;

/// Why a session was torn down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// A request was rejected and no refresh credential was stored
    MissingRefreshCredential,
    /// The refresh endpoint refused to issue a new access credential
    RefreshRejected,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRefreshCredential => f.write_str("no refresh credential"),
            Self::RefreshRejected => f.write_str("refresh rejected"),
        }
    }
}

/// Emitted once per teardown, after the credential store has been cleared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTerminated {
    pub reason: TerminationReason,
    /// Login entry point the user should be sent to
    pub login_path: String,
}

/// Receives session teardown events
pub trait SessionListener: Send + Sync {
    fn on_session_terminated(&self, event: &SessionTerminated);
}

impl<F> SessionListener for F
where
    F: Fn(&SessionTerminated) + Send + Sync,
{
    fn on_session_terminated(&self, event: &SessionTerminated) {
        self(event);
    }
}

/// Default listener: logs the teardown
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl SessionListener for LoggingListener {
    fn on_session_terminated(&self, event: &SessionTerminated) {
        warn!(
            reason = %event.reason,
            login_path = %event.login_path,
            "Session terminated; sign in again"
        );
    }
}
