//! igen HTTP client
//!
//! Authenticated access to the console backend: every request carries the
//! stored access credential, expired credentials are renewed transparently,
//! and unrecoverable sessions are torn down and reported to the host.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::session::{LoggingListener, SessionListener, SessionTerminated, TerminationReason};
#[cfg(not(target_arch = "wasm32"))]
pub use client::store::FileCredentialStore;
pub use client::store::{CredentialKey, CredentialStore, MemoryCredentialStore, StoreError};
pub use client::{ApiClient, ApiClientBuilder};
