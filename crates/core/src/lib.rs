//! igen core types and utilities

pub mod access;
pub mod config;
pub mod error;
pub mod validation;

pub use access::{Claims, DASHBOARD_ROLES, Resource, Role};
pub use config::{ApiConfig, ClientConfig, SessionConfig};
pub use error::{CoreError, CoreResult};
pub use validation::{ValidateConfig, validators};
