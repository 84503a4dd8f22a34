//! Common infrastructure for Cisco UCS Manager configuration tasks.
//!
//! This crate provides shared functionality for every task crate that
//! reconciles a declaration against UCS Manager:
//!
//! - [`mo`]: Managed-object model (class, dn, status, attributes, children)
//! - [`LoginHandle`]: Connection trait consumed by reconcilers
//! - [`xml`]: XML API request builders and response parser
//! - [`session`]: HTTP session implementing [`LoginHandle`]
//! - [`UcsTask`]: Base trait for tasks, with the catch-all `run`
//! - [`error`]: Error types for UCS Manager operations
//!
//! # Architecture
//!
//! Tasks follow this pattern:
//!
//! 1. Build and validate a typed declaration
//! 2. Log in through [`UcsSession`]
//! 3. Query the current objects through [`LoginHandle::query_dn`]
//! 4. Stage changes with `add_mo`/`remove_mo` and `commit` them once
//! 5. Report a [`TaskResult`] and log out
//!
//! # Example
//!
//! ```ignore
//! use ucsm_common::{ConnectionConfig, LoginHandle, UcsSession, UcsmResult};
//!
//! async fn template_exists(cfg: ConnectionConfig, dn: &str) -> UcsmResult<bool> {
//!     let mut session = UcsSession::new(cfg)?;
//!     session.login().await?;
//!     let found = session.query_dn(dn).await?.is_some();
//!     session.logout().await;
//!     Ok(found)
//! }
//! ```

pub mod error;
pub mod handle;
pub mod manager;
pub mod mo;
pub mod session;
pub mod xml;

// Re-export commonly used items at crate root
pub use error::{UcsmError, UcsmResult};
pub use handle::LoginHandle;
pub use manager::{defaults, ModuleState, TaskResult, UcsTask};
pub use mo::{ManagedObject, MoStatus};
pub use session::{ConnectionConfig, UcsSession};
