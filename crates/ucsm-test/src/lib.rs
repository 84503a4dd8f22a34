//! Test infrastructure for UCS Manager configuration tasks
//!
//! Provides:
//! - An in-memory [`MockHandle`] that implements `LoginHandle` and records
//!   every call
//! - Fixtures for the managed objects tasks usually meet
//! - Verification helpers for call counts and remote tree contents

pub mod fixtures;
mod mock_handle;
mod verification;

pub use fixtures::*;
pub use mock_handle::{HandleCall, MockHandle, MockOp};
pub use verification::*;
