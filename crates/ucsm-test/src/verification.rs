//! Verification helpers for testing UCS tasks
//!
//! Provides assertion helpers over a [`MockHandle`]'s call log and remote tree

use thiserror::Error;

use crate::mock_handle::{HandleCall, MockHandle};

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected object '{dn}' not found in the remote tree")]
    MoNotFound { dn: String },

    #[error("Object '{dn}' should not exist in the remote tree")]
    MoUnexpected { dn: String },

    #[error("Attribute mismatch for {dn}:{attr}: expected '{expected}', got {actual:?}")]
    AttrMismatch {
        dn: String,
        attr: String,
        expected: String,
        actual: Option<String>,
    },

    #[error("Expected {expected} {what} calls, found {actual}")]
    CallCountMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Expected no mutating calls, found {calls:?}")]
    UnexpectedMutation { calls: Vec<HandleCall> },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Remote tree and call-log verification helper
pub struct HandleVerifier<'a> {
    handle: &'a MockHandle,
}

impl<'a> HandleVerifier<'a> {
    /// Create a new verifier
    pub fn new(handle: &'a MockHandle) -> Self {
        Self { handle }
    }

    /// Verify that an object exists
    pub fn assert_mo_exists(&self, dn: &str) -> VerifyResult<()> {
        if !self.handle.contains(dn) {
            return Err(VerificationError::MoNotFound { dn: dn.to_string() });
        }
        Ok(())
    }

    /// Verify that an object does not exist
    pub fn assert_mo_absent(&self, dn: &str) -> VerifyResult<()> {
        if self.handle.contains(dn) {
            return Err(VerificationError::MoUnexpected { dn: dn.to_string() });
        }
        Ok(())
    }

    /// Verify that an attribute has a specific value
    pub fn assert_attr(&self, dn: &str, attr: &str, expected: &str) -> VerifyResult<()> {
        let mo = self
            .handle
            .get(dn)
            .ok_or_else(|| VerificationError::MoNotFound { dn: dn.to_string() })?;

        match mo.get_attr(attr) {
            Some(actual) if actual == expected => Ok(()),
            actual => Err(VerificationError::AttrMismatch {
                dn: dn.to_string(),
                attr: attr.to_string(),
                expected: expected.to_string(),
                actual: actual.map(str::to_string),
            }),
        }
    }

    /// Verify that no remove, add or commit was issued
    pub fn assert_no_mutations(&self) -> VerifyResult<()> {
        let calls: Vec<HandleCall> = self
            .handle
            .calls()
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect();
        if calls.is_empty() {
            Ok(())
        } else {
            Err(VerificationError::UnexpectedMutation { calls })
        }
    }

    /// Verify the number of `remove_mo` calls
    pub fn assert_removes(&self, expected: usize) -> VerifyResult<()> {
        self.assert_count("remove_mo", expected, |c| {
            matches!(c, HandleCall::RemoveMo { .. })
        })
    }

    /// Verify the number of `add_mo` calls
    pub fn assert_adds(&self, expected: usize) -> VerifyResult<()> {
        self.assert_count("add_mo", expected, |c| matches!(c, HandleCall::AddMo { .. }))
    }

    /// Verify the number of `commit` calls
    pub fn assert_commits(&self, expected: usize) -> VerifyResult<()> {
        self.assert_count("commit", expected, |c| matches!(c, HandleCall::Commit))
    }

    fn assert_count(
        &self,
        what: &'static str,
        expected: usize,
        pred: impl Fn(&HandleCall) -> bool,
    ) -> VerifyResult<()> {
        let actual = self.handle.calls().iter().filter(|c| pred(c)).count();
        if actual != expected {
            Err(VerificationError::CallCountMismatch {
                what,
                expected,
                actual,
            })
        } else {
            Ok(())
        }
    }

    /// Dns passed to `remove_mo`, in call order
    pub fn removed_dns(&self) -> Vec<&str> {
        self.handle
            .calls()
            .iter()
            .filter_map(|c| match c {
                HandleCall::RemoveMo { dn } => Some(dn.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Objects passed to `add_mo`, in call order
    pub fn added_mos(&self) -> Vec<&ucsm_common::ManagedObject> {
        self.handle
            .calls()
            .iter()
            .filter_map(|c| match c {
                HandleCall::AddMo { mo, .. } => Some(mo),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::template_fixtures::template_with_vlans;
    use crate::fixtures::ORG_ROOT;

    #[test]
    fn test_tree_assertions() {
        let handle = MockHandle::new().with_mo(template_with_vlans(
            ORG_ROOT,
            "vNIC-A",
            &[("default", "yes")],
        ));
        let verifier = HandleVerifier::new(&handle);

        assert!(verifier
            .assert_mo_exists("org-root/lan-conn-templ-vNIC-A/if-default")
            .is_ok());
        assert!(verifier
            .assert_mo_absent("org-root/lan-conn-templ-vNIC-A/if-v100")
            .is_ok());
        assert!(verifier
            .assert_attr("org-root/lan-conn-templ-vNIC-A/if-default", "defaultNet", "yes")
            .is_ok());
        assert!(verifier
            .assert_attr("org-root/lan-conn-templ-vNIC-A/if-default", "defaultNet", "no")
            .is_err());
        assert!(verifier
            .assert_attr("org-root/lan-conn-templ-vNIC-A", "bogus", "x")
            .is_err());
    }

    #[test]
    fn test_call_counts_on_fresh_handle() {
        let handle = MockHandle::new();
        let verifier = HandleVerifier::new(&handle);

        assert!(verifier.assert_no_mutations().is_ok());
        assert!(verifier.assert_commits(0).is_ok());
        assert!(verifier.assert_commits(1).is_err());
        assert!(verifier.removed_dns().is_empty());
    }
}
