//! In-memory `LoginHandle`.
//!
//! The remote tree is kept flat (dn -> object without children), which is
//! what a non-hierarchical `configResolveDn` returns. Staged changes are
//! applied on commit the way UCS Manager applies a `configConfMos` batch:
//! all or nothing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;
use ucsm_common::{LoginHandle, ManagedObject, MoStatus, UcsmError, UcsmResult};

/// Handle operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    QueryDn,
    QueryChildren,
    RemoveMo,
    AddMo,
    Commit,
}

impl MockOp {
    /// XML API method a live session would use for this operation.
    pub fn method(&self) -> &'static str {
        match self {
            MockOp::QueryDn => "configResolveDn",
            MockOp::QueryChildren => "configResolveChildren",
            MockOp::RemoveMo | MockOp::AddMo | MockOp::Commit => "configConfMos",
        }
    }
}

/// One recorded call on the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleCall {
    QueryDn { dn: String },
    QueryChildren { dn: String, class_id: String },
    RemoveMo { dn: String },
    AddMo { mo: ManagedObject, modify_present: bool },
    Commit,
}

impl HandleCall {
    /// Returns true for remove, add and commit.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            HandleCall::RemoveMo { .. } | HandleCall::AddMo { .. } | HandleCall::Commit
        )
    }
}

/// Error code used for rejected batches.
const CONF_MOS_ERROR_CODE: &str = "103";

/// In-memory UCS Manager object tree with call recording.
#[derive(Debug, Default)]
pub struct MockHandle {
    tree: BTreeMap<String, ManagedObject>,
    staged: Vec<ManagedObject>,
    calls: Vec<HandleCall>,
    failure: Option<(MockOp, String)>,
}

impl MockHandle {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object and every child it carries.
    pub fn with_mo(mut self, mo: ManagedObject) -> Self {
        self.insert(mo);
        self
    }

    /// Makes every call of `op` fail with `message`.
    pub fn fail_on(mut self, op: MockOp, message: impl Into<String>) -> Self {
        self.failure = Some((op, message.into()));
        self
    }

    /// Seeds an object and every child it carries.
    pub fn insert(&mut self, mo: ManagedObject) {
        flatten_into(&mut self.tree, mo);
    }

    /// Looks up a stored object.
    pub fn get(&self, dn: &str) -> Option<&ManagedObject> {
        self.tree.get(dn)
    }

    /// Returns true when `dn` is stored.
    pub fn contains(&self, dn: &str) -> bool {
        self.tree.contains_key(dn)
    }

    /// All stored dns, sorted.
    pub fn dns(&self) -> Vec<&str> {
        self.tree.keys().map(String::as_str).collect()
    }

    /// Every call made so far.
    pub fn calls(&self) -> &[HandleCall] {
        &self.calls
    }

    /// Forgets recorded calls, keeping the tree.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of staged, uncommitted changes.
    pub fn pending_changes(&self) -> usize {
        self.staged.len()
    }

    fn check_failure(&self, op: MockOp) -> UcsmResult<()> {
        match &self.failure {
            Some((failing, message)) if *failing == op => {
                Err(UcsmError::api(op.method(), "999", message.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// Stores `mo` and its descendants as flat entries.
fn flatten_into(tree: &mut BTreeMap<String, ManagedObject>, mut mo: ManagedObject) {
    let children = std::mem::take(&mut mo.children);
    mo.status = None;
    tree.insert(mo.dn.clone(), mo);
    for child in children {
        flatten_into(tree, child);
    }
}

fn remove_subtree(tree: &mut BTreeMap<String, ManagedObject>, dn: &str) {
    let prefix = format!("{}/", dn);
    tree.retain(|key, _| key != dn && !key.starts_with(&prefix));
}

fn rejected(message: String) -> UcsmError {
    UcsmError::api(MockOp::Commit.method(), CONF_MOS_ERROR_CODE, message)
}

/// Applies one staged object, recursing into its children.
fn apply(tree: &mut BTreeMap<String, ManagedObject>, mo: &ManagedObject) -> UcsmResult<()> {
    let status = mo.status.unwrap_or(MoStatus::CreatedModified);
    let exists = tree.contains_key(&mo.dn);

    match status {
        MoStatus::Deleted if !exists => {
            return Err(rejected(format!(
                "can't delete object {}: mo does not exist",
                mo.dn
            )));
        }
        MoStatus::Deleted | MoStatus::Removed => {
            remove_subtree(tree, &mo.dn);
            return Ok(());
        }
        MoStatus::Created if exists => {
            return Err(rejected(format!("object {} already exists", mo.dn)));
        }
        MoStatus::Modified if !exists => {
            return Err(rejected(format!("object {} does not exist", mo.dn)));
        }
        _ => {}
    }

    let entry = tree.entry(mo.dn.clone()).or_insert_with(|| {
        let mut fresh = ManagedObject::new(mo.class_id.clone(), mo.dn.clone());
        fresh.rn = mo.rn.clone();
        fresh
    });
    for (name, value) in &mo.attrs {
        entry.set_attr(name.clone(), value.clone());
    }

    for child in &mo.children {
        apply(tree, child)?;
    }
    Ok(())
}

#[async_trait]
impl LoginHandle for MockHandle {
    async fn query_dn(&mut self, dn: &str) -> UcsmResult<Option<ManagedObject>> {
        self.calls.push(HandleCall::QueryDn { dn: dn.to_string() });
        self.check_failure(MockOp::QueryDn)?;
        Ok(self.tree.get(dn).cloned())
    }

    async fn query_children(
        &mut self,
        dn: &str,
        class_id: &str,
    ) -> UcsmResult<Vec<ManagedObject>> {
        self.calls.push(HandleCall::QueryChildren {
            dn: dn.to_string(),
            class_id: class_id.to_string(),
        });
        self.check_failure(MockOp::QueryChildren)?;
        Ok(self
            .tree
            .values()
            .filter(|mo| mo.class_id == class_id && mo.parent_dn() == Some(dn))
            .cloned()
            .collect())
    }

    async fn remove_mo(&mut self, mo: &ManagedObject) -> UcsmResult<()> {
        self.calls.push(HandleCall::RemoveMo { dn: mo.dn.clone() });
        self.check_failure(MockOp::RemoveMo)?;
        self.staged.push(
            ManagedObject::new(mo.class_id.clone(), mo.dn.clone()).with_status(MoStatus::Deleted),
        );
        Ok(())
    }

    async fn add_mo(&mut self, mut mo: ManagedObject, modify_present: bool) -> UcsmResult<()> {
        self.calls.push(HandleCall::AddMo {
            mo: mo.clone(),
            modify_present,
        });
        self.check_failure(MockOp::AddMo)?;
        let status = if modify_present {
            MoStatus::CreatedModified
        } else {
            MoStatus::Created
        };
        mo.inherit_status(status);
        self.staged.push(mo);
        Ok(())
    }

    async fn commit(&mut self) -> UcsmResult<()> {
        self.calls.push(HandleCall::Commit);
        let staged = std::mem::take(&mut self.staged);
        self.check_failure(MockOp::Commit)?;

        let mut next = self.tree.clone();
        for mo in &staged {
            apply(&mut next, mo)?;
        }
        debug!(objects = staged.len(), "Mock commit applied");
        self.tree = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ManagedObject {
        ManagedObject::new("vnicLanConnTempl", "org-root/lan-conn-templ-A")
            .with_attr("name", "A")
            .with_child(
                ManagedObject::under("org-root/lan-conn-templ-A", "vnicEtherIf", "if-default")
                    .with_attr("defaultNet", "yes"),
            )
    }

    #[test]
    fn test_seed_flattens_children() {
        let handle = MockHandle::new().with_mo(template());
        assert_eq!(
            handle.dns(),
            vec!["org-root/lan-conn-templ-A", "org-root/lan-conn-templ-A/if-default"]
        );
        assert!(handle
            .get("org-root/lan-conn-templ-A")
            .unwrap()
            .children
            .is_empty());
    }

    #[test]
    fn test_remove_subtree() {
        let mut tree = BTreeMap::new();
        flatten_into(&mut tree, template());
        tree.insert(
            "org-root/lan-conn-templ-AB".to_string(),
            ManagedObject::new("vnicLanConnTempl", "org-root/lan-conn-templ-AB"),
        );

        remove_subtree(&mut tree, "org-root/lan-conn-templ-A");

        let left: Vec<&String> = tree.keys().collect();
        assert_eq!(left, vec!["org-root/lan-conn-templ-AB"]);
    }

    #[tokio::test]
    async fn test_staged_changes_wait_for_commit() {
        let mut handle = MockHandle::new().with_mo(template());
        let child = handle
            .get("org-root/lan-conn-templ-A/if-default")
            .cloned()
            .unwrap();

        handle.remove_mo(&child).await.unwrap();
        assert!(handle.contains("org-root/lan-conn-templ-A/if-default"));
        assert_eq!(handle.pending_changes(), 1);

        handle.commit().await.unwrap();
        assert!(!handle.contains("org-root/lan-conn-templ-A/if-default"));
        assert_eq!(handle.pending_changes(), 0);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let mut handle = MockHandle::new().fail_on(MockOp::QueryDn, "connection refused");
        let err = handle.query_dn("org-root").await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(handle.calls().len(), 1);
    }
}
