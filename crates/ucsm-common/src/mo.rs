//! Managed-object model.
//!
//! A [`ManagedObject`] is one node of the UCS Manager configuration tree. It
//! carries its class, its distinguished name, an optional config status used
//! when it is submitted, its remaining XML attributes and any children that
//! travel with it in a hierarchical request.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::UcsmError;

/// Config status attached to an object submitted with `configConfMos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoStatus {
    /// Create, fail if it exists.
    Created,
    /// Modify, fail if it does not exist.
    Modified,
    /// Create or modify (upsert).
    CreatedModified,
    /// Delete, fail if it does not exist.
    Deleted,
    /// Delete if it exists.
    Removed,
}

impl MoStatus {
    /// Returns the status as written in the `status` XML attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            MoStatus::Created => "created",
            MoStatus::Modified => "modified",
            MoStatus::CreatedModified => "created,modified",
            MoStatus::Deleted => "deleted",
            MoStatus::Removed => "removed",
        }
    }

    /// Returns true for the two delete flavours.
    pub fn is_delete(&self) -> bool {
        matches!(self, MoStatus::Deleted | MoStatus::Removed)
    }
}

impl fmt::Display for MoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoStatus {
    type Err = UcsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "created" => MoStatus::Created,
            "modified" => MoStatus::Modified,
            "created,modified" | "modified,created" => MoStatus::CreatedModified,
            "deleted" => MoStatus::Deleted,
            "removed" => MoStatus::Removed,
            other => return Err(UcsmError::xml(format!("unknown mo status '{}'", other))),
        })
    }
}

/// A node of the UCS Manager managed-object tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedObject {
    /// XML class id (e.g., "vnicLanConnTempl").
    pub class_id: String,
    /// Distinguished name.
    pub dn: String,
    /// Relative name (last dn segment).
    pub rn: String,
    /// Config status when the object is submitted.
    pub status: Option<MoStatus>,
    /// Remaining attributes, keyed by XML attribute name.
    pub attrs: BTreeMap<String, String>,
    /// Child objects carried with this one.
    pub children: Vec<ManagedObject>,
}

impl ManagedObject {
    /// Creates an object addressed by its full dn.
    pub fn new(class_id: impl Into<String>, dn: impl Into<String>) -> Self {
        let dn = dn.into();
        Self {
            class_id: class_id.into(),
            rn: rn_of(&dn).to_string(),
            dn,
            ..Default::default()
        }
    }

    /// Creates an object named `rn` under `parent_dn`.
    pub fn under(parent_dn: &str, class_id: impl Into<String>, rn: impl Into<String>) -> Self {
        let rn = rn.into();
        Self {
            class_id: class_id.into(),
            dn: format!("{}/{}", parent_dn, rn),
            rn,
            ..Default::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style status setter.
    pub fn with_status(mut self, status: MoStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: ManagedObject) -> Self {
        self.children.push(child);
        self
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Gets an attribute value, if present.
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Returns true when every `(attribute, value)` pair equals this
    /// object's value. A missing attribute never matches.
    pub fn check_prop_match(&self, props: &[(&str, &str)]) -> bool {
        props
            .iter()
            .all(|(name, expected)| self.get_attr(name) == Some(*expected))
    }

    /// Dn of the parent object, if this is not a root.
    pub fn parent_dn(&self) -> Option<&str> {
        parent_dn_of(&self.dn)
    }

    /// Finds a direct child by rn.
    pub fn child(&self, rn: &str) -> Option<&ManagedObject> {
        self.children.iter().find(|c| c.rn == rn)
    }

    /// Applies `status` to every object in the tree that has none of its own.
    pub fn inherit_status(&mut self, status: MoStatus) {
        if self.status.is_none() {
            self.status = Some(status);
        }
        for child in &mut self.children {
            child.inherit_status(status);
        }
    }
}

/// Index of the last `/` separating dn segments. Slashes inside `[...]`
/// (e.g., `port-[1/2]`) belong to the segment.
fn last_separator(dn: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut last = None;
    for (i, c) in dn.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => last = Some(i),
            _ => {}
        }
    }
    last
}

/// Returns the relative name (last segment) of a dn.
pub fn rn_of(dn: &str) -> &str {
    match last_separator(dn) {
        Some(i) => &dn[i + 1..],
        None => dn,
    }
}

/// Returns the parent dn, or `None` for a root-level dn.
pub fn parent_dn_of(dn: &str) -> Option<&str> {
    last_separator(dn).map(|i| &dn[..i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inherit_status_keeps_explicit() {
        let mut mo = ManagedObject::new("vnicLanConnTempl", "org-root/lan-conn-templ-A")
            .with_child(ManagedObject::under(
                "org-root/lan-conn-templ-A",
                "vnicEtherIf",
                "if-a",
            ))
            .with_child(
                ManagedObject::under("org-root/lan-conn-templ-A", "vnicEtherIf", "if-b")
                    .with_status(MoStatus::Deleted),
            );

        mo.inherit_status(MoStatus::CreatedModified);

        assert_eq!(mo.status, Some(MoStatus::CreatedModified));
        assert_eq!(mo.children[0].status, Some(MoStatus::CreatedModified));
        assert_eq!(mo.children[1].status, Some(MoStatus::Deleted));
    }

    #[test]
    fn test_rn_and_parent() {
        assert_eq!(rn_of("org-root/lan-conn-templ-A"), "lan-conn-templ-A");
        assert_eq!(rn_of("org-root"), "org-root");
        assert_eq!(parent_dn_of("org-root/lan-conn-templ-A"), Some("org-root"));
        assert_eq!(parent_dn_of("org-root"), None);
    }

    #[test]
    fn test_rn_with_brackets() {
        assert_eq!(rn_of("sys/switch-A/slot-1/port-[1/2]"), "port-[1/2]");
        assert_eq!(
            parent_dn_of("sys/switch-A/slot-1/port-[1/2]"),
            Some("sys/switch-A/slot-1")
        );
    }

    #[test]
    fn test_under() {
        let mo = ManagedObject::under("org-root/lan-conn-templ-A", "vnicEtherIf", "if-default");
        assert_eq!(mo.dn, "org-root/lan-conn-templ-A/if-default");
        assert_eq!(mo.rn, "if-default");
        assert_eq!(mo.parent_dn(), Some("org-root/lan-conn-templ-A"));
    }

    #[test]
    fn test_check_prop_match() {
        let mo = ManagedObject::new("vnicEtherIf", "org-root/lan-conn-templ-A/if-default")
            .with_attr("name", "default")
            .with_attr("defaultNet", "yes");

        assert!(mo.check_prop_match(&[("defaultNet", "yes")]));
        assert!(mo.check_prop_match(&[("defaultNet", "yes"), ("name", "default")]));
        assert!(!mo.check_prop_match(&[("defaultNet", "no")]));
        assert!(!mo.check_prop_match(&[("mtu", "1500")]));
        assert!(mo.check_prop_match(&[]));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "created,modified".parse::<MoStatus>().unwrap(),
            MoStatus::CreatedModified
        );
        assert_eq!("deleted".parse::<MoStatus>().unwrap(), MoStatus::Deleted);
        assert!("bogus".parse::<MoStatus>().is_err());
        assert!(MoStatus::Removed.is_delete());
        assert!(!MoStatus::Created.is_delete());
    }
}
