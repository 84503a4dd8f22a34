//! VnicTemplateMgr - vNIC template VLAN reconciler

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

use ucsm_common::{LoginHandle, ManagedObject, ModuleState, UcsTask, UcsmResult};

use crate::builders::{build_template, build_vlan_if, build_vlan_if_delete, template_attr_mismatches};
use crate::classes::{fields, template_dn, vlan_if_dn, vlan_if_rn, VLAN_IF_CLASS};
use crate::types::VnicTemplateParams;

/// VnicTemplateMgr reconciles one declared vNIC template
///
/// Reconciliation flow:
/// 1. `absent` → delete the declared VLAN interfaces that exist
/// 2. `present` → compare template attributes and VLAN interfaces; on any
///    difference resubmit the template with its full VLAN set in one commit
pub struct VnicTemplateMgr {
    /// Validated declaration
    params: VnicTemplateParams,

    /// Skip remove/add/commit
    check_mode: bool,
}

impl VnicTemplateMgr {
    /// Creates a reconciler after validating the declaration
    pub fn new(params: VnicTemplateParams) -> UcsmResult<Self> {
        Ok(Self {
            params: params.normalized()?,
            check_mode: false,
        })
    }

    /// Enables or disables check mode
    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    /// Declaration being reconciled
    pub fn params(&self) -> &VnicTemplateParams {
        &self.params
    }

    /// Dn of the declared template
    pub fn template_dn(&self) -> String {
        template_dn(&self.params.org_dn, &self.params.name)
    }

    /// Removes the declared VLAN interfaces that exist on the appliance
    #[instrument(skip(self, handle))]
    async fn reconcile_absent(&self, handle: &mut dyn LoginHandle, dn: &str) -> UcsmResult<bool> {
        if handle.query_dn(dn).await?.is_none() {
            debug!("Template not present, nothing to remove");
            return Ok(false);
        }

        let mut existing = Vec::new();
        for vlan in &self.params.vlans_list {
            let child_dn = vlan_if_dn(dn, &vlan.name);
            match handle.query_dn(&child_dn).await? {
                Some(child) => existing.push(child),
                None => debug!("VLAN {} not attached", vlan.name),
            }
        }

        if existing.is_empty() {
            return Ok(false);
        }

        if !self.check_mode {
            for child in &existing {
                handle.remove_mo(child).await?;
            }
            handle.commit().await?;
        }

        info!("Removed {} VLAN(s) from {}", existing.len(), dn);
        Ok(true)
    }

    /// Scans the declared VLANs; false on the first missing or mismatched one
    async fn declared_vlans_match(
        &self,
        handle: &mut dyn LoginHandle,
        dn: &str,
    ) -> UcsmResult<bool> {
        for vlan in &self.params.vlans_list {
            let child_dn = vlan_if_dn(dn, &vlan.name);
            let Some(child) = handle.query_dn(&child_dn).await? else {
                debug!("VLAN {} missing", vlan.name);
                return Ok(false);
            };
            if !child.check_prop_match(&[(fields::DEFAULT_NET, vlan.native.as_str())]) {
                debug!(
                    "VLAN {} native flag is {:?}, want {}",
                    vlan.name,
                    child.get_attr(fields::DEFAULT_NET),
                    vlan.native.as_str()
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Remote VLAN interfaces the declaration does not name
    async fn undeclared_vlans(
        &self,
        handle: &mut dyn LoginHandle,
        dn: &str,
    ) -> UcsmResult<Vec<ManagedObject>> {
        let declared: HashSet<String> = self
            .params
            .vlans_list
            .iter()
            .map(|v| vlan_if_rn(&v.name))
            .collect();

        let extras: Vec<ManagedObject> = handle
            .query_children(dn, VLAN_IF_CLASS)
            .await?
            .into_iter()
            .filter(|child| !declared.contains(&child.rn))
            .collect();

        for extra in &extras {
            debug!("Undeclared VLAN interface {}", extra.dn);
        }
        Ok(extras)
    }

    /// Brings the template and its VLAN set in line with the declaration
    #[instrument(skip(self, handle))]
    async fn reconcile_present(&self, handle: &mut dyn LoginHandle, dn: &str) -> UcsmResult<bool> {
        for vlan in &self.params.vlans_list {
            if vlan.state == ModuleState::Absent {
                warn!(
                    "VLAN {} is declared absent; per-VLAN state is ignored, keeping it attached",
                    vlan.name
                );
            }
        }

        let remote = handle.query_dn(dn).await?;

        let (creating, in_sync, extras) = match &remote {
            None => {
                info!("Template {} not present, creating it", dn);
                (true, false, Vec::new())
            }
            Some(template) => {
                let mismatched = template_attr_mismatches(template, &self.params);
                if !mismatched.is_empty() {
                    info!("Template attributes differ: {}", mismatched.join(", "));
                }
                let vlans_match = self.declared_vlans_match(handle, dn).await?;
                let extras = self.undeclared_vlans(handle, dn).await?;
                (
                    false,
                    mismatched.is_empty() && vlans_match && extras.is_empty(),
                    extras,
                )
            }
        };

        if in_sync {
            debug!("Template {} up to date", dn);
            return Ok(false);
        }

        let mut template = build_template(&self.params, creating);
        for vlan in &self.params.vlans_list {
            template = template.with_child(build_vlan_if(dn, &vlan.name, vlan.native));
        }
        for extra in &extras {
            template = template.with_child(build_vlan_if_delete(extra));
        }

        if !self.check_mode {
            handle.add_mo(template, true).await?;
            handle.commit().await?;
        }

        info!(
            "Submitted {} with {} VLAN(s), {} removed",
            dn,
            self.params.vlans_list.len(),
            extras.len()
        );
        Ok(true)
    }
}

#[async_trait]
impl UcsTask for VnicTemplateMgr {
    fn task_name(&self) -> &str {
        "vnic_template"
    }

    fn is_check_mode(&self) -> bool {
        self.check_mode
    }

    async fn reconcile(&self, handle: &mut dyn LoginHandle) -> UcsmResult<bool> {
        let dn = self.template_dn();
        info!(
            "Reconciling {} (state={}, check_mode={})",
            dn, self.params.state, self.check_mode
        );

        match self.params.state {
            ModuleState::Present => self.reconcile_present(handle, &dn).await,
            ModuleState::Absent => self.reconcile_absent(handle, &dn).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{VlanEntry, YesNo};
    use ucsm_test::fixtures::{template_fixtures, ORG_ROOT};
    use ucsm_test::{HandleVerifier, MockHandle};

    fn declared(vlans: &[(&str, YesNo)]) -> VnicTemplateParams {
        VnicTemplateParams::new(
            "vNIC-A",
            vlans
                .iter()
                .map(|(name, native)| VlanEntry::new(*name, *native))
                .collect(),
        )
    }

    #[test]
    fn test_new_rejects_invalid_declaration() {
        assert!(VnicTemplateMgr::new(declared(&[])).is_err());
    }

    #[test]
    fn test_template_dn() {
        let mgr = VnicTemplateMgr::new(declared(&[("default", YesNo::Yes)])).unwrap();
        assert_eq!(mgr.template_dn(), "org-root/lan-conn-templ-vNIC-A");
        assert_eq!(mgr.task_name(), "vnic_template");
        assert!(!mgr.is_check_mode());
        assert!(mgr.with_check_mode(true).is_check_mode());
    }

    #[tokio::test]
    async fn test_undeclared_vlans() {
        let mut handle = MockHandle::new().with_mo(template_fixtures::template_with_vlans(
            ORG_ROOT,
            "vNIC-A",
            &[("default", "yes"), ("v100", "no")],
        ));
        let mgr = VnicTemplateMgr::new(declared(&[("default", YesNo::Yes)])).unwrap();

        let extras = mgr
            .undeclared_vlans(&mut handle, "org-root/lan-conn-templ-vNIC-A")
            .await
            .unwrap();

        let rns: Vec<&str> = extras.iter().map(|e| e.rn.as_str()).collect();
        assert_eq!(rns, vec!["if-v100"]);
    }

    #[tokio::test]
    async fn test_declared_vlans_short_circuit_on_first_miss() {
        let mut handle = MockHandle::new().with_mo(template_fixtures::template_with_vlans(
            ORG_ROOT,
            "vNIC-A",
            &[("v200", "no")],
        ));
        let mgr = VnicTemplateMgr::new(declared(&[
            ("default", YesNo::Yes),
            ("v200", YesNo::No),
        ]))
        .unwrap();

        let matched = mgr
            .declared_vlans_match(&mut handle, "org-root/lan-conn-templ-vNIC-A")
            .await
            .unwrap();

        assert!(!matched);
        assert_eq!(handle.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_absent_state_vlan_is_kept() {
        let mut handle = MockHandle::new().with_mo(template_fixtures::template_with_vlans(
            ORG_ROOT,
            "vNIC-A",
            &[("default", "yes")],
        ));
        let mut params = declared(&[("default", YesNo::Yes)]);
        params.vlans_list[0].state = ModuleState::Absent;
        let mgr = VnicTemplateMgr::new(params).unwrap();

        let result = mgr.run(&mut handle).await;

        assert!(!result.changed);
        assert!(!result.failed);
        let verifier = HandleVerifier::new(&handle);
        verifier.assert_no_mutations().unwrap();
        verifier
            .assert_mo_exists("org-root/lan-conn-templ-vNIC-A/if-default")
            .unwrap();
    }

    #[tokio::test]
    async fn test_padded_mtu_matches_stored_value() {
        let mut handle = MockHandle::new().with_mo(template_fixtures::template_with_vlans(
            ORG_ROOT,
            "vNIC-A",
            &[("default", "yes")],
        ));
        let mut params = declared(&[("default", YesNo::Yes)]);
        params.mtu = Some("01500".to_string());
        let mgr = VnicTemplateMgr::new(params).unwrap();

        assert_eq!(mgr.params().mtu.as_deref(), Some("1500"));
        let result = mgr.run(&mut handle).await;

        assert!(!result.changed);
        HandleVerifier::new(&handle).assert_no_mutations().unwrap();
    }
}
