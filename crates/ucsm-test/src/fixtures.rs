//! Test fixtures for UCS Manager objects
//!
//! Builds the remote objects a task usually finds on the appliance, with the
//! attribute values UCS Manager fills in for a freshly created object.

use ucsm_common::ManagedObject;

/// Root organization dn.
pub const ORG_ROOT: &str = "org-root";

/// Organization class id.
pub const ORG_CLASS: &str = "orgOrg";

/// vNIC template class id.
pub const TEMPLATE_CLASS: &str = "vnicLanConnTempl";

/// VLAN interface class id.
pub const VLAN_IF_CLASS: &str = "vnicEtherIf";

/// Root organization object.
pub fn org_root() -> ManagedObject {
    ManagedObject::new(ORG_CLASS, ORG_ROOT).with_attr("name", "root")
}

/// Common vNIC template fixtures
pub mod template_fixtures {
    use super::*;

    /// Dn of template `name` under `org_dn`.
    pub fn template_dn(org_dn: &str, name: &str) -> String {
        format!("{}/lan-conn-templ-{}", org_dn, name)
    }

    /// Template with the appliance defaults and no VLANs.
    pub fn template(org_dn: &str, name: &str) -> ManagedObject {
        ManagedObject::new(TEMPLATE_CLASS, template_dn(org_dn, name))
            .with_attr("name", name)
            .with_attr("descr", "")
            .with_attr("switchId", "A")
            .with_attr("redundancyPairType", "none")
            .with_attr("peerRedundancyTemplName", "")
            .with_attr("target", "adapter")
            .with_attr("templType", "initial-template")
            .with_attr("cdnSource", "vnic-name")
            .with_attr("adminCdnName", "")
            .with_attr("mtu", "1500")
            .with_attr("identPoolName", "")
            .with_attr("qosPolicyName", "")
            .with_attr("nwCtrlPolicyName", "")
            .with_attr("pinToGroupName", "")
            .with_attr("statsPolicyName", "default")
    }

    /// VLAN interface child of `template_dn`.
    pub fn vlan_if(template_dn: &str, vlan: &str, default_net: &str) -> ManagedObject {
        ManagedObject::under(template_dn, VLAN_IF_CLASS, format!("if-{}", vlan))
            .with_attr("name", vlan)
            .with_attr("defaultNet", default_net)
    }

    /// Template carrying one VLAN interface per `(vlan, default_net)`.
    pub fn template_with_vlans(org_dn: &str, name: &str, vlans: &[(&str, &str)]) -> ManagedObject {
        let dn = template_dn(org_dn, name);
        vlans
            .iter()
            .fold(template(org_dn, name), |mo, (vlan, default_net)| {
                mo.with_child(vlan_if(&dn, vlan, default_net))
            })
    }
}
