//! Class ids, rn prefixes and attribute names for vNIC templates

/// vNIC template class id
pub const TEMPLATE_CLASS: &str = "vnicLanConnTempl";

/// VLAN interface class id
pub const VLAN_IF_CLASS: &str = "vnicEtherIf";

/// Template rn prefix
pub const TEMPLATE_RN_PREFIX: &str = "lan-conn-templ-";

/// VLAN interface rn prefix
pub const VLAN_IF_RN_PREFIX: &str = "if-";

/// Attribute names
pub mod fields {
    pub const NAME: &str = "name";
    pub const DESCR: &str = "descr";
    pub const SWITCH_ID: &str = "switchId";
    pub const REDUNDANCY_PAIR_TYPE: &str = "redundancyPairType";
    pub const PEER_REDUNDANCY_TEMPL_NAME: &str = "peerRedundancyTemplName";
    pub const TARGET: &str = "target";
    pub const TEMPL_TYPE: &str = "templType";
    pub const CDN_SOURCE: &str = "cdnSource";
    pub const ADMIN_CDN_NAME: &str = "adminCdnName";
    pub const MTU: &str = "mtu";
    pub const IDENT_POOL_NAME: &str = "identPoolName";
    pub const QOS_POLICY_NAME: &str = "qosPolicyName";
    pub const NW_CTRL_POLICY_NAME: &str = "nwCtrlPolicyName";
    pub const PIN_TO_GROUP_NAME: &str = "pinToGroupName";
    pub const STATS_POLICY_NAME: &str = "statsPolicyName";

    /// Native VLAN flag on a VLAN interface
    pub const DEFAULT_NET: &str = "defaultNet";
}

/// Dn of template `name` under `org_dn`
pub fn template_dn(org_dn: &str, name: &str) -> String {
    format!("{}/{}{}", org_dn, TEMPLATE_RN_PREFIX, name)
}

/// Rn of the VLAN interface for `vlan`
pub fn vlan_if_rn(vlan: &str) -> String {
    format!("{}{}", VLAN_IF_RN_PREFIX, vlan)
}

/// Dn of the VLAN interface for `vlan` under `template_dn`
pub fn vlan_if_dn(template_dn: &str, vlan: &str) -> String {
    format!("{}/{}", template_dn, vlan_if_rn(vlan))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dn_scheme() {
        let dn = template_dn("org-root", "vNIC-A");
        assert_eq!(dn, "org-root/lan-conn-templ-vNIC-A");
        assert_eq!(vlan_if_dn(&dn, "default"), "org-root/lan-conn-templ-vNIC-A/if-default");
        assert_eq!(
            template_dn("org-root/org-Finance", "eth0"),
            "org-root/org-Finance/lan-conn-templ-eth0"
        );
    }
}
