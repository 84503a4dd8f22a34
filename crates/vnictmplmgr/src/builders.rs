//! Managed-object builders for vNIC templates

use ucsm_common::{ManagedObject, MoStatus};

use crate::classes::{fields, template_dn, vlan_if_rn, TEMPLATE_CLASS, VLAN_IF_CLASS};
use crate::types::{CdnSource, Fabric, RedundancyType, Target, TemplateType, VnicTemplateParams, YesNo};

/// Default MTU for a newly created template
pub const DEFAULT_MTU: &str = "1500";

/// Default statistics threshold policy
pub const DEFAULT_STATS_POLICY: &str = "default";

/// Build a VLAN interface child of `parent_dn`
pub fn build_vlan_if(parent_dn: &str, name: &str, default_net: YesNo) -> ManagedObject {
    ManagedObject::under(parent_dn, VLAN_IF_CLASS, vlan_if_rn(name))
        .with_attr(fields::NAME, name)
        .with_attr(fields::DEFAULT_NET, default_net.as_str())
}

/// Build a `status="deleted"` entry for a remote VLAN interface, to travel
/// inside its parent
pub fn build_vlan_if_delete(remote: &ManagedObject) -> ManagedObject {
    let parent_dn = remote.parent_dn().unwrap_or_default();
    ManagedObject::under(parent_dn, VLAN_IF_CLASS, remote.rn.clone()).with_status(MoStatus::Deleted)
}

/// Template attributes named by the declaration, as UCSM attribute pairs
pub fn declared_template_attrs(params: &VnicTemplateParams) -> Vec<(&'static str, String)> {
    let mut attrs = Vec::new();
    let mut push = |name: &'static str, value: Option<String>| {
        if let Some(value) = value {
            attrs.push((name, value));
        }
    };

    push(fields::DESCR, params.description.clone());
    push(fields::SWITCH_ID, params.fabric.map(|v| v.as_str().to_string()));
    push(
        fields::REDUNDANCY_PAIR_TYPE,
        params.redundancy_type.map(|v| v.as_str().to_string()),
    );
    push(
        fields::PEER_REDUNDANCY_TEMPL_NAME,
        params.peer_redundancy_template.clone(),
    );
    push(fields::TARGET, params.target.map(|v| v.as_str().to_string()));
    push(
        fields::TEMPL_TYPE,
        params.template_type.map(|v| v.as_str().to_string()),
    );
    push(
        fields::CDN_SOURCE,
        params.cdn_source.map(|v| v.as_str().to_string()),
    );
    push(fields::ADMIN_CDN_NAME, params.cdn_name.clone());
    push(fields::MTU, params.mtu.clone());
    push(fields::IDENT_POOL_NAME, params.mac_pool.clone());
    push(fields::QOS_POLICY_NAME, params.qos_policy.clone());
    push(
        fields::NW_CTRL_POLICY_NAME,
        params.network_control_policy.clone(),
    );
    push(fields::PIN_TO_GROUP_NAME, params.pin_group.clone());
    push(fields::STATS_POLICY_NAME, params.stats_policy.clone());

    attrs
}

/// Defaults applied to attributes the declaration leaves out when the
/// template is created
fn creation_defaults() -> [(&'static str, &'static str); 7] {
    [
        (fields::SWITCH_ID, Fabric::default().as_str()),
        (
            fields::REDUNDANCY_PAIR_TYPE,
            RedundancyType::default().as_str(),
        ),
        (fields::TARGET, Target::default().as_str()),
        (fields::TEMPL_TYPE, TemplateType::default().as_str()),
        (fields::CDN_SOURCE, CdnSource::default().as_str()),
        (fields::MTU, DEFAULT_MTU),
        (fields::STATS_POLICY_NAME, DEFAULT_STATS_POLICY),
    ]
}

/// Declared template attributes whose remote value differs
pub fn template_attr_mismatches(
    remote: &ManagedObject,
    params: &VnicTemplateParams,
) -> Vec<&'static str> {
    declared_template_attrs(params)
        .into_iter()
        .filter(|(name, value)| !remote.check_prop_match(&[(*name, value.as_str())]))
        .map(|(name, _)| name)
        .collect()
}

/// Build the template object, without children
///
/// Carries the declared attributes; with `creating`, unset attributes get
/// their defaults.
pub fn build_template(params: &VnicTemplateParams, creating: bool) -> ManagedObject {
    let mut mo = ManagedObject::new(TEMPLATE_CLASS, template_dn(&params.org_dn, &params.name))
        .with_attr(fields::NAME, params.name.as_str());

    if creating {
        for (name, value) in creation_defaults() {
            mo.set_attr(name, value);
        }
    }
    for (name, value) in declared_template_attrs(params) {
        mo.set_attr(name, value);
    }

    mo
}
