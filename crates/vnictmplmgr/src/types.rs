//! Type definitions for vnictmplmgr

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use ucsm_common::{defaults, ModuleState, UcsmError, UcsmResult};

/// Template names: 1 to 16 characters, no spaces.
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.:-]{1,16}$").expect("name regex"));

/// Descriptions: at most 256 characters, none of `` ` \ ^ " = > < ' ``.
static DESCR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[^`\\^"=<>']{0,256}$"#).expect("description regex"));

/// Lowest accepted MTU
pub const MIN_MTU: u32 = 1500;

/// Highest accepted MTU
pub const MAX_MTU: u32 = 9000;

/// Declares a closed set of UCSM attribute values.
macro_rules! attr_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $value)] $variant, )+
        }

        impl $name {
            /// Value as written in the UCSM attribute
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $value, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UcsmError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $value => Ok($name::$variant), )+
                    other => Err(UcsmError::invalid_config(
                        $field,
                        format!("unsupported value '{}'", other),
                    )),
                }
            }
        }
    };
}

attr_enum! {
    /// Fabric interconnect a vNIC is pinned to, with optional failover
    Fabric, "fabric" {
        #[default]
        A => "A",
        B => "B",
        AB => "A-B",
        BA => "B-A",
    }
}

attr_enum! {
    /// Role of the template in a redundancy pair
    RedundancyType, "redundancy_type" {
        #[default]
        NoRedundancy => "none",
        Primary => "primary",
        Secondary => "secondary",
    }
}

attr_enum! {
    /// Where vNICs created from the template are placed
    Target, "target" {
        #[default]
        Adapter => "adapter",
        Vm => "vm",
    }
}

attr_enum! {
    /// Whether template changes propagate to bound vNICs
    TemplateType, "template_type" {
        #[default]
        Initial => "initial-template",
        Updating => "updating-template",
    }
}

attr_enum! {
    /// Source of the consistent device name
    CdnSource, "cdn_source" {
        #[default]
        VnicName => "vnic-name",
        UserDefined => "user-defined",
    }
}

/// A `yes`/`no` flag
///
/// Declarations may also spell it as a YAML boolean.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Yes => "yes",
            YesNo::No => "no",
        }
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            YesNo::Yes
        } else {
            YesNo::No
        }
    }
}

impl FromStr for YesNo {
    type Err = UcsmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" | "true" => Ok(YesNo::Yes),
            "no" | "false" => Ok(YesNo::No),
            other => Err(UcsmError::invalid_config(
                "native",
                format!("'{}' is not one of yes, no", other),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for YesNo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bool(bool),
            Str(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bool(b) => Ok(b.into()),
            Repr::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Accepts `mtu: 9000` as well as `mtu: "9000"`.
fn deserialize_mtu<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Str(String),
    }

    Ok(Option::<Repr>::deserialize(deserializer)?.map(|r| match r {
        Repr::Num(n) => n.to_string(),
        Repr::Str(s) => s,
    }))
}

fn default_org_dn() -> String {
    defaults::DEFAULT_ORG_DN.to_string()
}

/// One declared VLAN attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VlanEntry {
    /// VLAN name as known to UCSM
    pub name: String,
    /// Native (untagged) VLAN flag
    #[serde(default)]
    pub native: YesNo,
    /// Accepted for compatibility; never drives removal
    #[serde(default)]
    pub state: ModuleState,
}

impl VlanEntry {
    /// Create a VLAN entry in state `present`
    pub fn new(name: impl Into<String>, native: YesNo) -> Self {
        Self {
            name: name.into(),
            native,
            state: ModuleState::Present,
        }
    }
}

/// Declared vNIC template
///
/// Template attributes are optional. A declared attribute is reconciled
/// against the appliance; an undeclared one is only filled with its default
/// when the template is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnicTemplateParams {
    /// Organization the template lives in
    #[serde(default = "default_org_dn")]
    pub org_dn: String,
    /// Template name
    pub name: String,
    /// Declared VLAN attachments
    #[serde(default)]
    pub vlans_list: Vec<VlanEntry>,
    /// Desired state of the declared VLANs
    #[serde(default)]
    pub state: ModuleState,

    #[serde(default, alias = "descr")]
    pub description: Option<String>,
    #[serde(default)]
    pub fabric: Option<Fabric>,
    #[serde(default)]
    pub redundancy_type: Option<RedundancyType>,
    #[serde(default, alias = "peer_redundancy_templ")]
    pub peer_redundancy_template: Option<String>,
    #[serde(default)]
    pub target: Option<Target>,
    #[serde(default)]
    pub template_type: Option<TemplateType>,
    #[serde(default)]
    pub cdn_source: Option<CdnSource>,
    #[serde(default)]
    pub cdn_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_mtu")]
    pub mtu: Option<String>,
    #[serde(default)]
    pub mac_pool: Option<String>,
    #[serde(default)]
    pub qos_policy: Option<String>,
    #[serde(default)]
    pub network_control_policy: Option<String>,
    #[serde(default)]
    pub pin_group: Option<String>,
    #[serde(default)]
    pub stats_policy: Option<String>,
}

impl VnicTemplateParams {
    /// Create a declaration naming only the template and its VLANs
    pub fn new(name: impl Into<String>, vlans_list: Vec<VlanEntry>) -> Self {
        Self {
            org_dn: default_org_dn(),
            name: name.into(),
            vlans_list,
            state: ModuleState::Present,
            description: None,
            fabric: None,
            redundancy_type: None,
            peer_redundancy_template: None,
            target: None,
            template_type: None,
            cdn_source: None,
            cdn_name: None,
            mtu: None,
            mac_pool: None,
            qos_policy: None,
            network_control_policy: None,
            pin_group: None,
            stats_policy: None,
        }
    }

    /// Set the desired state
    pub fn with_state(mut self, state: ModuleState) -> Self {
        self.state = state;
        self
    }

    /// Validates the declaration and rewrites `mtu` in canonical form, so
    /// `"01500"` is compared and sent as `"1500"`
    pub fn normalized(mut self) -> UcsmResult<Self> {
        self.validate()?;
        if let Some(mtu) = self.mtu.take() {
            let value: u32 = mtu.parse().map_err(|_| {
                UcsmError::invalid_config("mtu", format!("'{}' is not a number", mtu))
            })?;
            self.mtu = Some(value.to_string());
        }
        Ok(self)
    }

    /// Check the declaration before any remote call
    pub fn validate(&self) -> UcsmResult<()> {
        if self.org_dn.trim().is_empty() {
            return Err(UcsmError::invalid_config("org_dn", "must not be empty"));
        }

        if !NAME_RE.is_match(&self.name) {
            return Err(UcsmError::invalid_config(
                "name",
                format!(
                    "'{}' must be 1 to 16 characters from A-Z a-z 0-9 _ . : -",
                    self.name
                ),
            ));
        }

        if self.vlans_list.is_empty() {
            return Err(UcsmError::invalid_config(
                "vlans_list",
                "at least one VLAN is required",
            ));
        }
        if let Some(i) = self.vlans_list.iter().position(|v| v.name.trim().is_empty()) {
            return Err(UcsmError::invalid_config(
                "vlans_list",
                format!("entry {} has an empty name", i),
            ));
        }

        if let Some(descr) = &self.description {
            if !DESCR_RE.is_match(descr) {
                return Err(UcsmError::invalid_config(
                    "description",
                    "must be at most 256 characters and must not contain ` \\ ^ \" = > < '",
                ));
            }
        }

        if let Some(mtu) = &self.mtu {
            match mtu.parse::<u32>() {
                Ok(v) if (MIN_MTU..=MAX_MTU).contains(&v) => {}
                _ => {
                    return Err(UcsmError::invalid_config(
                        "mtu",
                        format!("'{}' is not a number between {} and {}", mtu, MIN_MTU, MAX_MTU),
                    ))
                }
            }
        }

        if self.cdn_source == Some(CdnSource::UserDefined)
            && self.cdn_name.as_deref().map_or(true, |n| n.trim().is_empty())
        {
            return Err(UcsmError::invalid_config(
                "cdn_name",
                "is required when cdn_source is user-defined",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlans() -> Vec<VlanEntry> {
        vec![VlanEntry::new("default", YesNo::Yes)]
    }

    #[test]
    fn test_attr_enum_round_trip_names() {
        assert_eq!("A-B".parse::<Fabric>().unwrap(), Fabric::AB);
        assert_eq!(Fabric::BA.as_str(), "B-A");
        assert_eq!(Fabric::default(), Fabric::A);
        assert_eq!(RedundancyType::default().as_str(), "none");
        assert_eq!(TemplateType::Updating.to_string(), "updating-template");
        assert_eq!(CdnSource::default(), CdnSource::VnicName);
        assert!("C".parse::<Fabric>().is_err());
        assert!("vmware".parse::<Target>().is_err());
    }

    #[test]
    fn test_yes_no() {
        assert_eq!("yes".parse::<YesNo>().unwrap(), YesNo::Yes);
        assert_eq!("no".parse::<YesNo>().unwrap(), YesNo::No);
        assert!("maybe".parse::<YesNo>().is_err());
        assert_eq!(YesNo::from(true), YesNo::Yes);
        assert_eq!(YesNo::default(), YesNo::No);
    }

    #[test]
    fn test_vlan_entry_from_yaml() {
        let entries: Vec<VlanEntry> = serde_yaml::from_str(
            "- name: default\n  native: 'yes'\n- name: v100\n- name: v200\n  native: true\n  state: absent\n",
        )
        .unwrap();

        assert_eq!(entries[0].native, YesNo::Yes);
        assert_eq!(entries[1].native, YesNo::No);
        assert_eq!(entries[1].state, ModuleState::Present);
        assert_eq!(entries[2].native, YesNo::Yes);
        assert_eq!(entries[2].state, ModuleState::Absent);
    }

    #[test]
    fn test_params_aliases_and_mtu_number() {
        let params: VnicTemplateParams = serde_yaml::from_str(
            "name: vNIC-A\nvlans_list:\n  - name: default\ndescr: lab\npeer_redundancy_templ: vNIC-B\nmtu: 9000\nfabric: A-B\n",
        )
        .unwrap();

        assert_eq!(params.org_dn, "org-root");
        assert_eq!(params.description.as_deref(), Some("lab"));
        assert_eq!(params.peer_redundancy_template.as_deref(), Some("vNIC-B"));
        assert_eq!(params.mtu.as_deref(), Some("9000"));
        assert_eq!(params.fabric, Some(Fabric::AB));
        assert_eq!(params.state, ModuleState::Present);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_validate_name() {
        assert!(VnicTemplateParams::new("vNIC-A", vlans()).validate().is_ok());
        assert!(VnicTemplateParams::new("", vlans()).validate().is_err());
        assert!(VnicTemplateParams::new("has space", vlans()).validate().is_err());
        assert!(VnicTemplateParams::new("a-very-long-name-x", vlans())
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_vlans() {
        assert!(VnicTemplateParams::new("vNIC-A", vec![]).validate().is_err());
        assert!(
            VnicTemplateParams::new("vNIC-A", vec![VlanEntry::new(" ", YesNo::No)])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_validate_mtu() {
        let mut params = VnicTemplateParams::new("vNIC-A", vlans());
        params.mtu = Some("9000".to_string());
        assert!(params.validate().is_ok());

        params.mtu = Some("1499".to_string());
        assert!(params.validate().is_err());

        params.mtu = Some("jumbo".to_string());
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("mtu"));
    }

    #[test]
    fn test_normalized_mtu_is_canonical() {
        let mut params = VnicTemplateParams::new("vNIC-A", vlans());
        params.mtu = Some("01500".to_string());
        assert_eq!(params.clone().normalized().unwrap().mtu.as_deref(), Some("1500"));

        params.mtu = Some("+9000".to_string());
        assert_eq!(params.clone().normalized().unwrap().mtu.as_deref(), Some("9000"));

        params.mtu = None;
        assert_eq!(params.clone().normalized().unwrap().mtu, None);

        params.mtu = Some("10000".to_string());
        assert!(params.normalized().is_err());
    }

    #[test]
    fn test_validate_description() {
        let mut params = VnicTemplateParams::new("vNIC-A", vlans());
        params.description = Some("uplink to lab".to_string());
        assert!(params.validate().is_ok());

        params.description = Some("a=b".to_string());
        assert!(params.validate().is_err());

        params.description = Some("x".repeat(257));
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_cdn_name() {
        let mut params = VnicTemplateParams::new("vNIC-A", vlans());
        params.cdn_source = Some(CdnSource::UserDefined);
        assert!(params.validate().is_err());

        params.cdn_name = Some("eth-lab".to_string());
        assert!(params.validate().is_ok());
    }
}
