//! Params file loading
//!
//! A params file is one YAML (or JSON) mapping holding both the connection
//! fields and the template declaration, the shape of an automation task's
//! arguments:
//!
//! ```yaml
//! hostname: ucsm.example.net
//! username: admin
//! name: vNIC-A
//! fabric: A-B
//! vlans_list:
//!   - name: default
//!     native: 'yes'
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ucsm_common::{defaults, ConnectionConfig, UcsmError, UcsmResult};

use crate::types::VnicTemplateParams;

/// Connection fields, each optional so the command line can fill or
/// override them
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionParams {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub use_ssl: Option<bool>,
    #[serde(default)]
    pub use_proxy: Option<bool>,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub validate_certs: Option<bool>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConnectionParams {
    /// Fields set in `overrides` win over this one
    pub fn overridden_by(self, overrides: ConnectionParams) -> Self {
        Self {
            hostname: overrides.hostname.or(self.hostname),
            username: overrides.username.or(self.username),
            password: overrides.password.or(self.password),
            port: overrides.port.or(self.port),
            use_ssl: overrides.use_ssl.or(self.use_ssl),
            use_proxy: overrides.use_proxy.or(self.use_proxy),
            proxy: overrides.proxy.or(self.proxy),
            validate_certs: overrides.validate_certs.or(self.validate_certs),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
        }
    }

    /// Resolves defaults; `env_password` is used when no password was given
    pub fn into_config(self, env_password: Option<String>) -> UcsmResult<ConnectionConfig> {
        let hostname = self
            .hostname
            .ok_or_else(|| UcsmError::invalid_config("hostname", "is required"))?;

        let mut config = ConnectionConfig::new(
            hostname,
            self.username
                .unwrap_or_else(|| defaults::DEFAULT_USERNAME.to_string()),
            self.password.or(env_password).unwrap_or_default(),
        );
        config.port = self.port;
        config.proxy = self.proxy;
        if let Some(use_ssl) = self.use_ssl {
            config.use_ssl = use_ssl;
        }
        if let Some(use_proxy) = self.use_proxy {
            config.use_proxy = use_proxy;
        }
        if let Some(validate_certs) = self.validate_certs {
            config.validate_certs = validate_certs;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Contents of a params file
#[derive(Debug, Clone, Deserialize)]
pub struct TaskFile {
    /// Connection fields
    #[serde(flatten)]
    pub connection: ConnectionParams,

    /// Template declaration
    #[serde(flatten)]
    pub template: VnicTemplateParams,

    /// Run without mutating calls
    #[serde(default)]
    pub check_mode: bool,

    /// Keys neither section recognised
    #[serde(flatten)]
    unknown: BTreeMap<String, serde_yaml::Value>,
}

impl TaskFile {
    /// Parses params text; JSON when `json` is set, YAML otherwise
    pub fn parse(text: &str, json: bool) -> Result<Self> {
        let task: Self = if json {
            serde_json::from_str(text).context("Failed to parse JSON params")?
        } else {
            serde_yaml::from_str(text).context("Failed to parse YAML params")?
        };

        if !task.unknown.is_empty() {
            let keys: Vec<&str> = task.unknown.keys().map(String::as_str).collect();
            bail!("Unsupported parameters: {}", keys.join(", "));
        }
        Ok(task)
    }

    /// Loads a params file, choosing the format from its extension
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read params file {}", path.display()))?;
        let json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        Self::parse(&text, json).with_context(|| format!("Invalid params file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Fabric, YesNo};
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use ucsm_common::ModuleState;

    const YAML: &str = "\
hostname: ucsm.lab
password: secret
port: 8443
validate_certs: false
name: vNIC-A
fabric: A-B
mtu: 9000
state: present
vlans_list:
  - name: default
    native: 'yes'
  - name: v100
";

    #[test]
    fn test_parse_yaml() {
        let task = TaskFile::parse(YAML, false).unwrap();

        assert_eq!(task.connection.hostname.as_deref(), Some("ucsm.lab"));
        assert_eq!(task.connection.port, Some(8443));
        assert_eq!(task.connection.validate_certs, Some(false));
        assert_eq!(task.template.name, "vNIC-A");
        assert_eq!(task.template.fabric, Some(Fabric::AB));
        assert_eq!(task.template.mtu.as_deref(), Some("9000"));
        assert_eq!(task.template.state, ModuleState::Present);
        assert_eq!(task.template.vlans_list.len(), 2);
        assert_eq!(task.template.vlans_list[0].native, YesNo::Yes);
        assert!(!task.check_mode);
    }

    #[test]
    fn test_parse_json() {
        let task = TaskFile::parse(
            r#"{"hostname": "ucsm.lab", "name": "vNIC-B", "state": "absent",
                "vlans_list": [{"name": "v100", "native": "no"}], "check_mode": true}"#,
            true,
        )
        .unwrap();

        assert_eq!(task.template.state, ModuleState::Absent);
        assert!(task.check_mode);
        assert_eq!(task.connection.password, None);
    }

    #[test]
    fn test_parse_rejects_bad_enum() {
        let err = TaskFile::parse("hostname: h\nname: x\nfabric: C\nvlans_list: []\n", false)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("YAML"));
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = TaskFile::parse(
            "hostname: h\nname: vNIC-A\nfabirc: B\nvlans_list:\n  - name: default\n",
            false,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported parameters: fabirc");

        let err = TaskFile::parse(
            r#"{"hostname": "h", "name": "vNIC-A", "vlans_list": [], "mtuu": 9000, "chek": true}"#,
            true,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unsupported parameters: chek, mtuu");
    }

    #[test]
    fn test_parse_aliases_through_params_file() {
        let task = TaskFile::parse(
            "\
hostname: ucsm.lab
name: vNIC-A
descr: lab uplinks
peer_redundancy_templ: vNIC-B
mtu: 9000
vlans_list:
  - name: default
",
            false,
        )
        .unwrap();

        assert_eq!(task.template.description.as_deref(), Some("lab uplinks"));
        assert_eq!(task.template.peer_redundancy_template.as_deref(), Some("vNIC-B"));
        assert_eq!(task.template.mtu.as_deref(), Some("9000"));
        assert_eq!(task.connection.hostname.as_deref(), Some("ucsm.lab"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let task = TaskFile::load(file.path()).unwrap();
        assert_eq!(task.template.name, "vNIC-A");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TaskFile::load(&dir.path().join("absent.yml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read params file"));
    }

    #[test]
    fn test_overrides_and_defaults() {
        let file = TaskFile::parse(YAML, false).unwrap().connection;
        let cli = ConnectionParams {
            hostname: Some("10.0.0.5".to_string()),
            use_ssl: Some(false),
            ..Default::default()
        };

        let config = file
            .overridden_by(cli)
            .into_config(Some("from-env".to_string()))
            .unwrap();

        assert_eq!(config.hostname, "10.0.0.5");
        assert_eq!(config.username, "admin");
        assert_eq!(config.password, "secret");
        assert_eq!(config.uri(), "http://10.0.0.5:8443/nuova");
        assert!(!config.validate_certs);
        assert!(config.use_proxy);
    }

    #[test]
    fn test_env_password_and_missing_fields() {
        let params = ConnectionParams {
            hostname: Some("ucsm".to_string()),
            ..Default::default()
        };
        let config = params.clone().into_config(Some("from-env".to_string())).unwrap();
        assert_eq!(config.password, "from-env");

        assert!(params.into_config(None).is_err());
        assert!(ConnectionParams::default()
            .into_config(Some("pw".to_string()))
            .is_err());
    }
}
