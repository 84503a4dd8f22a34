//! HTTP session against a live UCS Manager.
//!
//! [`UcsSession`] posts XML API documents to `/nuova`, keeps the login
//! cookie and buffers staged changes until [`LoginHandle::commit`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Proxy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{UcsmError, UcsmResult};
use crate::handle::LoginHandle;
use crate::manager::defaults;
use crate::mo::{ManagedObject, MoStatus};
use crate::xml::{self, XmlResponse};

/// XML API endpoint path.
pub const XML_API_PATH: &str = "/nuova";

fn default_username() -> String {
    defaults::DEFAULT_USERNAME.to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    defaults::DEFAULT_TIMEOUT_SECS
}

/// Connection parameters shared by every UCS task.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// UCS Manager address.
    pub hostname: String,
    /// Login user.
    #[serde(default = "default_username")]
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// TCP port; 443 with SSL, 80 without when unset.
    #[serde(default)]
    pub port: Option<u16>,
    /// Use https.
    #[serde(default = "default_true")]
    pub use_ssl: bool,
    /// Honour the system proxy settings.
    #[serde(default = "default_true")]
    pub use_proxy: bool,
    /// Explicit proxy URL.
    #[serde(default)]
    pub proxy: Option<String>,
    /// Verify the appliance TLS certificate.
    #[serde(default = "default_true")]
    pub validate_certs: bool,
    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ConnectionConfig {
    /// Creates a config with defaults for everything but the credentials.
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            port: None,
            use_ssl: true,
            use_proxy: true,
            proxy: None,
            validate_certs: true,
            timeout_secs: defaults::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Effective port.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.use_ssl { 443 } else { 80 })
    }

    /// Full XML API endpoint URI.
    pub fn uri(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!(
            "{}://{}:{}{}",
            scheme,
            self.hostname,
            self.effective_port(),
            XML_API_PATH
        )
    }

    /// Checks the fields that have no usable default.
    pub fn validate(&self) -> UcsmResult<()> {
        if self.hostname.trim().is_empty() {
            return Err(UcsmError::invalid_config("hostname", "is required"));
        }
        if self.password.is_empty() {
            return Err(UcsmError::invalid_config("password", "is required"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_proxy", &self.use_proxy)
            .field("proxy", &self.proxy)
            .field("validate_certs", &self.validate_certs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// An XML API session.
pub struct UcsSession {
    config: ConnectionConfig,
    http: Client,
    cookie: Option<String>,
    /// Changes staged since the last commit, in submission order.
    commit_buffer: Vec<ManagedObject>,
}

impl UcsSession {
    /// Creates a session; no request is made until [`login`](Self::login).
    pub fn new(config: ConnectionConfig) -> UcsmResult<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.validate_certs);

        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy.as_str())
                .map_err(|e| UcsmError::invalid_config("proxy", e.to_string()))?;
            builder = builder.proxy(proxy);
        } else if !config.use_proxy {
            builder = builder.no_proxy();
        }

        let http = builder
            .build()
            .map_err(|e| UcsmError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http,
            cookie: None,
            commit_buffer: Vec::new(),
        })
    }

    /// Connection parameters of this session.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Returns true once a cookie has been obtained.
    pub fn is_logged_in(&self) -> bool {
        self.cookie.is_some()
    }

    /// Number of staged, uncommitted changes.
    pub fn pending_changes(&self) -> usize {
        self.commit_buffer.len()
    }

    fn cookie(&self) -> UcsmResult<&str> {
        self.cookie
            .as_deref()
            .ok_or_else(|| UcsmError::not_logged_in(&self.config.hostname))
    }

    /// Posts one document and parses the answer.
    async fn post(&self, body: String) -> UcsmResult<XmlResponse> {
        let uri = self.config.uri();

        let response = self
            .http
            .post(&uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|source| UcsmError::Transport {
                uri: uri.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UcsmError::HttpStatus {
                uri,
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|source| UcsmError::Transport { uri, source })?;

        xml::parse_response(&text)
    }

    /// Authenticates and stores the session cookie.
    #[instrument(skip(self), fields(hostname = %self.config.hostname, username = %self.config.username))]
    pub async fn login(&mut self) -> UcsmResult<()> {
        let body = xml::login_request(&self.config.username, &self.config.password)?;
        let response = self.post(body).await?;

        let cookie = response
            .attr("outCookie")
            .filter(|c| !c.is_empty())
            .ok_or_else(|| UcsmError::xml("aaaLogin response carries no outCookie"))?;

        self.cookie = Some(cookie.to_string());
        info!(
            refresh_period = response.attr("outRefreshPeriod").unwrap_or("unknown"),
            "Logged in to UCS Manager"
        );
        Ok(())
    }

    /// Releases the session cookie. Errors are logged, never returned.
    #[instrument(skip(self), fields(hostname = %self.config.hostname))]
    pub async fn logout(&mut self) {
        let Some(cookie) = self.cookie.take() else {
            return;
        };

        if !self.commit_buffer.is_empty() {
            warn!(
                pending = self.commit_buffer.len(),
                "Discarding uncommitted changes at logout"
            );
            self.commit_buffer.clear();
        }

        let result = match xml::logout_request(&cookie) {
            Ok(body) => self.post(body).await.map(|_| ()),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => info!("Logged out of UCS Manager"),
            Err(e) => warn!(error = %e, "Logout failed"),
        }
    }
}

#[async_trait]
impl LoginHandle for UcsSession {
    #[instrument(skip(self))]
    async fn query_dn(&mut self, dn: &str) -> UcsmResult<Option<ManagedObject>> {
        let body = xml::resolve_dn_request(self.cookie()?, dn)?;
        let response = self.post(body).await?;
        let found = response.objects.into_iter().next();
        debug!(found = found.is_some(), "Resolved dn");
        Ok(found)
    }

    #[instrument(skip(self))]
    async fn query_children(
        &mut self,
        dn: &str,
        class_id: &str,
    ) -> UcsmResult<Vec<ManagedObject>> {
        let body = xml::resolve_children_request(self.cookie()?, dn, class_id)?;
        let response = self.post(body).await?;
        debug!(count = response.objects.len(), "Resolved children");
        Ok(response.objects)
    }

    async fn remove_mo(&mut self, mo: &ManagedObject) -> UcsmResult<()> {
        self.cookie()?;
        debug!(dn = %mo.dn, class_id = %mo.class_id, "Staging delete");
        let staged = ManagedObject::new(mo.class_id.clone(), mo.dn.clone())
            .with_status(MoStatus::Deleted);
        self.commit_buffer.push(staged);
        Ok(())
    }

    async fn add_mo(&mut self, mut mo: ManagedObject, modify_present: bool) -> UcsmResult<()> {
        self.cookie()?;
        let status = if modify_present {
            MoStatus::CreatedModified
        } else {
            MoStatus::Created
        };
        mo.inherit_status(status);
        debug!(
            dn = %mo.dn,
            class_id = %mo.class_id,
            children = mo.children.len(),
            "Staging add"
        );
        self.commit_buffer.push(mo);
        Ok(())
    }

    #[instrument(skip(self), fields(pending = self.commit_buffer.len()))]
    async fn commit(&mut self) -> UcsmResult<()> {
        if self.commit_buffer.is_empty() {
            debug!("Nothing to commit");
            return Ok(());
        }

        let body = xml::conf_mos_request(self.cookie()?, &self.commit_buffer)?;
        // The buffer is dropped whether or not the appliance accepts it.
        let staged = std::mem::take(&mut self.commit_buffer);
        self.post(body).await?;

        info!(objects = staged.len(), "Committed configuration");
        Ok(())
    }
}
