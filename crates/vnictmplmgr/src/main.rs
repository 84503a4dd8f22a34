//! vnictmplmgr - vNIC template VLAN reconciler
//!
//! Reads a params file, logs in to UCS Manager, reconciles the declared
//! template and prints the result as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use ucsm_common::{defaults, ConnectionConfig, TaskResult, UcsSession, UcsTask};
use ucsm_vnictmplmgr::{ConnectionParams, TaskFile, VnicTemplateMgr};

#[derive(Parser, Debug)]
#[command(name = "vnictmplmgr")]
#[command(author, version, about = "Reconcile a UCS Manager vNIC template and its VLANs", long_about = None)]
struct Args {
    /// Params file (YAML or JSON) with connection and template fields
    #[arg(short = 'p', long)]
    params: PathBuf,

    /// UCS Manager address
    #[arg(long)]
    hostname: Option<String>,

    /// Login user
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Login password (falls back to UCSM_PASSWORD)
    #[arg(long)]
    password: Option<String>,

    /// XML API port
    #[arg(long)]
    port: Option<u16>,

    /// Use plain http
    #[arg(long)]
    no_ssl: bool,

    /// Report what would change without changing it
    #[arg(short = 'c', long)]
    check: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn connection_overrides(&self) -> ConnectionParams {
        ConnectionParams {
            hostname: self.hostname.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            port: self.port,
            use_ssl: self.no_ssl.then_some(false),
            ..Default::default()
        }
    }
}

/// Initializes tracing on stderr; `RUST_LOG` wins over `log_level`
fn init_logging(log_level: &str, json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

/// Builds the connection config and the reconciler from the params file
/// and the command line
fn prepare(args: &Args) -> Result<(ConnectionConfig, VnicTemplateMgr)> {
    let task = TaskFile::load(&args.params)?;

    let config = task
        .connection
        .overridden_by(args.connection_overrides())
        .into_config(std::env::var(defaults::PASSWORD_ENV).ok())
        .context("Invalid connection parameters")?;

    let mgr = VnicTemplateMgr::new(task.template)
        .context("Invalid template declaration")?
        .with_check_mode(args.check || task.check_mode);

    Ok((config, mgr))
}

async fn run(args: &Args) -> TaskResult {
    let (config, mgr) = match prepare(args) {
        Ok(prepared) => prepared,
        Err(e) => {
            error!("{:#}", e);
            return TaskResult::failed(false, format!("{:#}", e));
        }
    };

    let mut session = match UcsSession::new(config) {
        Ok(session) => session,
        Err(e) => return TaskResult::failed(false, e.to_string()),
    };

    if let Err(e) = session.login().await {
        error!("Login failed: {}", e);
        return TaskResult::failed(false, format!("login failed: {}", e));
    }

    let result = mgr.run(&mut session).await;
    session.logout().await;
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level, args.json_logs);

    info!("--- Starting vnictmplmgr ---");

    let result = run(&args).await;
    println!("{}", result.to_json());

    if result.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "vnictmplmgr",
            "--params",
            "task.yml",
            "--hostname",
            "ucsm",
            "--no-ssl",
            "--check",
        ])
        .unwrap();

        assert_eq!(args.params, PathBuf::from("task.yml"));
        assert!(args.check);
        assert_eq!(args.log_level, "info");

        let overrides = args.connection_overrides();
        assert_eq!(overrides.hostname.as_deref(), Some("ucsm"));
        assert_eq!(overrides.use_ssl, Some(false));
        assert_eq!(overrides.username, None);
    }

    #[test]
    fn test_args_require_params() {
        assert!(Args::try_parse_from(["vnictmplmgr"]).is_err());
    }

    #[tokio::test]
    async fn test_run_reports_bad_params_as_failed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.yml");
        std::fs::write(&path, "hostname: ucsm\npassword: pw\nname: 'bad name'\nvlans_list:\n  - name: default\n").unwrap();

        let args = Args::try_parse_from(["vnictmplmgr", "--params", path.to_str().unwrap()]).unwrap();
        let result = run(&args).await;

        assert!(result.failed);
        assert!(!result.changed);
        assert!(result.msg.unwrap().contains("Invalid template declaration"));
    }
}
