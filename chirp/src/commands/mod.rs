//! Command handlers for the chirp CLI.

mod render;

use anyhow::Result;
use chirp_common::{ChirpConfig, ChirpError, Installer, OsFs, PathResolver, Scope};
use serde_json::json;
use std::str::FromStr;
use tracing::debug;

pub fn install(scope: &str, dry_run: bool, config: &ChirpConfig, json: bool) -> Result<()> {
    let scope = Scope::from_str(scope)?;
    let fs = OsFs::new();
    let report = installer(&fs, config, dry_run)?.install(scope)?;
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", render::workflow(&report));
    }
    Ok(())
}

pub fn uninstall(scope: &str, dry_run: bool, config: &ChirpConfig, json: bool) -> Result<()> {
    let scope = Scope::from_str(scope)?;
    let fs = OsFs::new();
    let report = installer(&fs, config, dry_run)?.uninstall(scope)?;
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", render::workflow(&report));
    }
    Ok(())
}

pub fn status(scope: &str, config: &ChirpConfig, json: bool) -> Result<()> {
    let scope = Scope::from_str(scope)?;
    let fs = OsFs::new();
    let report = installer(&fs, config, false)?.status(scope)?;
    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", render::status(&report));
    }
    Ok(())
}

/// Print a failed command's error: JSON on stdout, or one line on stderr.
pub fn report_error(err: &anyhow::Error, json: bool) {
    let Some(chirp) = err.downcast_ref::<ChirpError>() else {
        if json {
            let message = format!("{err:#}");
            println!("{}", json!({ "error": { "message": message } }));
        } else {
            eprintln!("error: {err:#}");
        }
        return;
    };

    if json {
        let kind = chirp.kind();
        let path = chirp.path().map(|p| p.display().to_string());
        let value = json!({
            "error": {
                "kind": kind.name(),
                "code": kind.code_string(),
                "message": chirp.to_string(),
                "path": path,
                "remediation": kind.remediation(),
            }
        });
        println!("{value}");
    } else {
        eprintln!("{}", render::error_line(chirp));
    }
}

fn installer<'a>(
    fs: &'a OsFs,
    config: &ChirpConfig,
    dry_run: bool,
) -> chirp_common::Result<Installer<'a, OsFs>> {
    debug!(
        lock_timeout = ?config.lock_timeout.value,
        lock_timeout_source = %config.lock_timeout.source,
        exec_path = ?config.exec_path.value,
        "resolved configuration"
    );
    Ok(Installer::new(fs, PathResolver::from_process()?)
        .with_lock_timeout(config.lock_timeout.value)
        .with_exec_path(config.exec_path.value.clone())
        .with_dry_run(dry_run))
}
