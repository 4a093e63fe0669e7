pub mod fetch;
pub mod list;
pub mod migrate_dashboard;
pub mod migrate_semantic_model;
pub mod migrate_visualization;
pub mod sanitize;

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::OrgRole;
use crate::client::{Connector, HttpConnector, ResourceClient};
use crate::config::{MigrationConfig, OrgConfig};
use crate::model::MigrationReport;
use crate::util::emit_json;

fn http_connector() -> Result<HttpConnector> {
    HttpConnector::new().context("failed to build http client")
}

fn org_for(config: &MigrationConfig, role: OrgRole) -> &OrgConfig {
    match role {
        OrgRole::Source => &config.source,
        OrgRole::Destination => &config.destination,
    }
}

fn connect(config: &MigrationConfig, role: OrgRole) -> Result<Box<dyn ResourceClient>> {
    let org = org_for(config, role);
    let client = http_connector()?
        .connect(org)
        .with_context(|| format!("authentication to {} org {} failed", role.as_str(), org.instance))?;
    info!(org = role.as_str(), instance = %org.instance, "authenticated");
    Ok(client)
}

/// Writes the report, then turns an unsuccessful run into a command error so
/// the process exits non-zero.
fn publish_report(report: &MigrationReport, report_path: Option<&Path>) -> Result<()> {
    emit_json(report_path, report)?;
    if let Some(path) = report_path {
        info!(path = %path.display(), run_id = %report.run_id, "wrote migration report");
    }

    if !report.success {
        bail!("{}", report.message);
    }
    Ok(())
}
