use std::fmt::Display;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::MigrationError;
use crate::config::OrgConfig;
use crate::document::{IdentifierMap, ResourceKind};
use crate::model::{MigrationReport, MigrationStep, REPORT_VERSION};
use crate::util::{now_utc_string, utc_compact_string};

/// Tracks step progress and warnings of one run and turns them into a report.
pub(super) struct RunLog {
    report: MigrationReport,
    current: MigrationStep,
}

impl RunLog {
    pub(super) fn start(
        kind: ResourceKind,
        source: &OrgConfig,
        destination: &OrgConfig,
        source_id: &str,
    ) -> Self {
        let started_at = now_utc_string();
        let run_id = format!("{}-{}", kind.as_str(), utc_compact_string(Utc::now()));
        info!(
            run_id = %run_id,
            kind = %kind,
            source_id = %source_id,
            source = %source.instance,
            destination = %destination.instance,
            "starting migration"
        );

        Self {
            report: MigrationReport {
                report_version: REPORT_VERSION,
                run_id,
                kind,
                source_instance: source.instance.clone(),
                destination_instance: destination.instance.clone(),
                source_id: source_id.to_string(),
                success: false,
                message: String::new(),
                started_at: started_at.clone(),
                updated_at: started_at,
                completed_steps: Vec::new(),
                failed_step: None,
                failure_reason: None,
                created_id: None,
                dashboard_id: None,
                semantic_model_id_map: IdentifierMap::new(),
                visualization_id_map: IdentifierMap::new(),
                warnings: Vec::new(),
            },
            current: MigrationStep::Init,
        }
    }

    pub(super) fn advance(&mut self, step: MigrationStep) {
        self.report.completed_steps.push(self.current);
        self.current = step;
        info!(run_id = %self.report.run_id, step = step.as_str(), "migration step");
    }

    pub(super) fn warn(&mut self, warning: impl Display) {
        warn!(run_id = %self.report.run_id, step = self.current.as_str(), warning = %warning, "dangling reference left in place");
        self.report.warnings.push(warning.to_string());
    }

    pub(super) fn finish(
        mut self,
        outcome: Result<String, MigrationError>,
        semantic_models: IdentifierMap,
        visualizations: IdentifierMap,
    ) -> MigrationReport {
        match outcome {
            Ok(created_id) => {
                self.advance(MigrationStep::Done);
                info!(
                    run_id = %self.report.run_id,
                    created_id = %created_id,
                    semantic_models = semantic_models.len(),
                    visualizations = visualizations.len(),
                    warnings = self.report.warnings.len(),
                    "migration completed"
                );
                self.report.success = true;
                self.report.message = format!("{} migrated successfully", self.report.kind);
                if self.report.kind == ResourceKind::Dashboard {
                    self.report.dashboard_id = Some(created_id.clone());
                }
                self.report.created_id = Some(created_id);
            }
            Err(err) => {
                let reason = err.chain_message();
                let status = match &err {
                    MigrationError::Api(api) => api.status(),
                    _ => None,
                };
                error!(
                    run_id = %self.report.run_id,
                    step = self.current.as_str(),
                    status = ?status,
                    error = %reason,
                    "migration failed"
                );
                self.report.message = format!("Migration failed: {reason}");
                self.report.failed_step = Some(self.current);
                self.report.failure_reason = Some(reason);
            }
        }

        for (source_id, destination_id) in semantic_models.iter().chain(visualizations.iter()) {
            debug!(run_id = %self.report.run_id, source_id, destination_id, "identifier mapping");
        }
        self.report.semantic_model_id_map = semantic_models;
        self.report.visualization_id_map = visualizations;
        self.report.updated_at = now_utc_string();
        self.report
    }
}
