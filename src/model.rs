use serde::Serialize;

use crate::document::{IdentifierMap, ResourceKind};

pub const REPORT_VERSION: u32 = 1;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStep {
    Init,
    AuthSource,
    FetchDashboard,
    ExtractVisualizationIds,
    FetchVisualizations,
    ExtractSemanticModelIds,
    AuthDestination,
    MigrateSemanticModels,
    MigrateVisualizations,
    RewriteDashboardReferences,
    SanitizeDashboard,
    CreateDashboard,
    FetchResource,
    SanitizeResource,
    CreateResource,
    Done,
}

impl MigrationStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::AuthSource => "auth_source",
            Self::FetchDashboard => "fetch_dashboard",
            Self::ExtractVisualizationIds => "extract_visualization_ids",
            Self::FetchVisualizations => "fetch_visualizations",
            Self::ExtractSemanticModelIds => "extract_semantic_model_ids",
            Self::AuthDestination => "auth_destination",
            Self::MigrateSemanticModels => "migrate_semantic_models",
            Self::MigrateVisualizations => "migrate_visualizations",
            Self::RewriteDashboardReferences => "rewrite_dashboard_references",
            Self::SanitizeDashboard => "sanitize_dashboard",
            Self::CreateDashboard => "create_dashboard",
            Self::FetchResource => "fetch_resource",
            Self::SanitizeResource => "sanitize_resource",
            Self::CreateResource => "create_resource",
            Self::Done => "done",
        }
    }
}

/// Outcome of one migration run, written as JSON at the end of every
/// `migrate-*` command whether or not the run succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub report_version: u32,
    pub run_id: String,
    pub kind: ResourceKind,
    pub source_instance: String,
    pub destination_instance: String,
    pub source_id: String,
    pub success: bool,
    pub message: String,
    pub started_at: String,
    pub updated_at: String,
    pub completed_steps: Vec<MigrationStep>,
    pub failed_step: Option<MigrationStep>,
    pub failure_reason: Option<String>,
    /// Destination id of the top-level resource of the run.
    pub created_id: Option<String>,
    /// Destination id of the created dashboard. Only set by dashboard runs.
    pub dashboard_id: Option<String>,
    pub semantic_model_id_map: IdentifierMap,
    pub visualization_id_map: IdentifierMap,
    pub warnings: Vec<String>,
}
