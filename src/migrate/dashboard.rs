use std::collections::BTreeSet;

use rand::Rng;
use tracing::info;

use super::run_log::RunLog;
use super::{MigrationError, Migrator, ModelNaming, created_id, display_label, set_label};
use crate::document::{IdentifierMap, ResourceKind};
use crate::model::{MigrationReport, MigrationStep};
use crate::references::{
    extract_semantic_model_id, extract_visualization_ids, rewrite_semantic_model_reference,
    rewrite_visualization_references,
};
use crate::sanitize::sanitize;

#[derive(Debug, Clone)]
pub struct DashboardPlan {
    /// Api name or id of the dashboard on the source org.
    pub dashboard_api_name: String,
    /// Label of the created dashboard. The source label is kept when unset.
    pub dashboard_label: Option<String>,
    pub visualization_label_prefix: String,
    pub semantic_model_label_prefix: String,
    /// Copy the embedded visualizations and their semantic models too. When
    /// off the dashboard is created as-is, still pointing at source ids.
    pub with_dependencies: bool,
}

impl<R: Rng> Migrator<'_, R> {
    pub fn migrate_dashboard(&mut self, plan: &DashboardPlan) -> MigrationReport {
        let mut log = RunLog::start(
            ResourceKind::Dashboard,
            self.source,
            self.destination,
            &plan.dashboard_api_name,
        );
        let mut semantic_models = IdentifierMap::new();
        let mut visualizations = IdentifierMap::new();

        let outcome =
            self.run_dashboard(plan, &mut log, &mut semantic_models, &mut visualizations);
        log.finish(outcome, semantic_models, visualizations)
    }

    fn run_dashboard(
        &mut self,
        plan: &DashboardPlan,
        log: &mut RunLog,
        semantic_models: &mut IdentifierMap,
        visualizations: &mut IdentifierMap,
    ) -> Result<String, MigrationError> {
        let destination_org = self.destination;

        log.advance(MigrationStep::AuthSource);
        let source = self.connect(self.source)?;

        log.advance(MigrationStep::FetchDashboard);
        let mut dashboard = source
            .fetch(ResourceKind::Dashboard, &plan.dashboard_api_name)?
            .into_body();

        let mut dependencies = Vec::new();
        let mut model_ids = BTreeSet::new();
        if plan.with_dependencies {
            log.advance(MigrationStep::ExtractVisualizationIds);
            let visualization_ids = extract_visualization_ids(&dashboard);
            info!(count = visualization_ids.len(), "found visualization references");

            log.advance(MigrationStep::FetchVisualizations);
            for id in visualization_ids {
                let visualization = source.fetch(ResourceKind::Visualization, &id)?;
                dependencies.push((id, visualization.into_body()));
            }

            log.advance(MigrationStep::ExtractSemanticModelIds);
            model_ids = dependencies
                .iter()
                .filter_map(|(_, visualization)| extract_semantic_model_id(visualization))
                .collect();
            info!(count = model_ids.len(), "found semantic model references");
        }

        log.advance(MigrationStep::AuthDestination);
        let destination = self.connect(destination_org)?;

        if plan.with_dependencies {
            log.advance(MigrationStep::MigrateSemanticModels);
            let naming = ModelNaming {
                api_name: None,
                label: None,
                label_prefix: &plan.semantic_model_label_prefix,
                dataspace: Some(&destination_org.data_space),
            };
            for model_id in &model_ids {
                let created = self.copy_semantic_model(
                    source.as_ref(),
                    destination.as_ref(),
                    model_id,
                    naming,
                )?;
                info!(source_id = %model_id, destination_id = %created, "migrated semantic model");
                semantic_models.insert(model_id.clone(), created);
            }

            log.advance(MigrationStep::MigrateVisualizations);
            for (source_id, visualization) in &dependencies {
                let mut payload = sanitize(visualization, ResourceKind::Visualization);
                if let Some(warning) = rewrite_semantic_model_reference(&mut payload, semantic_models)
                {
                    log.warn(warning);
                }
                set_label(
                    &mut payload,
                    format!(
                        "{}{}",
                        plan.visualization_label_prefix,
                        display_label(visualization)
                    ),
                );

                let created = destination.create(ResourceKind::Visualization, &payload)?;
                let created = created_id(&created, destination.as_ref())?;
                info!(source_id = %source_id, destination_id = %created, "migrated visualization");
                visualizations.insert(source_id.clone(), created);
            }

            log.advance(MigrationStep::RewriteDashboardReferences);
            for warning in rewrite_visualization_references(&mut dashboard, visualizations) {
                log.warn(warning);
            }
        }

        log.advance(MigrationStep::SanitizeDashboard);
        let mut payload = sanitize(&dashboard, ResourceKind::Dashboard);
        if let Some(label) = &plan.dashboard_label {
            set_label(&mut payload, label.as_str());
        }

        log.advance(MigrationStep::CreateDashboard);
        let created = destination.create(ResourceKind::Dashboard, &payload)?;
        created_id(&created, destination.as_ref())
    }
}
