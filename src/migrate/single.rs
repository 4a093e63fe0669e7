use rand::Rng;
use tracing::info;

use super::run_log::RunLog;
use super::{MigrationError, Migrator, ModelNaming, created_id, display_label, set_label};
use crate::document::{IdentifierMap, ResourceKind};
use crate::model::{MigrationReport, MigrationStep};
use crate::sanitize::sanitize;

/// Copy of one visualization. Its data source reference is kept as-is, so the
/// referenced semantic model must already exist on the destination.
#[derive(Debug, Clone)]
pub struct VisualizationPlan {
    pub visualization_id: String,
    /// Label of the copy. Defaults to `label_prefix` + source label.
    pub label: Option<String>,
    pub label_prefix: String,
}

#[derive(Debug, Clone)]
pub struct SemanticModelPlan {
    pub model_api_name: String,
    /// Generated from the source api name, `label_prefix` and a random
    /// suffix when unset.
    pub new_api_name: Option<String>,
    pub label: Option<String>,
    pub label_prefix: String,
    /// Dataspace of the copy. The source dataspace is kept when unset.
    pub dataspace: Option<String>,
}

impl<R: Rng> Migrator<'_, R> {
    pub fn migrate_visualization(&mut self, plan: &VisualizationPlan) -> MigrationReport {
        let mut log = RunLog::start(
            ResourceKind::Visualization,
            self.source,
            self.destination,
            &plan.visualization_id,
        );
        let mut visualizations = IdentifierMap::new();

        let outcome = self.run_visualization(plan, &mut log, &mut visualizations);
        log.finish(outcome, IdentifierMap::new(), visualizations)
    }

    pub fn migrate_semantic_model(&mut self, plan: &SemanticModelPlan) -> MigrationReport {
        let mut log = RunLog::start(
            ResourceKind::SemanticModel,
            self.source,
            self.destination,
            &plan.model_api_name,
        );
        let mut semantic_models = IdentifierMap::new();

        let outcome = self.run_semantic_model(plan, &mut log, &mut semantic_models);
        log.finish(outcome, semantic_models, IdentifierMap::new())
    }

    fn run_visualization(
        &mut self,
        plan: &VisualizationPlan,
        log: &mut RunLog,
        visualizations: &mut IdentifierMap,
    ) -> Result<String, MigrationError> {
        log.advance(MigrationStep::AuthSource);
        let source = self.connect(self.source)?;

        log.advance(MigrationStep::FetchResource);
        let visualization = source
            .fetch(ResourceKind::Visualization, &plan.visualization_id)?
            .into_body();

        log.advance(MigrationStep::AuthDestination);
        let destination = self.connect(self.destination)?;

        log.advance(MigrationStep::SanitizeResource);
        let mut payload = sanitize(&visualization, ResourceKind::Visualization);
        let label = match &plan.label {
            Some(label) => label.clone(),
            None => format!("{}{}", plan.label_prefix, display_label(&visualization)),
        };
        set_label(&mut payload, label);

        log.advance(MigrationStep::CreateResource);
        let created = destination.create(ResourceKind::Visualization, &payload)?;
        let created = created_id(&created, destination.as_ref())?;
        info!(source_id = %plan.visualization_id, destination_id = %created, "migrated visualization");
        visualizations.insert(plan.visualization_id.clone(), created.clone());
        Ok(created)
    }

    fn run_semantic_model(
        &mut self,
        plan: &SemanticModelPlan,
        log: &mut RunLog,
        semantic_models: &mut IdentifierMap,
    ) -> Result<String, MigrationError> {
        log.advance(MigrationStep::AuthSource);
        let source = self.connect(self.source)?;

        log.advance(MigrationStep::FetchResource);
        let source_model = source.fetch(ResourceKind::SemanticModel, &plan.model_api_name)?;

        log.advance(MigrationStep::AuthDestination);
        let destination = self.connect(self.destination)?;

        log.advance(MigrationStep::SanitizeResource);
        let naming = ModelNaming {
            api_name: plan.new_api_name.as_deref(),
            label: plan.label.as_deref(),
            label_prefix: &plan.label_prefix,
            dataspace: plan.dataspace.as_deref(),
        };
        let payload =
            self.prepare_semantic_model(&plan.model_api_name, source_model.body(), naming)?;

        log.advance(MigrationStep::CreateResource);
        let created = destination.create(ResourceKind::SemanticModel, &payload)?;
        let created = created_id(&created, destination.as_ref())?;
        info!(source_id = %plan.model_api_name, destination_id = %created, "migrated semantic model");
        semantic_models.insert(plan.model_api_name.clone(), created.clone());
        Ok(created)
    }
}
