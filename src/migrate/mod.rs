//! Cross-org migration of dashboards and their dependencies.
//!
//! Every run is linear: dependencies are created on the destination strictly
//! before the resources that reference them (semantic model, then
//! visualization, then dashboard), and the first fatal error ends the run.
//! Resources already created on the destination are left in place.

use std::error::Error as _;

use rand::Rng;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::client::{ClientError, Connector, ResourceClient};
use crate::config::OrgConfig;
use crate::document::{Document, ResourceKind, str_at};
use crate::sanitize::{SemanticModelOverrides, reconstruct_semantic_model};
use crate::session::AuthError;

mod api_name;
mod dashboard;
mod run_log;
mod single;

pub use api_name::{ApiNameRules, SUFFIX_LEN, random_suffix};
pub use dashboard::DashboardPlan;
pub use single::{SemanticModelPlan, VisualizationPlan};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("authentication to {instance} failed")]
    Authentication {
        instance: String,
        #[source]
        source: AuthError,
    },
    #[error(transparent)]
    Api(#[from] ClientError),
    #[error("{kind} created on {instance} but the response carried no id")]
    MissingId {
        kind: ResourceKind,
        instance: String,
    },
    #[error("source {kind} {id} has no {field}")]
    MissingField {
        kind: ResourceKind,
        id: String,
        field: &'static str,
    },
    #[error("failed to compile api name pattern")]
    Pattern(#[from] regex::Error),
}

impl MigrationError {
    /// The error and all of its causes, outermost first.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut cause = self.source();
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

/// Runs migrations from `source` to `destination`.
///
/// `rng` only feeds the random suffix of generated semantic model api names.
pub struct Migrator<'a, R> {
    connector: &'a dyn Connector,
    source: &'a OrgConfig,
    destination: &'a OrgConfig,
    names: ApiNameRules,
    rng: R,
}

/// How a copied semantic model is named on the destination. `None` fields are
/// generated from the source model and `label_prefix`.
#[derive(Debug, Clone, Copy)]
struct ModelNaming<'p> {
    api_name: Option<&'p str>,
    label: Option<&'p str>,
    label_prefix: &'p str,
    dataspace: Option<&'p str>,
}

impl<'a, R: Rng> Migrator<'a, R> {
    pub fn new(
        connector: &'a dyn Connector,
        source: &'a OrgConfig,
        destination: &'a OrgConfig,
        rng: R,
    ) -> Result<Self, MigrationError> {
        Ok(Self {
            connector,
            source,
            destination,
            names: ApiNameRules::new()?,
            rng,
        })
    }

    fn connect(&self, org: &OrgConfig) -> Result<Box<dyn ResourceClient>, MigrationError> {
        self.connector
            .connect(org)
            .map_err(|source| MigrationError::Authentication {
                instance: org.instance.clone(),
                source,
            })
    }

    fn prepare_semantic_model(
        &mut self,
        model_id: &str,
        source_model: &Value,
        naming: ModelNaming<'_>,
    ) -> Result<Value, MigrationError> {
        let source_api_name =
            str_at(source_model, &["apiName"]).ok_or_else(|| MigrationError::MissingField {
                kind: ResourceKind::SemanticModel,
                id: model_id.to_string(),
                field: "apiName",
            })?;
        let suffix = random_suffix(&mut self.rng, SUFFIX_LEN);

        let api_name = match naming.api_name {
            Some(name) => name.to_string(),
            None => self
                .names
                .derive(source_api_name, naming.label_prefix, &suffix),
        };
        let label = match naming.label {
            Some(label) => label.to_string(),
            None => clone_label(
                str_at(source_model, &["label"]).unwrap_or(source_api_name),
                naming.label_prefix,
                &suffix,
            ),
        };
        info!(source_id = %model_id, api_name = %api_name, label = %label, "prepared semantic model copy");

        let overrides = SemanticModelOverrides {
            api_name: Some(api_name),
            label: Some(label),
            dataspace: naming.dataspace.map(str::to_string),
        };
        Ok(reconstruct_semantic_model(source_model, &overrides))
    }

    /// Fetches `model_id` from the source and creates its copy on the
    /// destination, returning the destination id.
    fn copy_semantic_model(
        &mut self,
        source: &dyn ResourceClient,
        destination: &dyn ResourceClient,
        model_id: &str,
        naming: ModelNaming<'_>,
    ) -> Result<String, MigrationError> {
        let source_model = source.fetch(ResourceKind::SemanticModel, model_id)?;
        let payload = self.prepare_semantic_model(model_id, source_model.body(), naming)?;
        let created = destination.create(ResourceKind::SemanticModel, &payload)?;
        created_id(&created, destination)
    }
}

fn created_id(
    created: &Document,
    destination: &dyn ResourceClient,
) -> Result<String, MigrationError> {
    created
        .id()
        .map(str::to_string)
        .ok_or_else(|| MigrationError::MissingId {
            kind: created.kind(),
            instance: destination.instance().to_string(),
        })
}

fn clone_label(source_label: &str, label_prefix: &str, suffix: &str) -> String {
    [source_label.trim(), label_prefix.trim(), suffix]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn display_label(document: &Value) -> &str {
    str_at(document, &["label"])
        .or_else(|| str_at(document, &["name"]))
        .unwrap_or_default()
}

fn set_label(payload: &mut Value, label: impl Into<String>) {
    if let Value::Object(map) = payload {
        map.insert("label".to_string(), Value::String(label.into()));
    }
}
