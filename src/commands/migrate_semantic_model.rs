use anyhow::Result;
use tracing::info;

use crate::cli::MigrateSemanticModelArgs;
use crate::config::load_config;
use crate::migrate::{Migrator, SemanticModelPlan};

pub fn run(args: MigrateSemanticModelArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let connector = super::http_connector()?;

    info!(
        model_api_name = %args.model_api_name,
        new_api_name = %args.new_api_name.as_deref().unwrap_or("<generated>"),
        "migrate-semantic-model requested"
    );

    let plan = SemanticModelPlan {
        model_api_name: args.model_api_name,
        new_api_name: args.new_api_name,
        label: args.label,
        label_prefix: args.label_prefix,
        dataspace: args.dataspace,
    };
    let mut migrator = Migrator::new(
        &connector,
        &config.source,
        &config.destination,
        rand::thread_rng(),
    )?;
    let report = migrator.migrate_semantic_model(&plan);

    super::publish_report(&report, args.report_path.as_deref())
}
