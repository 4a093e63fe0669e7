use anyhow::Result;
use tracing::info;

use crate::cli::MigrateVisualizationArgs;
use crate::config::load_config;
use crate::migrate::{Migrator, VisualizationPlan};

pub fn run(args: MigrateVisualizationArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let connector = super::http_connector()?;

    info!(visualization_id = %args.visualization_id, "migrate-visualization requested");

    let plan = VisualizationPlan {
        visualization_id: args.visualization_id,
        label: args.label,
        label_prefix: args.label_prefix,
    };
    let mut migrator = Migrator::new(
        &connector,
        &config.source,
        &config.destination,
        rand::thread_rng(),
    )?;
    let report = migrator.migrate_visualization(&plan);

    super::publish_report(&report, args.report_path.as_deref())
}
