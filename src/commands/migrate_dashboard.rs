use anyhow::Result;
use tracing::info;

use crate::cli::MigrateDashboardArgs;
use crate::config::load_config;
use crate::migrate::{DashboardPlan, Migrator};

pub fn run(args: MigrateDashboardArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let connector = super::http_connector()?;

    info!(
        dashboard = %args.dashboard,
        source = %config.source.instance,
        destination = %config.destination.instance,
        with_dependencies = !args.without_dependencies,
        "migrate-dashboard requested"
    );

    let plan = DashboardPlan {
        dashboard_api_name: args.dashboard,
        dashboard_label: args.label,
        visualization_label_prefix: args.visualization_label_prefix,
        semantic_model_label_prefix: args.semantic_model_label_prefix,
        with_dependencies: !args.without_dependencies,
    };
    let mut migrator = Migrator::new(
        &connector,
        &config.source,
        &config.destination,
        rand::thread_rng(),
    )?;
    let report = migrator.migrate_dashboard(&plan);

    super::publish_report(&report, args.report_path.as_deref())
}
