use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ListArgs;
use crate::config::load_config;
use crate::util::emit_json;

pub fn run(args: ListArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let client = super::connect(&config, args.org)?;

    let listing = client
        .list(args.kind)
        .with_context(|| format!("failed to list {} resources", args.kind))?;

    info!(kind = %args.kind, instance = %client.instance(), "listed resources");

    emit_json(args.output.as_deref(), &listing)
}
