use anyhow::{Context, Result};
use tracing::info;

use crate::cli::FetchArgs;
use crate::config::load_config;
use crate::sanitize::sanitize_document;
use crate::util::emit_json;

pub fn run(args: FetchArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let client = super::connect(&config, args.org)?;

    let document = client
        .fetch(args.kind, &args.id)
        .with_context(|| format!("failed to fetch {} {}", args.kind, args.id))?;
    let document = if args.sanitized {
        sanitize_document(&document)
    } else {
        document
    };

    info!(
        kind = %args.kind,
        id = %args.id,
        instance = %client.instance(),
        sanitized = args.sanitized,
        "fetched resource"
    );

    emit_json(args.output.as_deref(), document.body())
}
