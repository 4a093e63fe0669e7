use anyhow::{Context, Result};
use tracing::info;

use crate::cli::SanitizeArgs;
use crate::document::Document;
use crate::sanitize::sanitize_document;
use crate::util::{emit_json, read_json};

pub fn run(args: SanitizeArgs) -> Result<()> {
    let body = read_json(&args.input)?;
    let document = Document::new(args.kind, body)
        .with_context(|| format!("cannot sanitize {}", args.input.display()))?;

    let sanitized = sanitize_document(&document);
    info!(
        kind = %args.kind,
        input = %args.input.display(),
        label = %sanitized.label().unwrap_or_default(),
        "sanitized document"
    );

    emit_json(args.output.as_deref(), sanitized.body())
}
