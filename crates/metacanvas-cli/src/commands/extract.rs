//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::repl;
use metacanvas_canvas::{Canvas, SchemaDirectory};
use metacanvas_domain::traits::{LlmProvider, SchemaSource};
use metacanvas_llm::OpenAiProvider;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Execute the extract command.
pub async fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    schema_dir: PathBuf,
    formatter: &Formatter,
) -> Result<()> {
    let text = read_source_text(args.text.as_deref(), args.file.as_ref())?;

    let mut config = config.clone();
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    if let Some(max_workers) = args.max_workers {
        config.extractor.max_workers = max_workers.max(1);
    }
    config.validate()?;

    let llm = OpenAiProvider::new(config.llm.clone())?.with_max_attempts(config.settings.max_attempts);
    info!("Using model {} with schemas from {}", llm.model(), schema_dir.display());
    let schemas = SchemaDirectory::new(schema_dir, &config.canvas);
    let canvas = Canvas::new(
        Arc::new(llm),
        Arc::new(schemas),
        config.canvas.clone(),
        config.extractor.clone(),
    );

    run_extraction(&canvas, &text, args.content_type.as_deref()).await?;

    if args.interactive {
        repl::run_repl(&canvas, formatter, config.settings.history_size).await?;
    }

    println!("{}", formatter.format_state(&canvas.state())?);
    Ok(())
}

/// Run a batch and, if requested, switch to a fixed special schema.
pub async fn run_extraction<L, S>(
    canvas: &Canvas<L, S>,
    text: &str,
    content_type: Option<&str>,
) -> Result<()>
where
    L: LlmProvider + 'static,
    S: SchemaSource,
{
    canvas.start_extraction(text).await?;

    if let Some(schema_file) = content_type {
        let state = canvas.state();
        if state.selected_content_type.as_deref() != Some(schema_file) {
            canvas.change_content_type_manually(schema_file).await?;
        }
    }
    Ok(())
}

/// Source text from the argument, a file, or stdin.
pub fn read_source_text(text: Option<&str>, file: Option<&PathBuf>) -> Result<String> {
    let text = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    if text.trim().is_empty() {
        return Err(CliError::InvalidInput("No text to extract from".to_string()));
    }
    Ok(text.trim().to_string())
}
