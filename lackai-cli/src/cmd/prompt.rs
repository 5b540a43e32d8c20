//! One-shot template prompt.

use anyhow::{Context, Result};
use lackai_core::{CompletionClient, JobTemplate};
use std::path::Path;
use tracing::info;

pub async fn run(
    client: &mut CompletionClient,
    template: &Path,
    data: Vec<(String, String)>,
    out: Option<&Path>,
) -> Result<()> {
    let template = JobTemplate::from_file(template)
        .with_context(|| format!("loading template {}", template.display()))?
        .with_data(data);

    match out {
        Some(target) => {
            client.facet().prompt_stream_to_file(&template, target).await?;
            info!("Reply written to {}", target.display());
        }
        None => println!("{}", client.facet().prompt_data(&template).await?),
    }
    Ok(())
}
