//! Template-driven prompt helpers

use crate::client::CompletionClient;
use crate::error::{CompletionError, CompletionResult};
use crate::response::CompletionResponse;
use crate::template::JobTemplate;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Runs a [`JobTemplate`] against a client as a fresh session.
#[derive(Debug)]
pub struct Facet<'a> {
    client: &'a mut CompletionClient,
    model: Option<String>,
}

impl<'a> Facet<'a> {
    pub fn new(client: &'a mut CompletionClient) -> Self {
        Self {
            client,
            model: None,
        }
    }

    /// Model used for the prompts of this facet instead of the client's.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    fn start(&mut self, template: &JobTemplate) -> CompletionResult<String> {
        let system = template.system_content()?;
        self.client
            .reset(Some(&system), None, self.model.as_deref());
        Ok(template.user_content(0)?)
    }

    /// Reset the client with the template's system section, send the first
    /// user section and return the cleaned reply.
    pub async fn prompt_data(&mut self, template: &JobTemplate) -> CompletionResult<String> {
        let user = self.start(template)?;
        let response = self.client.text_complete(Some(&user)).await?;
        Ok(response.text_cleaned())
    }

    /// [`prompt_data`](Self::prompt_data) decoded as JSON.
    pub async fn prompt_json<T: DeserializeOwned>(
        &mut self,
        template: &JobTemplate,
    ) -> CompletionResult<T> {
        let user = self.start(template)?;
        let response = self.client.text_complete(Some(&user)).await?;
        Ok(response.json()?)
    }

    /// Like [`prompt_data`](Self::prompt_data), rewriting `target` with the
    /// cleaned partial reply as it streams in.
    pub async fn prompt_stream_to_file(
        &mut self,
        template: &JobTemplate,
        target: impl AsRef<Path>,
    ) -> CompletionResult<()> {
        let target = target.as_ref();
        let user = self.start(template)?;

        let mut write_error = None;
        let response = self
            .client
            .text_complete_streaming(Some(&user), |partial: &CompletionResponse| {
                if let Err(e) = fs::write(target, partial.text_cleaned()) {
                    warn!("Failed to write partial reply to '{}': {}", target.display(), e);
                    write_error = Some(e);
                }
            })
            .await?;

        // Partial writes are best effort; retry once with the final text.
        match write_error {
            Some(_) => fs::write(target, response.text_cleaned()).map_err(|e| CompletionError::Io {
                path: target.display().to_string(),
                source: e,
            }),
            None => Ok(()),
        }
    }
}
