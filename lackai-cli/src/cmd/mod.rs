//! CLI argument parsing and subcommand dispatch.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lackai_core::config::load_from_file;
use lackai_core::{ClientConfig, CompletionClient, FileRequestCache};
use std::path::PathBuf;

use crate::console::ConsoleLogger;

pub mod chat;
pub mod prompt;

/// Chat with an OpenAI model from the terminal.
#[derive(Parser, Debug)]
#[command(name = "lackai", version, about = "Chat with an OpenAI model from the terminal")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (YAML or JSON). Read from the environment otherwise.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Model name override.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Do not read or write the request cache.
    #[arg(long, global = true)]
    pub no_cache: bool,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive chat; an empty line exits.
    Chat {
        /// System prompt for the session.
        #[arg(long)]
        system: Option<String>,

        /// First question, asked before reading from stdin.
        question: Option<String>,
    },
    /// Run a prompt template.
    Prompt {
        /// Template file: system section, `---`, user section.
        #[arg(long)]
        template: PathBuf,

        /// Placeholder value as KEY=VALUE. Repeatable.
        #[arg(long = "data", value_parser = parse_key_value)]
        data: Vec<(String, String)>,

        /// Stream the cleaned reply into this file instead of printing it.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

impl Cli {
    /// Build the client and run the selected subcommand.
    pub async fn run(self) -> Result<()> {
        let config = self.client_config()?;
        let mut client = CompletionClient::new(config)?.with_logger(ConsoleLogger::default());

        match self.command {
            Command::Chat { system, question } => {
                chat::run(&mut client, system.as_deref(), question.as_deref()).await
            }
            Command::Prompt {
                template,
                data,
                out,
            } => prompt::run(&mut client, &template, data, out.as_deref()).await,
        }
    }

    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => load_from_file(path)?,
            None => ClientConfig::from_env()?,
        };
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if self.no_cache {
            config.cache_file = None;
        } else if config.cache_file.is_none() {
            config.cache_file = Some(FileRequestCache::default_location());
        }
        Ok(config)
    }
}

/// Parse `KEY=VALUE`; the value may itself contain `=`.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
