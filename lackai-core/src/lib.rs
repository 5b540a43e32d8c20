//! LackAI Core Library
//!
//! A thin wrapper around the OpenAI chat completions API: it keeps the message
//! history, streams and accumulates replies, continues truncated answers,
//! dispatches model-requested function calls to local callbacks, and caches
//! final answers by request fingerprint.
//!
//! ```no_run
//! use lackai_core::{ClientConfig, CompletionClient};
//!
//! # async fn run() -> Result<(), lackai_core::CompletionError> {
//! let config = ClientConfig::from_env()?;
//! let mut client = CompletionClient::new(config)?;
//! client.reset(Some("You are terse."), None, None);
//! let reply = client.text_complete(Some("Name a prime.")).await?;
//! println!("{}", reply.text());
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod cache;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod facet;
pub mod functions;
pub mod logger;
pub mod protocol;
pub mod providers;
pub mod response;
pub mod template;

pub use accumulator::ResponseAccumulator;
pub use cache::{FileRequestCache, MemoryCache, NoCache, RequestCache};
pub use client::{CompletionClient, CONTINUATION_INSTRUCTION};
pub use config::ClientConfig;
pub use conversation::Conversation;
pub use error::{CompletionError, CompletionResult};
pub use facet::Facet;
pub use functions::{
    Arguments, FunctionRegistry, FunctionSet, FunctionSpec, ParameterSpec, ParameterType,
};
pub use logger::{CompletionLogger, NullLogger, TracingLogger};
pub use response::CompletionResponse;
pub use template::{JobDescription, JobTemplate};

/// Returns the version of the LackAI Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
