//! Interactive chat loop.

use crate::console::IncrementalPrinter;
use anyhow::Result;
use lackai_core::{CompletionClient, CompletionResponse};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Chat until stdin closes or an empty line is entered.
pub async fn run(
    client: &mut CompletionClient,
    system: Option<&str>,
    question: Option<&str>,
) -> Result<()> {
    client.reset(system, None, None);

    if let Some(question) = question {
        ask(client, question).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nYour input: ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            break;
        }

        ask(client, input).await?;
        println!("\n---end---");
    }

    println!("\nExit - Goodbye");
    Ok(())
}

async fn ask(client: &mut CompletionClient, question: &str) -> Result<()> {
    let mut printer = IncrementalPrinter::new();
    client
        .text_complete_streaming(Some(question), |partial: &CompletionResponse| {
            printer.print(partial)
        })
        .await?;
    Ok(())
}
