//! toolloop - interactive CLI entry point.
//!
//! Reads user messages from stdin and runs each through the agent until
//! the user types `quit`.

use std::io::{self, BufRead, Write};

use toolloop::{agent::Agent, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolloop=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; a missing API key fails startup with a non-zero exit.
    let config = Config::from_env()?;
    info!("Loaded configuration: model={}", config.model);

    let mut agent = Agent::new(config)?;

    println!("Hi! I'm your AI assistant. I can help with calculations, visualizations, text analysis, and more.");
    println!("What would you like to explore today? (type 'quit' to exit)");

    let stdin = io::stdin();
    loop {
        print!("\nYou: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }

        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") {
            println!("\nGoodbye! Have a great day!");
            break;
        }
        if input.is_empty() {
            continue;
        }

        match agent.run_turn(input).await {
            Ok(reply) => println!("\nAssistant: {}", reply),
            Err(e) => {
                tracing::error!("Turn failed: {}", e);
                println!("\nOops! Something went wrong on my end. Let's try something else!");
            }
        }
    }

    Ok(())
}
