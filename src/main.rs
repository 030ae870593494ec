use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use eulogy_assist::config::ConversationConfig;
use eulogy_assist::conversation::{ChatMessage, ConversationManager, MessageRole};
use eulogy_assist::llm::{KeywordClassifier, TemplateDraftGenerator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ConversationConfig::from_env()?;

    eprintln!("🕯  Eulogy Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Commands: /form, /transcript, /reset, /quit");
    eprintln!("   Ctrl-C while a draft is being written cancels it.\n");

    let mut manager = ConversationManager::new(
        Arc::new(TemplateDraftGenerator::new()),
        Arc::new(KeywordClassifier::new()),
        config,
    );
    let outcome = manager.start();
    for message in manager.transcript() {
        print_message(message);
    }
    tracing::debug!(state = %outcome.state, "Awaiting first answer");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/form" => println!("{}", serde_json::to_string_pretty(manager.form())?),
            "/transcript" => println!("{}", serde_json::to_string_pretty(manager.transcript())?),
            "/reset" => {
                manager.reset();
                manager.start();
                for message in manager.transcript() {
                    print_message(message);
                }
            }
            text => {
                let token = manager.cancel_token();
                let interrupt = tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        token.cancel();
                    }
                });

                let outcome = manager.handle_utterance(text).await;
                interrupt.abort();

                if let Some(reply) = &outcome.reply {
                    print_message(reply);
                }
            }
        }
        eprint!("> ");
    }

    Ok(())
}

fn print_message(message: &ChatMessage) {
    match message.role {
        MessageRole::User => {}
        MessageRole::Assistant => println!("\n{}\n", message.content),
        MessageRole::Draft => {
            println!("\n──── Draft ────\n\n{}\n\n───────────────\n", message.content)
        }
    }
}
