//! Interactive terminal chat against a model-routed `/ask` endpoint.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the server on the default endpoint
//! askchat
//!
//! # Point at another server and start with a different model
//! askchat --endpoint http://10.0.0.5:8000 --model gpt-4.1-mini
//!
//! # Or take the endpoint from the environment
//! ASKCHAT_ENDPOINT=http://10.0.0.5:8000 askchat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/models` - Show the model picker
//! - `/model <name>` - Change the model
//! - `/stats` - Show session statistics
//! - `/config` - Show the configuration
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use askchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, RenderObserver, Renderer,
    help_text, parse_command,
};
use askchat::render::{echoed_rows, erase_rows};
use askchat::{AskClient, Model};

const PROMPT: &str = "You: ";

/// Main entry point for the askchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("askchat [OPTIONS]");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ChatConfig::try_from(args)?;
    let client = AskClient::with_options(&config.endpoint, config.timeout)?;
    let session = ChatSession::new(client, &config);
    session.add_observer(RenderObserver::new(
        PlainTextRenderer::with_color(config.use_color).with_width(config.width),
    ));
    let mut renderer = PlainTextRenderer::with_color(config.use_color).with_width(config.width);
    let mut rl = DefaultEditor::new()?;

    renderer.print_info(&format!(
        "AI Chat (model: {}, endpoint: {})",
        session.selected_model(),
        session.transport().endpoint()
    ));
    renderer.print_info("Type /help for commands, /quit to exit\n");
    for turn in session.turns() {
        renderer.print_turn(&turn);
    }

    loop {
        let readline = rl.readline(PROMPT);

        match readline {
            Ok(input) => {
                let line = input.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::ListModels => {
                            renderer.print_models(&Model::ALL, session.selected_model());
                        }
                        ChatCommand::Model(model) => {
                            if model == session.selected_model() {
                                renderer.print_info(&format!("Already using {model}"));
                            }
                            session.select_model(model);
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(&config, &session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // The observer redraws the user's text as a bubble.
                if config.use_color
                    && let Ok((columns, _)) = crossterm::terminal::size()
                {
                    print!("{}", erase_rows(echoed_rows(PROMPT, &input, columns.into())));
                }
                session.submit(line).await;
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_stats(session: &ChatSession<AskClient>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", stats.model);
    println!("      Turns: {}", stats.turn_count);
    println!(
        "      Requests: {} ({} failed)",
        stats.total_requests, stats.failed_requests
    );
    match stats.continuation_token {
        Some(ref token) => println!("      Continuation token: {}", token),
        None => println!("      Continuation token: (none)"),
    }
    match stats.last_error {
        Some(ref kind) => println!("      Last error: {}", kind),
        None => println!("      Last error: (none)"),
    }
}

fn print_config(config: &ChatConfig, session: &ChatSession<AskClient>) {
    println!("    Current Configuration:");
    println!("      Endpoint: {}", session.transport().endpoint());
    println!("      Model: {}", session.selected_model());
    println!("      Width: {}", config.width);
    match config.timeout {
        Some(timeout) => println!("      Timeout: {}s", timeout.as_secs()),
        None => println!("      Timeout: (none)"),
    }
    println!(
        "      Color: {}",
        if config.use_color {
            "enabled"
        } else {
            "disabled"
        }
    );
}
