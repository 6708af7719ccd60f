// server/src/cli/interactive.rs
use anyhow::Result;
use clap::Parser;
use log::debug;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use lib::commands::Commands;

use crate::cli::cli::{run_single_command, AppState};

#[derive(Parser, Debug)]
#[command(name = "hospital")]
struct ReplCommand {
    #[command(subcommand)]
    command: Commands,
}

pub async fn run_cli_interactive(state: &AppState) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!(
        "{} - type 'help' for commands, 'exit' to quit.",
        state.config.hospital_name
    );

    loop {
        let prompt = match state.current_session().await {
            Some(ctx) => format!("{}@hospital> ", ctx.role),
            None => "hospital> ".to_string(),
        };
        match rl.readline(&prompt) {
            Ok(line) => {
                let line_trim = line.trim();
                if line_trim.is_empty() {
                    continue;
                }
                rl.add_history_entry(line_trim).ok();

                let args = match shlex::split(line_trim) {
                    Some(a) => a,
                    None => {
                        eprintln!("Error: malformed input, check quoting.");
                        continue;
                    }
                };

                let parsed = ReplCommand::try_parse_from(
                    std::iter::once("hospital".to_string()).chain(args),
                );
                match parsed {
                    Ok(repl) => {
                        debug!("parsed command: {:?}", repl.command);
                        if matches!(repl.command, Commands::Exit) {
                            println!("Goodbye.");
                            break;
                        }
                        let output = run_single_command(repl.command, state).await;
                        if !output.is_empty() {
                            println!("{}", output);
                        }
                    }
                    // clap renders its own help/usage/error text.
                    Err(e) => {
                        let _ = e.print();
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Goodbye.");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
