//! Command-line front end.

use std::io::Write;
use std::path::PathBuf;

use arc_assistant::capabilities::{CapabilitySet, WttrWeather};
use arc_assistant::commands::{self, CommandCategory, CommandTable};
use arc_assistant::config::{Config, Settings};
use arc_assistant::tasks::{create_task_channel, AssistantMessage};
use arc_assistant::{AppError, Assistant, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const PROMPT: &str = "> ";

#[derive(Parser)]
#[command(name = "arc-assistant", version)]
#[command(about = "ARC Hub assistant: match commands and reply", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file (default: $ARC_ASSISTANT_CONFIG or the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Command file to load instead of the built-in table (repeatable, merged in order)
    #[arg(long = "commands", value_name = "FILE", global = true)]
    pub command_files: Vec<PathBuf>,

    /// Minimum similarity for a fuzzy match, in (0, 1]
    #[arg(long, global = true)]
    pub threshold: Option<f64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Interactive conversation on stdin (default)
    Chat,

    /// Reply to a single utterance
    Ask {
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },

    /// List the loaded commands by category
    List,

    /// Validate command files without starting the assistant
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) if !path.exists() => {
            return Err(AppError::other(format!(
                "Config file {} does not exist.",
                path.display()
            )))
        }
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let settings = apply_overrides(config.settings, &cli)?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => chat(build_assistant(&settings)?).await,
        Command::Ask { words } => {
            let assistant = build_assistant(&settings)?;
            let response = assistant.handle(&words.join(" ")).await;
            println!("{}", response.text);
            Ok(())
        }
        Command::List => {
            list(&load_table(&settings)?);
            Ok(())
        }
        Command::Check { files } => check(&files, &settings),
    }
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(mut settings: Settings, cli: &Cli) -> Result<Settings> {
    if !cli.command_files.is_empty() {
        settings.command_files = cli.command_files.clone();
    }
    if let Some(threshold) = cli.threshold {
        settings.match_threshold = threshold;
    }
    settings.validate()?;
    Ok(settings)
}

fn load_table(settings: &Settings) -> Result<CommandTable> {
    let table = if settings.command_files.is_empty() {
        CommandTable::builtin()?
    } else {
        CommandTable::load_files(&settings.command_files, settings.duplicate_policy)?
    };
    Ok(table)
}

fn build_capabilities(settings: &Settings) -> CapabilitySet {
    let mut capabilities = CapabilitySet::system();
    if let Some(weather) = &settings.weather {
        match WttrWeather::new(weather) {
            Ok(client) => capabilities = capabilities.with_weather(client),
            Err(e) => warn!("Weather disabled: {}", e),
        }
    }
    capabilities
}

fn build_assistant(settings: &Settings) -> Result<Assistant> {
    let table = commands::install(load_table(settings)?)?;
    Ok(Assistant::from_settings(
        table,
        settings,
        build_capabilities(settings),
    ))
}

/// Read utterances from stdin and print replies as they complete.
async fn chat(assistant: Assistant) -> Result<()> {
    println!(
        "ARC Assistant v{}. Say \"help\" to see what I can do, \"exit\" to leave.",
        env!("CARGO_PKG_VERSION")
    );
    prompt()?;

    let (mut rx, spawner) = create_task_channel();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_id: u64 = 0;
    let mut pending: usize = 0;
    let mut input_closed = false;
    let mut leaving = false;

    loop {
        let reading = !input_closed && !leaving;
        if !reading && pending == 0 {
            break;
        }

        tokio::select! {
            line = lines.next_line(), if reading => match line? {
                Some(line) if line.trim().is_empty() => prompt()?,
                Some(line) => {
                    spawner.spawn_handle(&assistant, next_id, line);
                    next_id += 1;
                    pending += 1;
                }
                None => input_closed = true,
            },
            Some(message) = rx.recv(), if pending > 0 => {
                pending -= 1;
                let AssistantMessage::Responded { response, .. } = message;
                println!("{}", response.text);
                if response.ends_session() {
                    leaving = true;
                } else if !input_closed {
                    prompt()?;
                }
            }
        }
    }

    info!(utterances = next_id, "Conversation ended");
    Ok(())
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(PROMPT.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn list(table: &CommandTable) {
    for category in CommandCategory::ALL {
        let mut entries = table.by_category(category).peekable();
        if entries.peek().is_none() {
            continue;
        }
        println!("{}", category.display());
        for entry in entries {
            let marker = if entry.intent.is_dynamic() { "*" } else { " " };
            println!("  {}{:<22} {}", marker, entry.input, entry.output);
        }
    }
    println!("\n{} commands (* = uses a capability)", table.len());
}

fn check(files: &[PathBuf], settings: &Settings) -> Result<()> {
    let table = CommandTable::load_files(files, settings.duplicate_policy)?;
    println!(
        "OK: {} commands in {} file(s) (duplicates: {:?})",
        table.len(),
        files.len(),
        settings.duplicate_policy
    );
    for category in CommandCategory::ALL {
        let count = table.by_category(category).count();
        if count > 0 {
            println!("  {:<10} {}", category.display(), count);
        }
    }
    Ok(())
}
