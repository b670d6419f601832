use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use kbchat_cli::{format_browse, format_health, format_stats, reply_footer, CliClient, CliError};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

const REPL_COMMANDS: &[&str] = &[
    "add:",
    "delete:",
    "update:",
    "list",
    "stats",
    "help",
    "clear",
    ":session",
    ":stats",
    ":browse",
    ":health",
    ":help",
    "exit",
    "quit",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Chat(String),
    Session(String),
    Stats,
    Browse(usize, usize),
    Health,
    Help,
    Exit,
    Empty,
    Unknown(String),
}

#[derive(Default)]
struct ReplHelper;

impl Helper for ReplHelper {}
impl Hinter for ReplHelper {
    type Hint = String;
}
impl Highlighter for ReplHelper {}
impl Validator for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let pos = pos.min(line.len());
        let input = &line[..pos];
        if input.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }

        let pairs = complete_candidates(input)
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.to_string(),
                replacement: candidate.to_string(),
            })
            .collect();
        Ok((0, pairs))
    }
}

/// Lines starting with `:` are handled locally; everything else is sent to
/// the chat endpoint as-is.
fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    if line == "exit" || line == "quit" {
        return ReplCommand::Exit;
    }
    if !line.starts_with(':') {
        return ReplCommand::Chat(line.to_string());
    }

    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (command, args.as_slice()) {
        (":help", []) => ReplCommand::Help,
        (":stats", []) => ReplCommand::Stats,
        (":health", []) => ReplCommand::Health,
        (":session", [id]) => ReplCommand::Session((*id).to_string()),
        (":session", _) => ReplCommand::Unknown("usage: :session <id>".to_string()),
        (":browse", args) if args.len() <= 2 => {
            let limit = args.first().map_or(Ok(10), |v| v.parse::<usize>());
            let offset = args.get(1).map_or(Ok(0), |v| v.parse::<usize>());
            match (limit, offset) {
                (Ok(limit), Ok(offset)) if limit > 0 => ReplCommand::Browse(limit, offset),
                _ => ReplCommand::Unknown("usage: :browse [limit] [offset]".to_string()),
            }
        }
        (":browse", _) => ReplCommand::Unknown("usage: :browse [limit] [offset]".to_string()),
        _ => ReplCommand::Unknown(format!("unknown command: {line}")),
    }
}

fn help_text() -> String {
    [
        "Chat (sent to the gateway):",
        "  <question>                        Search the knowledge base",
        "  add: title | content | category   Add an entry",
        "  delete: search term               Delete the best match",
        "  update: search term | content     Replace the best match's content",
        "  list [category|all]               List entries",
        "  stats                             Database statistics",
        "  clear                             Clear cached search results",
        "  help                              Server-side command help",
        "Local:",
        "  :session <id>                     Switch session id",
        "  :stats                            Raw database statistics",
        "  :browse [limit] [offset]          Page through entries",
        "  :health                           Gateway health",
        "  :help                             Show this help",
        "  exit | quit                       Exit REPL",
    ]
    .join("\n")
}

#[derive(Debug)]
struct ReplState {
    session_id: String,
    client: CliClient,
}

#[tokio::main]
async fn main() {
    let cli = kbchat_cli::Cli::parse();

    if let Some(command) = cli.command {
        match kbchat_cli::run(&cli.server, command).await {
            Ok(output) => {
                println!("{output}");
            }
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
        return;
    }

    let client = match CliClient::new(cli.server.clone()) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let mut editor = match Editor::<ReplHelper, rustyline::history::DefaultHistory>::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("error: failed to start REPL: {err}");
            std::process::exit(1);
        }
    };
    editor.set_helper(Some(ReplHelper));
    let history = history_file();
    let _ = editor.load_history(&history);

    let mut state = ReplState {
        session_id: "default".to_string(),
        client,
    };
    println!(
        "{}",
        format!("kbchat interactive mode ({}). Type `:help`.", cli.server).bright_green()
    );
    loop {
        match editor.readline("kbchat> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(trimmed);
                match run_repl_command(&mut state, parse_command(trimmed)).await {
                    Ok(should_exit) => {
                        if should_exit {
                            break;
                        }
                    }
                    Err(err) => eprintln!("{} {}", "error:".red(), err),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted)
            | Err(rustyline::error::ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(err) => {
                eprintln!("{} {err}", "error:".red());
                break;
            }
        }
    }

    if let Err(err) = editor.save_history(&history) {
        eprintln!("{} failed to save history: {err}", "warning:".yellow());
    }
}

async fn run_repl_command(state: &mut ReplState, command: ReplCommand) -> Result<bool, CliError> {
    match command {
        ReplCommand::Chat(message) => {
            let reply = state.client.chat(&message, &state.session_id).await?;
            let text = if reply.data_modified {
                reply.response.green()
            } else {
                reply.response.normal()
            };
            println!("{text}");
            println!("{}", reply_footer(&reply).dimmed());
        }
        ReplCommand::Session(session_id) => {
            println!("{} {}", "session:".green(), session_id.cyan());
            state.session_id = session_id;
        }
        ReplCommand::Stats => {
            let stats = state.client.stats().await?;
            println!("{}", format_stats(&stats).bright_blue());
        }
        ReplCommand::Browse(limit, offset) => {
            let page = state.client.browse(limit, offset).await?;
            println!("{}", format_browse(&page));
        }
        ReplCommand::Health => {
            let health = state.client.health().await?;
            println!("{}", format_health(&health).green());
        }
        ReplCommand::Help => {
            println!("{}", help_text().bright_blue());
        }
        ReplCommand::Exit => {
            println!("{}", "bye".bright_green());
            return Ok(true);
        }
        ReplCommand::Empty => {}
        ReplCommand::Unknown(message) => {
            println!("{} {message}", "warning:".yellow());
            println!("{}", "Type `:help` for available commands.".yellow());
        }
    }

    Ok(false)
}

fn history_file() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".kbchat-history");
    }
    PathBuf::from(".kbchat-history")
}

fn complete_candidates(prefix: &str) -> BTreeSet<&'static str> {
    REPL_COMMANDS
        .iter()
        .copied()
        .filter(|command| command.starts_with(prefix))
        .collect()
}
