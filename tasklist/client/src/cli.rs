//! Terminal front end: each invocation loads the list, runs one operation and
//! prints the resulting view.
use crate::api::TaskApi;
use crate::controller::{Outcome, TaskClient};
use crate::http::HttpTaskApi;
use crate::notify::{ConfirmationGate, Notification, Notifier};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::process::ExitCode;
use tasklist_core::{Filter, Stats, Task, TaskId};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";

#[derive(Parser, Debug)]
#[command(name = "tasklist", about = "Manage the shared task list")]
pub struct Cli {
    /// Address of the task endpoint
    #[arg(long, env = "TASKLIST_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
enum Commands {
    /// Show tasks
    List {
        #[arg(long, default_value_t = Filter::All)]
        filter: Filter,
    },
    /// Add a task
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Flip a task between completed and pending
    Toggle { id: TaskId },
    /// Replace the text of a task
    Edit {
        id: TaskId,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Delete a task
    Delete {
        id: TaskId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Prints notifications to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        eprintln!("{}", notification);
    }
}

/// Confirms on `y`/`yes` typed at the terminal, or unconditionally when told to.
pub struct PromptGate {
    assume_yes: bool,
}

impl PromptGate {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl ConfirmationGate for PromptGate {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", prompt);
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(err) => {
                tracing::warn!("Cannot read confirmation: {}", err);
                false
            }
        }
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Runs one command and prints the resulting view. A failed operation has
/// already been reported through the notifier, so it comes back as the
/// outcome rather than as an error.
pub async fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let api = HttpTaskApi::new(cli.api_url);
    let mut client = TaskClient::new(api, TerminalNotifier);
    let outcome = execute(&mut client, cli.command).await;

    let mut stdout = std::io::stdout().lock();
    render(&mut stdout, &client.visible_tasks(), client.stats())?;
    Ok(outcome)
}

pub fn exit_code(outcome: &Outcome) -> ExitCode {
    match outcome {
        Outcome::Failed(_) => ExitCode::FAILURE,
        Outcome::Applied | Outcome::Skipped => ExitCode::SUCCESS,
    }
}

async fn execute<A: TaskApi, N: Notifier>(
    client: &mut TaskClient<A, N>,
    command: Commands,
) -> Outcome {
    if let failed @ Outcome::Failed(_) = client.load().await {
        return failed;
    }
    match command {
        Commands::List { filter } => {
            client.set_filter(filter);
            Outcome::Applied
        }
        Commands::Add { text } => {
            client.set_input(text.join(" "));
            client.add_task().await
        }
        Commands::Toggle { id } => client.toggle_completed(id).await,
        Commands::Edit { id, text } => client.edit_text(id, &text.join(" ")).await,
        Commands::Delete { id, yes } => client.delete_task(id, &PromptGate::new(yes)).await,
    }
}

/// Writes one line per task followed by the counters.
pub fn render<W: Write>(out: &mut W, tasks: &[&Task], stats: Stats) -> std::io::Result<()> {
    if tasks.is_empty() {
        writeln!(out, "No tasks to show")?;
    }
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        writeln!(out, "[{}] {}  {}", mark, task.id, task.text)?;
    }
    writeln!(
        out,
        "{} total, {} completed, {} pending",
        stats.total, stats.completed, stats.pending
    )
}
