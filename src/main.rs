use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;

use daybook::commands::*;
use daybook::models::Priority;

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "Terminal day planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Longer free-form description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Priority (low, medium, high)
        #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date in YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<String>,
        /// Start time in HH:MM (omit for an all-day task)
        #[arg(short, long)]
        from: Option<String>,
        /// End time in HH:MM
        #[arg(short, long)]
        to: Option<String>,
        /// Repeat every day through this date (inclusive)
        #[arg(short, long)]
        until: Option<String>,
    },
    /// Show the agenda for a date (default: today)
    Agenda {
        /// Date in YYYY-MM-DD
        date: Option<String>,
    },
    /// List incomplete tasks from past dates
    Overdue,
    /// Toggle a task between done and pending
    Done {
        /// Task id, or a unique prefix of one
        id: String,
    },
    /// Move a task to another date
    Move {
        /// Task id, or a unique prefix of one
        id: String,
        /// New date in YYYY-MM-DD
        date: String,
        /// Do not flag the task as rescheduled
        #[arg(long)]
        no_mark: bool,
    },
    /// Edit a task
    Edit {
        /// Task id, or a unique prefix of one
        id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// New description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// New priority
        #[arg(short, long, value_enum)]
        priority: Option<Priority>,
        /// New due date (series start date for repeating tasks)
        #[arg(short, long)]
        date: Option<String>,
        /// New start time in HH:MM
        #[arg(short, long)]
        from: Option<String>,
        /// New end time in HH:MM
        #[arg(short, long)]
        to: Option<String>,
        /// Repeat every day through this date (inclusive)
        #[arg(short, long, conflicts_with = "once")]
        until: Option<String>,
        /// Stop repeating; keep a single occurrence
        #[arg(long)]
        once: bool,
    },
    /// Remove a task
    Remove {
        /// Task id, or a unique prefix of one
        id: String,
    },
    /// Pull the remote store's tasks into the local snapshot
    Sync,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Add {
            title,
            description,
            priority,
            date,
            from,
            to,
            until,
        }) => cmd_add(title, description, priority, date, from, to, until, false),
        Some(Commands::Agenda { date }) => cmd_agenda(date),
        Some(Commands::Overdue) => cmd_overdue(),
        Some(Commands::Done { id }) => cmd_done(id, false),
        Some(Commands::Move { id, date, no_mark }) => cmd_move(id, date, no_mark, false),
        Some(Commands::Edit {
            id,
            title,
            description,
            priority,
            date,
            from,
            to,
            until,
            once,
        }) => cmd_edit(
            id,
            title,
            description,
            priority,
            date,
            from,
            to,
            until,
            once,
            false,
        ),
        Some(Commands::Remove { id }) => cmd_remove(id, false),
        Some(Commands::Sync) => cmd_sync(false),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "daybook", &mut io::stdout());
        }
        None => cmd_agenda(None),
    }
}
