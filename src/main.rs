use std::io;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use nib::calendar::ViewMode;
use nib::commands::*;
use nib::config::{load_config, Config};
use nib::dates::today;
use nib::models::BulletType;
use nib::status::Action;
use nib::storage::SqliteStore;

#[derive(Parser)]
#[command(name = "nib")]
#[command(about = "Bullet journal with recurring tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's open tasks (default)
    Today {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add an entry
    Add {
        /// Entry text (quoted if it has spaces)
        content: String,
        /// Day in YYYY-MM-DD, defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Add a note instead of a task
        #[arg(long, conflicts_with = "event")]
        note: bool,
        /// Add an event instead of a task
        #[arg(long)]
        event: bool,
    },
    /// Mark a task done, or reopen a done task
    Toggle { id: i64 },
    /// Mark a task done
    Done { id: i64 },
    /// Reopen a done task
    Reopen { id: i64 },
    /// Edit an entry
    Edit {
        id: i64,
        /// New text
        #[arg(short, long)]
        content: Option<String>,
        /// New day in YYYY-MM-DD
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Remove an entry
    Remove { id: i64 },
    /// List entries for a day, week or month
    List {
        /// Day to center the view on, defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Show the Monday-Sunday week
        #[arg(short, long, conflicts_with = "month")]
        week: bool,
        /// Show the whole month
        #[arg(short, long)]
        month: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List entries scheduled after today
    Future {
        #[arg(long)]
        json: bool,
    },
    /// Manage recurring tasks
    Rule {
        #[command(subcommand)]
        command: RuleCommands,
    },
    /// Manage aspirations
    Aspire {
        #[command(subcommand)]
        command: AspireCommands,
    },
    /// Show the effective configuration
    Config,
    /// Delete all entries, recurring tasks and aspirations
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum RuleCommands {
    /// Add a recurring task
    Add {
        /// Text copied into each generated task
        title: String,
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
    /// List recurring tasks
    List,
    /// Stop generating tasks from a rule
    Pause { id: i64 },
    /// Resume a paused rule
    Resume { id: i64 },
    /// Remove a rule (tasks it generated are kept)
    Remove { id: i64 },
    /// Check whether a rule fires on a date
    Check {
        id: i64,
        /// Date in YYYY-MM-DD
        date: String,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ScheduleArgs {
    /// Every day
    #[arg(long)]
    daily: bool,
    /// Every week on a weekday (monday..sunday or 1..7)
    #[arg(long, value_name = "DAY")]
    weekly: Option<String>,
    /// Every month on a day (1-31); skips months without that day
    #[arg(long, value_name = "N")]
    monthly_day: Option<i64>,
    /// Every month on the Nth weekday, e.g. `--monthly last friday`
    #[arg(long, num_args = 2, value_names = ["ORDINAL", "DAY"])]
    monthly: Option<Vec<String>>,
}

#[derive(Subcommand)]
enum AspireCommands {
    /// Add an aspiration
    Add {
        title: String,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// List aspirations
    List,
    /// Remove an aspiration
    Remove { id: i64 },
}

fn init_tracing(config: &Config) {
    // Logs go to stderr; stdout is reserved for tables and JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "nib", &mut io::stdout());
        return Ok(());
    }

    let config = load_config().context("failed to load configuration")?;
    init_tracing(&config);

    if let Some(Commands::Config) = cli.command {
        cmd_config(&config);
        return Ok(());
    }

    let db_path = config.database_path();
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    let today = today();

    match cli.command {
        Some(Commands::Today { json }) => cmd_today(&store, today, json)?,
        None => cmd_today(&store, today, false)?,
        Some(Commands::Add { content, date, note, event }) => {
            let bullet_type = if note {
                BulletType::Note
            } else if event {
                BulletType::Event
            } else {
                BulletType::Task
            };
            cmd_add(&store, &content, date.as_deref(), bullet_type, today)?;
        }
        Some(Commands::Toggle { id }) => {
            cmd_toggle(&store, id)?;
        }
        Some(Commands::Done { id }) => {
            cmd_set_status(&store, id, Action::Complete)?;
        }
        Some(Commands::Reopen { id }) => {
            cmd_set_status(&store, id, Action::Reopen)?;
        }
        Some(Commands::Edit { id, content, date }) => {
            cmd_edit(&store, id, content.as_deref(), date.as_deref())?;
        }
        Some(Commands::Remove { id }) => cmd_remove(&store, id)?,
        Some(Commands::List { date, week, month, json }) => {
            let date = match date {
                Some(d) => parse_cli_date(&d)?,
                None => today,
            };
            let mode = if week {
                ViewMode::Week
            } else if month {
                ViewMode::Month
            } else {
                ViewMode::Day
            };
            cmd_list(&store, date, mode, today, json)?;
        }
        Some(Commands::Future { json }) => cmd_future(&store, today, json)?,
        Some(Commands::Rule { command }) => match command {
            RuleCommands::Add { title, schedule } => {
                let schedule = schedule_from_args(
                    schedule.daily,
                    schedule.weekly.as_deref(),
                    schedule.monthly_day,
                    schedule.monthly.as_deref(),
                )?;
                cmd_rule_add(&store, &title, schedule)?;
            }
            RuleCommands::List => cmd_rule_list(&store, today)?,
            RuleCommands::Pause { id } => cmd_rule_set_active(&store, id, false)?,
            RuleCommands::Resume { id } => cmd_rule_set_active(&store, id, true)?,
            RuleCommands::Remove { id } => cmd_rule_remove(&store, id)?,
            RuleCommands::Check { id, date } => {
                cmd_rule_check(&store, id, &date)?;
            }
        },
        Some(Commands::Aspire { command }) => match command {
            AspireCommands::Add { title, note } => cmd_aspire_add(&store, &title, note.as_deref())?,
            AspireCommands::List => cmd_aspire_list(&store)?,
            AspireCommands::Remove { id } => cmd_aspire_remove(&store, id)?,
        },
        Some(Commands::Reset { force }) => cmd_reset(&store, force)?,
        Some(Commands::Config) | Some(Commands::Completions { .. }) => {}
    }
    Ok(())
}
