//! Terminal front end for the ticktodo store.
//!
//! # Responsibility
//! - Map subcommands onto task store operations.
//! - Render filter tabs, task rows and countdowns.
//! - Host the recurring expiry check while `watch` runs.

use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{mpsc, Arc};
use ticktodo_core::{
    default_log_level, init_logging, ExpiryTicker, FilterMode, KvTaskRepository,
    SqliteKeyValueStore, StoreConfig, SystemClock, TaskCounts, TaskId, TaskRow, TaskStore,
    TimerConfig,
};

const SHORT_ID_LEN: usize = 8;

type CliStore = TaskStore<KvTaskRepository<SqliteKeyValueStore>>;
type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "ticktodo", author, version, about = "Todo list with per-task countdowns")]
struct Cli {
    /// SQLite file holding the task slot
    #[arg(long, default_value = "ticktodo.sqlite3", global = true)]
    db: PathBuf,

    /// Storage slot key
    #[arg(long, global = true)]
    key: Option<String>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off without it
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a task, optionally with a countdown (90, 25:00, 1h30m, 45s)
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        #[arg(long)]
        timer: Option<TimerConfig>,
    },
    /// Flip a task between open and completed
    Toggle { id: String },
    /// Remove a task
    Delete { id: String },
    /// Remove all completed tasks
    ClearCompleted,
    /// Print the task list
    List {
        #[arg(long, short, default_value = "all")]
        filter: FilterMode,
    },
    /// Re-render once per tick while countdowns run
    Watch {
        #[arg(long, short, default_value = "all")]
        filter: FilterMode,
        /// Stop after this many ticks instead of running until killed
        #[arg(long)]
        ticks: Option<u64>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Toggle { .. } => "toggle",
            Self::Delete { .. } => "delete",
            Self::ClearCompleted => "clear_completed",
            Self::List { .. } => "list",
            Self::Watch { .. } => "watch",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(cli: &Cli) {
    let Some(log_dir) = cli.log_dir.as_deref() else {
        return;
    };
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = StoreConfig::default();
    if let Some(key) = cli.key {
        config = config.with_storage_key(key);
    }

    let kv = SqliteKeyValueStore::open(&cli.db)?;
    let repo = KvTaskRepository::with_key(kv, config.storage_key.clone());
    let mut store = TaskStore::open(repo, Arc::new(SystemClock));
    info!(
        "event=cli_command module=cli status=start command={}",
        cli.command.name()
    );

    match cli.command {
        Command::Add { text, timer } => {
            let task = store.add(&text.join(" "), timer)?;
            println!("added {}", task.id.short(SHORT_ID_LEN));
        }
        Command::Toggle { id } => {
            let id = resolve_id(&store, &id)?;
            let task = store.toggle(&id)?;
            let state = if task.completed { "completed" } else { "reopened" };
            println!("{state} {}", task.id.short(SHORT_ID_LEN));
        }
        Command::Delete { id } => {
            let id = resolve_id(&store, &id)?;
            if store.delete(&id)? {
                println!("deleted {}", id.short(SHORT_ID_LEN));
            }
        }
        Command::ClearCompleted => {
            let removed = store.clear_completed()?;
            println!("cleared {removed} completed");
        }
        Command::List { filter } => {
            store.expire_due()?;
            print!("{}", render(&store, filter));
        }
        Command::Watch { filter, ticks } => watch(store, &config, filter, ticks)?,
    }

    Ok(())
}

fn resolve_id(store: &CliStore, prefix: &str) -> CliResult<TaskId> {
    store
        .resolve(prefix)
        .map(|task| task.id.clone())
        .ok_or_else(|| format!("no single task matches `{prefix}`").into())
}

fn watch(
    store: CliStore,
    config: &StoreConfig,
    filter: FilterMode,
    ticks: Option<u64>,
) -> CliResult<()> {
    let shared = store.into_shared();
    let (expired_tx, expired_rx) = mpsc::channel::<Vec<TaskId>>();
    let ticker = ExpiryTicker::spawn(shared.clone(), config.tick_interval, move |ids| {
        let _ = expired_tx.send(ids.to_vec());
    })?;

    let mut rendered: u64 = 0;
    loop {
        {
            let guard = shared
                .lock()
                .map_err(|_| "task store lock poisoned".to_string())?;
            print!("{}", render(&guard, filter));
        }
        rendered += 1;
        if ticks.is_some_and(|limit| rendered >= limit) {
            break;
        }

        match expired_rx.recv_timeout(config.tick_interval) {
            Ok(ids) => {
                for id in ids {
                    println!("timer expired: {}", id.short(SHORT_ID_LEN));
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        println!();
    }

    ticker.cancel();
    Ok(())
}

fn render(store: &CliStore, filter: FilterMode) -> String {
    let counts = store.counts();
    let mut out = render_tabs(&counts, filter);
    out.push('\n');

    let rows = store.rows(filter);
    if rows.is_empty() {
        out.push_str(&filter.empty_message());
        out.push('\n');
    }
    for row in &rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }

    if counts.completed > 0 {
        out.push_str(&format!("Clear completed ({})\n", counts.completed));
    }
    out
}

fn render_tabs(counts: &TaskCounts, selected: FilterMode) -> String {
    FilterMode::ALL_MODES
        .iter()
        .map(|mode| {
            let tab = format!("{} ({})", mode.label(), counts.for_mode(*mode));
            if *mode == selected {
                format!("[{tab}]")
            } else {
                tab
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn render_row(row: &TaskRow) -> String {
    let check = if row.completed { "[x]" } else { "[ ]" };
    let mut line = format!("{check} {:<8} {}", row.id.short(SHORT_ID_LEN), row.text);
    if let Some(label) = row.timer_label() {
        line.push_str(&format!("  ⏱ {label}"));
    }
    line
}
