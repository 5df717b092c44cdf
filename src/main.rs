mod history_cmd;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use histree::config::Config;
use histree::format::OutputFormat;
use histree::history;

#[derive(Parser)]
#[command(
    name = "histree",
    version,
    about = "Directory-aware shell history backed by SQLite"
)]
struct Cli {
    /// Path to the SQLite history database
    #[arg(long, global = true, env = "HISTREE_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record one command; the command text is read from stdin
    Add {
        /// Directory the command ran in (default: current directory)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Hostname to record (default: this machine's hostname)
        #[arg(long)]
        hostname: Option<String>,
        /// Shell process ID to record (default: parent process ID)
        #[arg(long)]
        pid: Option<i64>,
        /// Exit code of the command
        #[arg(long = "exit", default_value_t = 0, allow_negative_numbers = true)]
        exit_code: i32,
    },
    /// Print the most recent commands run in a directory tree, oldest first
    Get {
        /// Number of entries to show (default: 100, or `[get] limit` from config)
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,
        /// Only show commands run in this directory or below (default: all)
        #[arg(long, default_value = "")]
        dir: String,
        /// Output format: json, simple or verbose
        #[arg(long)]
        format: Option<OutputFormat>,
        /// Same as `--format verbose`
        #[arg(short, long)]
        verbose: bool,
    },
    /// Rewrite recorded directories after a directory was moved or renamed
    UpdatePath {
        /// Directory as recorded so far
        #[arg(long)]
        old_path: PathBuf,
        /// Directory it was moved to
        #[arg(long)]
        new_path: PathBuf,
    },
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("HISTREE_LOG").unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_history_conn(
    config: &Config,
    db_flag: Option<&Path>,
) -> anyhow::Result<rusqlite::Connection> {
    let path = config
        .db_path(db_flag)
        .ok_or_else(|| anyhow::anyhow!("cannot determine history DB path; pass --db"))?;
    history::open_db(&path)
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let config = Config::load()?;
    let conn = open_history_conn(&config, cli.db.as_deref())?;
    match &cli.command {
        Commands::Add {
            dir,
            hostname,
            pid,
            exit_code,
        } => history_cmd::cmd_add(
            &conn,
            &history_cmd::AddArgs {
                dir: dir.as_deref(),
                hostname: hostname.as_deref(),
                pid: *pid,
                exit_code: *exit_code,
            },
        ),
        Commands::Get {
            limit,
            dir,
            format,
            verbose,
        } => {
            let format = if *verbose {
                OutputFormat::Verbose
            } else {
                format.unwrap_or_else(|| config.default_format())
            };
            let limit = limit.unwrap_or_else(|| config.default_limit());
            history_cmd::cmd_get(&conn, limit, dir, format)
        }
        Commands::UpdatePath { old_path, new_path } => {
            history_cmd::cmd_update_path(&conn, old_path, new_path)
        }
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let exit_code = run(&cli).unwrap_or_else(|e| {
        eprintln!("[histree] error: {e:#}");
        1
    });
    std::process::exit(exit_code);
}
