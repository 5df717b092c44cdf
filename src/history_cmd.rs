use std::io::Read as _;
use std::path::Path;

use anyhow::Context as _;
use rusqlite::Connection;

use histree::format::{self, OutputFormat};
use histree::history::{self, NewEntry};
use histree::paths;

/// Values for one `add` invocation after defaults have been applied.
pub struct AddArgs<'a> {
    pub dir: Option<&'a Path>,
    pub hostname: Option<&'a str>,
    pub pid: Option<i64>,
    pub exit_code: i32,
}

/// Read the command text from stdin and record it.
pub fn cmd_add(conn: &Connection, args: &AddArgs<'_>) -> anyhow::Result<i32> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("read command from stdin")?;
    let command = input.trim_end_matches('\n').to_owned();

    let directory = match args.dir {
        Some(dir) => paths::absolutize(dir)?,
        None => std::env::current_dir().context("determine current directory")?,
    };
    let hostname = args.hostname.map_or_else(
        || gethostname::gethostname().to_string_lossy().into_owned(),
        ToOwned::to_owned,
    );

    let entry = NewEntry {
        command,
        directory: directory.to_string_lossy().into_owned(),
        timestamp: Some(chrono::Utc::now()),
        exit_code: args.exit_code,
        hostname,
        process_id: args.pid.unwrap_or_else(shell_pid),
    };
    history::add_entry(conn, &entry)?;
    Ok(0)
}

/// Print the last `limit` entries for `dir` (all entries when `dir` is empty).
pub fn cmd_get(
    conn: &Connection,
    limit: i64,
    dir: &str,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let dir = if dir.is_empty() {
        String::new()
    } else {
        paths::absolutize(Path::new(dir))?
            .to_string_lossy()
            .into_owned()
    };
    let entries = history::get_entries(conn, limit, &dir)?;
    format::write_entries(
        &entries,
        std::io::stdout().lock(),
        format,
        &chrono::Local,
    )?;
    Ok(0)
}

/// Move every entry recorded under `old_path` to `new_path`.
pub fn cmd_update_path(
    conn: &Connection,
    old_path: &Path,
    new_path: &Path,
) -> anyhow::Result<i32> {
    let old_path = paths::absolutize(old_path).context("resolve old path")?;
    let new_path = paths::absolutize(new_path).context("resolve new path")?;
    let count = history::update_paths(
        conn,
        &old_path.to_string_lossy(),
        &new_path.to_string_lossy(),
    )?;
    println!(
        "Updated {count} entries: {} -> {}",
        old_path.display(),
        new_path.display()
    );
    Ok(0)
}

/// PID of the shell that invoked us, used when `--pid` is not given.
fn shell_pid() -> i64 {
    #[cfg(unix)]
    {
        i64::from(std::os::unix::process::parent_id())
    }
    #[cfg(not(unix))]
    {
        i64::from(std::process::id())
    }
}
