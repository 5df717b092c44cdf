use std::fmt;
use std::io::{BufWriter, Write};
use std::str::FromStr;

use anyhow::Context as _;
use chrono::TimeZone;
use serde::Deserialize;

use crate::history::HistoryEntry;

const WRITE_BUFFER_SIZE: usize = 8192;

/// How `get` renders entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line.
    Json,
    /// Command text only.
    #[default]
    Simple,
    /// Local time, directory, non-zero exit code and command.
    Verbose,
}

impl OutputFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Simple => "simple",
            Self::Verbose => "verbose",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a format name that is not `json`, `simple` or `verbose`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormatError {
    value: String,
}

impl fmt::Display for UnknownFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown output format: {} (expected json, simple or verbose)",
            self.value
        )
    }
}

impl std::error::Error for UnknownFormatError {}

impl FromStr for OutputFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "simple" => Ok(Self::Simple),
            "verbose" => Ok(Self::Verbose),
            other => Err(UnknownFormatError {
                value: other.to_owned(),
            }),
        }
    }
}

/// Render `entries` to `writer` in `format`, converting timestamps to `tz`
/// for verbose output. Output is buffered and flushed before returning.
///
/// # Errors
/// Returns an error if encoding, writing or the final flush fails.
pub fn write_entries<W, Tz>(
    entries: &[HistoryEntry],
    writer: W,
    format: OutputFormat,
    tz: &Tz,
) -> anyhow::Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut out = BufWriter::with_capacity(WRITE_BUFFER_SIZE, writer);
    for entry in entries {
        match format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut out, entry).context("encode JSON entry")?;
                out.write_all(b"\n").context("write entry")?;
            }
            OutputFormat::Simple => {
                writeln!(out, "{}", entry.command).context("write entry")?;
            }
            OutputFormat::Verbose => {
                writeln!(out, "{}", verbose_line(entry, tz)).context("write entry")?;
            }
        }
    }
    out.flush().context("flush output")?;
    Ok(())
}

/// Like [`write_entries`], but takes the format by name.
///
/// # Errors
/// Returns an error for an unknown format name, or if rendering fails.
pub fn write_entries_as<W, Tz>(
    entries: &[HistoryEntry],
    writer: W,
    format: &str,
    tz: &Tz,
) -> anyhow::Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let format: OutputFormat = format.parse()?;
    write_entries(entries, writer, format, tz)
}

/// `<local time> [<directory>][ [exit]] <command>`
fn verbose_line<Tz>(entry: &HistoryEntry, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let local = entry.timestamp.with_timezone(tz);
    let exit_status = if entry.exit_code == 0 {
        String::new()
    } else {
        format!(" [{}]", entry.exit_code)
    };
    // A brace-wrapped command reads like the bracketed fields around it.
    let command = if entry.command.starts_with('{') && entry.command.ends_with('}') {
        format!("{:?}", entry.command)
    } else {
        entry.command.clone()
    };
    format!(
        "{} [{}]{exit_status} {command}",
        local.format("%Y-%m-%dT%H:%M:%S"),
        entry.directory
    )
}
