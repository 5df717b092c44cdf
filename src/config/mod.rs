use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::format::OutputFormat;
use crate::paths;

/// Number of entries `get` returns when neither the flag nor the config file
/// sets one.
pub const DEFAULT_LIMIT: i64 = 100;

/// Parsed `config.toml`. Every key is optional; a missing file is the same as
/// an empty one.
///
/// ```toml
/// db_path = "/path/to/histree.db"
///
/// [get]
/// limit = 100
/// format = "verbose"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub get: GetSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetSection {
    pub limit: Option<i64>,
    pub format: Option<OutputFormat>,
}

/// Location of the user config file: `{user_dir}/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    paths::user_dir().map(|d| d.join("config.toml"))
}

/// Try to load a config from `path`. Returns `Ok(None)` if the file does not
/// exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or contains invalid TOML.
pub fn try_load(path: &Path) -> anyhow::Result<Option<Config>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("failed to read config file: {}", path.display())));
        }
    };
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(Some(config))
}

impl Config {
    /// Load the user config file, falling back to defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but is unreadable or malformed.
    pub fn load() -> anyhow::Result<Self> {
        match config_path() {
            Some(path) => Ok(try_load(&path)?.unwrap_or_default()),
            None => Ok(Self::default()),
        }
    }

    /// Resolve the database path. Priority: explicit `flag` (which also covers
    /// `HISTREE_DB` through clap) → `db_path` from the config file →
    /// [`paths::default_db_path`].
    pub fn db_path(&self, flag: Option<&Path>) -> Option<PathBuf> {
        flag.map(Path::to_path_buf)
            .or_else(|| self.db_path.clone())
            .or_else(paths::default_db_path)
    }

    /// Entry limit for `get` when no `--limit` flag was given.
    pub fn default_limit(&self) -> i64 {
        self.get.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Output format for `get` when no `--format` flag was given.
    pub fn default_format(&self) -> OutputFormat {
        self.get.format.unwrap_or_default()
    }
}
