//! dsconf.toml discovery and loading

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::toml_schema::DsconfToml;

/// Name of the configuration file searched for.
pub const CONFIG_FILE_NAME: &str = "dsconf.toml";

/// Error type for configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading the file
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// TOML parsing error
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Search upward from `start_dir` for a file called `filename`.
///
/// With `stop_at_git_root`, the search ends at the first directory holding
/// `.git`.
pub fn find_file_upward(
    start_dir: &Path,
    filename: &str,
    stop_at_git_root: bool,
) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .take_while({
            let mut passed_root = false;
            move |dir| {
                let keep = !passed_root;
                passed_root = stop_at_git_root && dir.join(".git").exists();
                keep
            }
        })
        .map(|dir| dir.join(filename))
        .find(|candidate| candidate.is_file())
}

/// Find dsconf.toml by searching upward from `start_dir`, stopping at the
/// git repository root.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    find_file_upward(start_dir, CONFIG_FILE_NAME, true)
}

/// Load and parse dsconf.toml from `path`.
pub fn load_config(path: &Path) -> Result<DsconfToml, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
