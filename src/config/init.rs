//! Template generation for `--init` command

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::file::CONFIG_FILE_NAME;

/// Template dsconf.toml with documentation
pub const DSCONF_TOML_TEMPLATE: &str = r#"# dsconf.toml - Configuration for dsconf
#
# dsconf edits INI files and local.conf files one key at a time,
# keeping comments, blank lines and ordering intact.
#
# dsconf looks for this file in the current directory and its parents,
# up to the root of the git repository. Command-line flags override it.

[write]
# Write edits to a temporary file and rename it over the original, so a
# failed write never leaves a half-written file behind.
# Set to false to overwrite files in place (same as --in-place).
# Default: true
# atomic = true

[output]
# Print a unified diff of every change (same as --diff).
# Default: false
# diff = false

# Print only the names of modified files (same as --quiet).
# Default: false
# quiet = false
"#;

/// Generate dsconf.toml in `dir` (or the current directory if None).
///
/// Returns an error if the file already exists.
pub fn generate_init_file_in(dir: Option<&Path>) -> io::Result<PathBuf> {
    let path = dir.map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), |d| d.join(CONFIG_FILE_NAME));

    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{CONFIG_FILE_NAME} already exists"),
        ));
    }

    fs::write(&path, DSCONF_TOML_TEMPLATE)?;
    Ok(path)
}

/// Generate dsconf.toml in the current directory.
pub fn generate_init_file() -> io::Result<PathBuf> {
    generate_init_file_in(None)
}
