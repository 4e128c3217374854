//! Configuration file support for dsconf.
//!
//! This module provides:
//! - Loading configuration from `dsconf.toml`
//! - Config file discovery (search upward from current directory)
//! - Merging CLI args, config file, and defaults
//! - Template generation with `--init`

mod file;
mod init;
mod merge;
mod toml_schema;

pub use file::{find_config_file, find_file_upward, load_config, ConfigError, CONFIG_FILE_NAME};
pub use init::{generate_init_file, generate_init_file_in, DSCONF_TOML_TEMPLATE};
pub use merge::{merge_settings, CliOptions, Settings};
pub use toml_schema::{DsconfToml, OutputSection, WriteSection};
