//! Configuration merging logic
//!
//! Priority: CLI args > dsconf.toml > defaults

use crate::output::OutputMode;
use crate::rewrite::WriteMode;

use super::toml_schema::DsconfToml;

/// CLI options that can override config file settings.
///
/// `None` means the flag was not given.
#[derive(Debug, Default)]
pub struct CliOptions {
    /// If Some(true), overwrite files in place instead of renaming a temp file
    pub in_place: Option<bool>,
    pub diff: Option<bool>,
    pub quiet: Option<bool>,
}

/// Effective settings for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub write_mode: WriteMode,
    pub output_mode: OutputMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            write_mode: WriteMode::Atomic,
            output_mode: OutputMode::Normal,
        }
    }
}

/// Merge settings from CLI, TOML, and defaults.
pub fn merge_settings(cli: &CliOptions, toml: Option<&DsconfToml>) -> Settings {
    let defaults = Settings::default();

    let atomic = cli
        .in_place
        .map(|in_place| !in_place)
        .or_else(|| toml.and_then(|t| t.write.atomic));
    let write_mode = match atomic {
        Some(true) => WriteMode::Atomic,
        Some(false) => WriteMode::InPlace,
        None => defaults.write_mode,
    };

    let quiet = cli
        .quiet
        .or_else(|| toml.and_then(|t| t.output.quiet))
        .unwrap_or(false);
    let diff = cli
        .diff
        .or_else(|| toml.and_then(|t| t.output.diff))
        .unwrap_or(false);

    // Quiet wins over diff, as on the command line.
    let output_mode = if quiet {
        OutputMode::Quiet
    } else if diff {
        OutputMode::Diff
    } else {
        defaults.output_mode
    };

    Settings {
        write_mode,
        output_mode,
    }
}
