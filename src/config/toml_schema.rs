//! TOML schema definitions for dsconf.toml

use serde::{Deserialize, Serialize};

/// Root structure for dsconf.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DsconfToml {
    /// How edited files are written back
    #[serde(default)]
    pub write: WriteSection,

    /// What is printed after an edit
    #[serde(default)]
    pub output: OutputSection,
}

/// `[write]` section in dsconf.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteSection {
    /// Replace files through a renamed temporary file (default: true)
    pub atomic: Option<bool>,
}

/// `[output]` section in dsconf.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Print a unified diff of every change (default: false)
    pub diff: Option<bool>,

    /// Print only the names of modified files (default: false)
    pub quiet: Option<bool>,
}
