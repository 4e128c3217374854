//! In-place editing of flat INI files
//!
//! [`IniFile`] changes one key at a time and leaves every other line,
//! comments and blank lines included, exactly where it was. A full
//! parse-and-serialize round trip would lose those.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::rewrite::{self, Edit, Plan, WriteMode};
use crate::scanner::{self, KeyMatcher, KeyPattern, Line};

/// A flat INI file on disk, edited one key at a time.
#[derive(Debug, Clone)]
pub struct IniFile {
    path: PathBuf,
    mode: WriteMode,
}

impl IniFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: WriteMode::default(),
        }
    }

    /// Use `mode` for every write made through this handle.
    #[must_use]
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if `section` has a key called `name`.
    ///
    /// A missing file has no keys.
    pub fn has(&self, section: &str, name: &str) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let text = rewrite::read(&self.path)?;
        Ok(!matching_lines(&text, section, KeyMatcher::plain(name)).is_empty())
    }

    /// Add `name = value` to `section`.
    ///
    /// The key goes directly below the first `[section]` header, ahead of any
    /// keys already there. If the section does not exist it is appended to
    /// the end of the file. A missing file is created.
    ///
    /// The section `""` names the lines above the first header.
    pub fn add(&self, section: &str, name: &str, value: &str) -> Result<()> {
        let text = rewrite::read_or_empty(&self.path)?;
        let plan = plan_add(&text, section, name, value);
        rewrite::apply(&self.path, &text, &plan, self.mode)
    }

    /// Set `name` in `section` to `value`, replacing the existing line or
    /// adding a new one.
    pub fn set(&self, section: &str, name: &str, value: &str) -> Result<()> {
        if self.has(section, name)? {
            let line = key_line(name, value);
            self.at_existing_key(section, name, KeyPattern::Plain, Edit::Replace(line))
        } else {
            self.add(section, name, value)
        }
    }

    /// Delete every `name` line in `section`. The file must exist.
    pub fn remove(&self, section: &str, name: &str) -> Result<()> {
        self.at_existing_key(section, name, KeyPattern::Plain, Edit::Drop)
    }

    /// Comment out every `name` line in `section`. The file must exist.
    pub fn comment(&self, section: &str, name: &str) -> Result<()> {
        self.at_existing_key(section, name, KeyPattern::Plain, Edit::Comment)
    }

    /// Uncomment every `# name = ...` line in `section`. The file must exist.
    pub fn uncomment(&self, section: &str, name: &str) -> Result<()> {
        self.at_existing_key(section, name, KeyPattern::Commented, Edit::Uncomment)
    }

    fn at_existing_key(
        &self,
        section: &str,
        name: &str,
        pattern: KeyPattern,
        edit: Edit,
    ) -> Result<()> {
        // Missing files are an error here, not an empty input.
        let text = rewrite::read(&self.path)?;

        let mut plan = Plan::new();
        for index in matching_lines(&text, section, KeyMatcher::new(name, pattern)) {
            plan.edit(index, edit.clone());
        }

        if plan.is_empty() {
            debug!(section, name, path = %self.path.display(), "key not found");
        }
        rewrite::apply(&self.path, &text, &plan, self.mode)
    }
}

/// Canonical `name = value` line.
pub(crate) fn key_line(name: &str, value: &str) -> String {
    format!("{name} = {value}\n")
}

/// Indexes of lines inside `section` that match `matcher`.
///
/// Lines above the first section header belong to the section `""`.
fn matching_lines(text: &str, section: &str, matcher: KeyMatcher<'_>) -> Vec<usize> {
    let mut current = "";
    let mut found = Vec::new();

    for (index, line) in scanner::lines(text).enumerate() {
        if let Line::Section(name) = Line::classify(line) {
            current = name;
            continue;
        }
        if current == section && matcher.is_match(line) {
            found.push(index);
        }
    }

    found
}

fn plan_add(text: &str, section: &str, name: &str, value: &str) -> Plan {
    let mut plan = Plan::new();

    // The unnamed section has no header; its keys sit at the top of the file.
    if section.is_empty() {
        debug!(name, "adding key above the first section");
        if text.is_empty() {
            plan.append(&key_line(name, value));
        } else {
            plan.edit(0, Edit::InsertBefore(key_line(name, value)));
        }
        return plan;
    }

    let header = scanner::lines(text)
        .position(|line| Line::classify(line) == Line::Section(section));

    match header {
        Some(index) => {
            debug!(section, name, line = index + 1, "adding key below section header");
            plan.edit(index, Edit::InsertAfter(key_line(name, value)));
        }
        None => {
            debug!(section, name, "section not found, appending");
            plan.append(&format!("[{section}]\n"));
            plan.append(&key_line(name, value));
        }
    }

    plan
}
