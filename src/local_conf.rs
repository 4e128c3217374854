//! In-place editing of composite `local.conf` files
//!
//! A local.conf is split into meta sections by `[[group|conf]]` headers.
//! Most meta sections hold ordinary INI content destined for another config
//! file; `[[local|localrc]]` instead holds raw shell-style lines that are
//! never parsed.
//!
//! ```text
//! [[local|localrc]]
//! ADMIN_PASSWORD=secret
//! enable_plugin foo https://example.org/foo
//! [[post-config|$NOVA_CONF]]
//! [upgrade_levels]
//! compute = auto
//! ```

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::str::SplitInclusive;

use tracing::debug;

use crate::error::{EditError, Result};
use crate::ini::{key_line, IniFile};
use crate::rewrite::{self, Edit, Plan, WriteMode};
use crate::scanner::{KeyMatcher, Line};

/// Group of the raw-line meta section.
pub const LOCAL_GROUP: &str = "local";
/// Conf of the raw-line meta section.
pub const LOCAL_CONF: &str = "localrc";

/// A composite local.conf file on disk.
#[derive(Debug, Clone)]
pub struct LocalConf {
    path: PathBuf,
    mode: WriteMode,
}

/// One `name = value` line found inside a meta section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    pub section: &'a str,
    pub name: &'a str,
    pub value: &'a str,
}

impl LocalConf {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: WriteMode::default(),
        }
    }

    /// Use `mode` for every write made through this handle, including writes
    /// to extraction targets.
    #[must_use]
    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All `(group, conf)` meta headers in file order, duplicates included.
    pub fn groups(&self) -> Result<Vec<(String, String)>> {
        let text = rewrite::read(&self.path)?;
        Ok(groups(&text)
            .into_iter()
            .map(|(group, conf)| (group.to_string(), conf.to_string()))
            .collect())
    }

    /// Lines of every `[[group|conf]]` run, headers excluded.
    ///
    /// Reads the file and collects eagerly. Use the free [`section_lines`]
    /// for a lazy iterator over text already in memory.
    pub fn section_lines(&self, group: &str, conf: &str) -> Result<Vec<String>> {
        let text = rewrite::read(&self.path)?;
        Ok(section_lines(&text, group, conf).map(str::to_string).collect())
    }

    /// `(section, name, value)` for every key inside `[[group|conf]]`.
    ///
    /// Reads the file and collects eagerly. Use the free [`parsed_entries`]
    /// for a lazy iterator over text already in memory.
    pub fn parsed_entries(&self, group: &str, conf: &str) -> Result<Vec<(String, String, String)>> {
        let text = rewrite::read(&self.path)?;
        Ok(parsed_entries(&text, group, conf)
            .map(|e| (e.section.to_string(), e.name.to_string(), e.value.to_string()))
            .collect())
    }

    /// Copy every key of `[[group|conf]]` into the INI file at `target`.
    ///
    /// Keys are applied in file order, so a key repeated later wins.
    pub fn extract(&self, group: &str, conf: &str, target: impl AsRef<Path>) -> Result<()> {
        let text = rewrite::read(&self.path)?;
        let ini = IniFile::new(target.as_ref()).with_write_mode(self.mode);

        for entry in parsed_entries(&text, group, conf) {
            ini.set(entry.section, entry.name, entry.value)?;
        }
        Ok(())
    }

    /// Append the raw lines of `[[local|localrc]]` to `target`, creating it if
    /// needed.
    pub fn extract_localrc(&self, target: impl AsRef<Path>) -> Result<()> {
        let target = target.as_ref();
        let text = rewrite::read(&self.path)?;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(target)
            .map_err(|e| EditError::write(target, e))?;

        for line in section_lines(&text, LOCAL_GROUP, LOCAL_CONF) {
            file.write_all(line.as_bytes())
                .map_err(|e| EditError::write(target, e))?;
        }
        Ok(())
    }

    /// Add raw `line` to the end of `[[local|localrc]]`.
    ///
    /// `line` may hold several newline-separated lines. Without a local
    /// block, one is created ahead of the first meta section so localrc
    /// settings stay at the top of the file.
    pub fn set_local(&self, line: &str) -> Result<()> {
        let text = rewrite::read_or_empty(&self.path)?;
        let plan = plan_set_local(&text, line);
        rewrite::apply(&self.path, &text, &plan, self.mode)
    }

    /// Set `name = value` in `[section]` of `[[group|conf]]`, creating the
    /// meta section, the section and the file as needed.
    pub fn set(&self, group: &str, conf: &str, section: &str, name: &str, value: &str) -> Result<()> {
        let text = rewrite::read_or_empty(&self.path)?;
        let plan = plan_set(&text, &Target { group, conf, section, name }, value);
        rewrite::apply(&self.path, &text, &plan, self.mode)
    }

    /// Merge every meta section of the local.conf at `source` into this one.
    ///
    /// Keys are set with [`LocalConf::set`], so merging the same source twice
    /// changes nothing the second time. Raw local lines carry no key and are
    /// appended on every merge.
    pub fn merge_lc(&self, source: impl AsRef<Path>) -> Result<()> {
        let source = source.as_ref();
        let text = rewrite::read(source)?;

        for (group, conf) in groups(&text) {
            debug!(group, conf, source = %source.display(), "merging meta section");
            if group == LOCAL_GROUP {
                for line in section_lines(&text, group, conf) {
                    self.set_local(line)?;
                }
            } else {
                for entry in parsed_entries(&text, group, conf) {
                    self.set(group, conf, entry.section, entry.name, entry.value)?;
                }
            }
        }
        Ok(())
    }
}

/// All meta headers in `text`, in order.
pub fn groups(text: &str) -> Vec<(&str, &str)> {
    text.split_inclusive('\n')
        .filter_map(|line| match Line::classify(line) {
            Line::MetaHeader { group, conf } => Some((group, conf)),
            _ => None,
        })
        .collect()
}

/// Lazily yield the lines between each `[[group|conf]]` header and the next
/// meta header.
pub fn section_lines<'a>(text: &'a str, group: &'a str, conf: &'a str) -> SectionLines<'a> {
    SectionLines {
        lines: text.split_inclusive('\n'),
        group,
        conf,
        inside: false,
    }
}

/// Lazily yield the keys of `[[group|conf]]` with the section they sit in.
///
/// Keys above the first `[section]` header get the section `""`.
pub fn parsed_entries<'a>(text: &'a str, group: &'a str, conf: &'a str) -> Entries<'a> {
    Entries {
        lines: section_lines(text, group, conf),
        section: "",
    }
}

/// Iterator returned by [`section_lines`].
#[derive(Debug, Clone)]
pub struct SectionLines<'a> {
    lines: SplitInclusive<'a, char>,
    group: &'a str,
    conf: &'a str,
    inside: bool,
}

impl<'a> Iterator for SectionLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        for line in self.lines.by_ref() {
            let kind = Line::classify(line);
            if kind.is_meta(self.group, self.conf) {
                self.inside = true;
            } else if kind.is_meta_header() {
                self.inside = false;
            } else if self.inside {
                return Some(line);
            }
        }
        None
    }
}

/// Iterator returned by [`parsed_entries`].
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    lines: SectionLines<'a>,
    section: &'a str,
}

impl<'a> Iterator for Entries<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Entry<'a>> {
        for line in self.lines.by_ref() {
            match Line::classify(line) {
                Line::Section(name) => self.section = name,
                Line::Key { name, value } => {
                    return Some(Entry {
                        section: self.section,
                        name,
                        value,
                    })
                }
                _ => {}
            }
        }
        None
    }
}

/// Raw local lines, each trimmed and newline-terminated.
fn local_lines(raw: &str) -> String {
    raw.trim_end()
        .split('\n')
        .map(|line| format!("{}\n", line.trim_end()))
        .collect()
}

fn meta_header(group: &str, conf: &str) -> String {
    format!("[[{group}|{conf}]]\n")
}

/// Where a raw local line goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalScan {
    /// No local block yet. Remembers the first meta header seen.
    Searching { first_meta: Option<usize> },
    /// Inside the local block.
    InLocal,
    /// The local block ends at this meta header.
    Done { end: usize },
}

fn plan_set_local(text: &str, raw: &str) -> Plan {
    let mut state = LocalScan::Searching { first_meta: None };

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let kind = Line::classify(line);
        if !kind.is_meta_header() {
            continue;
        }
        state = match state {
            LocalScan::Searching { first_meta } => {
                if kind.is_meta(LOCAL_GROUP, LOCAL_CONF) {
                    LocalScan::InLocal
                } else {
                    LocalScan::Searching {
                        first_meta: first_meta.or(Some(index)),
                    }
                }
            }
            LocalScan::InLocal => LocalScan::Done { end: index },
            done @ LocalScan::Done { .. } => done,
        };
        if matches!(state, LocalScan::Done { .. }) {
            break;
        }
    }

    let lines = local_lines(raw);
    let mut plan = Plan::new();
    match state {
        LocalScan::Done { end } => {
            debug!(line = end + 1, "appending to end of local block");
            plan.edit(end, Edit::InsertBefore(lines));
        }
        LocalScan::InLocal => {
            debug!("local block is last, appending at end of file");
            plan.append(&lines);
        }
        LocalScan::Searching {
            first_meta: Some(first),
        } => {
            debug!(line = first + 1, "no local block, creating one before first meta section");
            let block = meta_header(LOCAL_GROUP, LOCAL_CONF) + &lines;
            plan.edit(first, Edit::InsertBefore(block));
        }
        LocalScan::Searching { first_meta: None } => {
            debug!("no meta sections, creating local block at end of file");
            plan.append(&meta_header(LOCAL_GROUP, LOCAL_CONF));
            plan.append(&lines);
        }
    }
    plan
}

/// The key a composite `set` is looking for.
#[derive(Debug, Clone, Copy)]
struct Target<'a> {
    group: &'a str,
    conf: &'a str,
    section: &'a str,
    name: &'a str,
}

/// Progress of a composite `set` through the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetScan {
    /// Before the first `[[group|conf]]`.
    Outside,
    /// Inside the meta section, `[section]` not seen yet.
    InMeta,
    /// Inside the first `[section]` of the meta section. The unnamed
    /// section `""` is anchored on the meta header itself.
    InSection { header: usize },
    /// An edit has been planned.
    Done,
}

fn plan_set(text: &str, target: &Target<'_>, value: &str) -> Plan {
    let key = key_line(target.name, value);
    let matcher = KeyMatcher::plain(target.name);
    let mut plan = Plan::new();
    let mut state = SetScan::Outside;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let kind = Line::classify(line);
        state = match state {
            SetScan::Outside if kind.is_meta(target.group, target.conf) => {
                if target.section.is_empty() {
                    SetScan::InSection { header: index }
                } else {
                    SetScan::InMeta
                }
            }
            SetScan::Outside => SetScan::Outside,
            SetScan::InMeta if kind.is_meta_header() => {
                debug!(line = index + 1, section = target.section, "adding section at end of meta section");
                let block = format!("[{}]\n{key}", target.section);
                plan.edit(index, Edit::InsertBefore(block));
                SetScan::Done
            }
            SetScan::InMeta if kind == Line::Section(target.section) => {
                SetScan::InSection { header: index }
            }
            SetScan::InMeta => SetScan::InMeta,
            SetScan::InSection { header }
                if kind.is_meta_header() || matches!(kind, Line::Section(_)) =>
            {
                debug!(line = header + 1, name = target.name, "adding key below section header");
                plan.edit(header, Edit::InsertAfter(key.clone()));
                SetScan::Done
            }
            SetScan::InSection { .. } if matcher.is_match(line) => {
                debug!(line = index + 1, name = target.name, "replacing existing key");
                plan.edit(index, Edit::Replace(key.clone()));
                SetScan::Done
            }
            in_section @ SetScan::InSection { .. } => in_section,
            SetScan::Done => SetScan::Done,
        };
        if state == SetScan::Done {
            return plan;
        }
    }

    match state {
        SetScan::Outside => {
            debug!(group = target.group, conf = target.conf, "meta section not found, appending");
            plan.append(&meta_header(target.group, target.conf));
            if !target.section.is_empty() {
                plan.append(&format!("[{}]\n", target.section));
            }
            plan.append(&key);
        }
        SetScan::InMeta => {
            debug!(section = target.section, "adding section at end of file");
            plan.append(&format!("[{}]\n", target.section));
            plan.append(&key);
        }
        SetScan::InSection { header } => {
            debug!(line = header + 1, name = target.name, "adding key below section header");
            plan.edit(header, Edit::InsertAfter(key));
        }
        SetScan::Done => {}
    }
    plan
}
