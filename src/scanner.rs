//! Line classification for INI and local.conf files
//!
//! Every edit in this crate is driven by looking at one line at a time and
//! deciding what kind of line it is. Nothing here keeps state.

use std::sync::LazyLock;

use regex::Regex;

/// `[[group|conf]]`
static META_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\[([^|\]]*)\|(.*?)\]\]").expect("meta header pattern is valid")
});

/// `[section]`
static SECTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\[\]]+)\]").expect("section header pattern is valid"));

/// `name = value`
static KEY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*=\s*(.+)").expect("key line pattern is valid"));

/// What a single line of a config file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    MetaHeader { group: &'a str, conf: &'a str },
    Section(&'a str),
    Key { name: &'a str, value: &'a str },
    Other,
}

impl<'a> Line<'a> {
    /// Classify `line`. A trailing `\n` is ignored.
    pub fn classify(line: &'a str) -> Self {
        let line = strip_newline(line);

        if let Some(caps) = META_HEADER.captures(line) {
            if let (Some(group), Some(conf)) = (caps.get(1), caps.get(2)) {
                return Line::MetaHeader {
                    group: group.as_str(),
                    conf: conf.as_str(),
                };
            }
        }

        if let Some(name) = SECTION_HEADER.captures(line).and_then(|c| c.get(1)) {
            return Line::Section(name.as_str());
        }

        if let Some(caps) = KEY_LINE.captures(line) {
            if let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) {
                return Line::Key {
                    name: name.as_str(),
                    value: value.as_str(),
                };
            }
        }

        Line::Other
    }

    pub fn is_meta_header(&self) -> bool {
        matches!(self, Line::MetaHeader { .. })
    }

    /// True if this is the meta header for exactly `(group, conf)`.
    pub fn is_meta(&self, want_group: &str, want_conf: &str) -> bool {
        matches!(self, Line::MetaHeader { group, conf } if *group == want_group && *conf == want_conf)
    }
}

/// How a named key is recognised on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPattern {
    /// `name\s*=` at the start of the line.
    Plain,
    /// `#\s*name\s*=` at the start of the line.
    Commented,
}

/// Matches lines that assign to one specific key name.
///
/// The name is compared literally, so names containing regex
/// metacharacters (`$`, `.`) need no escaping.
#[derive(Debug, Clone, Copy)]
pub struct KeyMatcher<'a> {
    name: &'a str,
    pattern: KeyPattern,
}

impl<'a> KeyMatcher<'a> {
    pub fn new(name: &'a str, pattern: KeyPattern) -> Self {
        Self { name, pattern }
    }

    pub fn plain(name: &'a str) -> Self {
        Self::new(name, KeyPattern::Plain)
    }

    pub fn is_match(&self, line: &str) -> bool {
        let rest = match self.pattern {
            KeyPattern::Plain => Some(line),
            KeyPattern::Commented => line.strip_prefix('#').map(str::trim_start),
        };

        rest.and_then(|rest| rest.strip_prefix(self.name))
            .is_some_and(|after| after.trim_start().starts_with('='))
    }
}

/// Split `text` into lines, each keeping its `\n` terminator.
///
/// The last line has no terminator if the text does not end with one.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive('\n')
}

pub(crate) fn strip_newline(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

/// The line terminator carried by `line` (`"\n"` or `""`).
pub(crate) fn terminator(line: &str) -> &'static str {
    if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}
