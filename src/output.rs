//! Reporting what an edit did to a file

use std::env;
use std::io::{self, IsTerminal};
use std::path::Path;

use similar::{ChangeTag, TextDiff};

const RESET: &str = "\x1b[0m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Normal,
    Quiet,
    Diff,
}

#[derive(Debug, Clone, Copy)]
pub struct OutputContext {
    pub mode: OutputMode,
    pub use_colors: bool,
    pub verbose: bool,
}

impl OutputContext {
    pub fn new(mode: OutputMode, use_colors: bool, verbose: bool) -> Self {
        Self {
            mode,
            use_colors,
            verbose,
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// The content of a file before and after one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub before: String,
    pub after: String,
    /// The operation created the file.
    pub created: bool,
}

impl FileChange {
    pub fn is_modified(&self) -> bool {
        self.created || self.before != self.after
    }
}

pub fn print_change(path: &Path, change: &FileChange, ctx: &OutputContext) {
    if !change.is_modified() {
        if ctx.verbose && ctx.mode != OutputMode::Quiet {
            println!("{} {}", ctx.paint(CYAN, "Unchanged:"), path.display());
        }
        return;
    }

    match ctx.mode {
        OutputMode::Quiet => println!("{}", path.display()),
        OutputMode::Diff => print_diff(&path.display().to_string(), change, ctx),
        OutputMode::Normal => {
            let label = if change.created { "Created:" } else { "Updated:" };
            println!("{} {}", ctx.paint(GREEN, label), path.display());
        }
    }
}

pub fn print_diff(label: &str, change: &FileChange, ctx: &OutputContext) {
    print!("{}", render_diff(label, change, ctx));
}

fn render_diff(label: &str, change: &FileChange, ctx: &OutputContext) -> String {
    let diff = TextDiff::from_lines(change.before.as_str(), change.after.as_str());
    let old_label = if change.created { "/dev/null" } else { label };
    let mut out = format!("--- {old_label}\n+++ {label}\n");

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let line = match change.tag() {
                    ChangeTag::Delete => ctx.paint(RED, &format!("-{change}")),
                    ChangeTag::Insert => ctx.paint(GREEN, &format!("+{change}")),
                    ChangeTag::Equal => format!(" {change}"),
                };
                out.push_str(&line);
                if change.missing_newline() {
                    out.push('\n');
                }
            }
        }
    }
    out
}

pub fn print_error(message: &str, use_colors: bool) {
    let label = if use_colors {
        format!("{RED}Error:{RESET}")
    } else {
        "Error:".to_string()
    };
    eprintln!("{label} {message}");
}

/// Priority: --no-color > --color > NO_COLOR env > TTY detection
pub fn should_use_colors(force_color: bool, no_color: bool) -> bool {
    if no_color {
        return false;
    }
    if force_color {
        return true;
    }
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    io::stdout().is_terminal()
}
