//! Snapshot, edit plan and write-back shared by every mutating operation
//!
//! A rewrite happens in three steps:
//!
//! 1. [`read`] takes a snapshot of the file's current text.
//! 2. An editor scans the snapshot and builds a [`Plan`]: a small list of
//!    tagged [`Edit`]s keyed by line index, plus optional text to append.
//! 3. [`Plan::render`] copies every line through, applying edits at their
//!    anchors, and [`write`] puts the result back on disk.
//!
//! Lines without an edit are copied byte for byte.

use std::fs;
use std::io::{self, Write as _};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{EditError, Result};
use crate::scanner::{self, strip_newline, terminator};

/// How rewritten content is put back on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Write a temporary file next to the target and rename it over the
    /// target. The original is untouched if anything fails.
    #[default]
    Atomic,
    /// Truncate and overwrite the target directly.
    InPlace,
}

/// A change applied at one line of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Emit the text, then the line.
    InsertBefore(String),
    /// Emit the line, then the text.
    InsertAfter(String),
    /// Emit the text in place of the line.
    Replace(String),
    /// Omit the line.
    Drop,
    /// Prefix the line with `# `.
    Comment,
    /// Strip a leading `#` and the whitespace after it.
    Uncomment,
}

impl Edit {
    fn apply(&self, line: &str, out: &mut String) {
        match self {
            Edit::InsertBefore(text) => {
                out.push_str(text);
                out.push_str(line);
            }
            Edit::InsertAfter(text) => {
                out.push_str(line);
                if !line.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(text);
            }
            Edit::Replace(text) => out.push_str(text),
            Edit::Drop => {}
            Edit::Comment => {
                out.push_str("# ");
                out.push_str(line);
            }
            Edit::Uncomment => {
                let content = strip_newline(line);
                let stripped = content
                    .strip_prefix('#')
                    .map_or(content, str::trim_start);
                out.push_str(stripped);
                out.push_str(terminator(line));
            }
        }
    }
}

/// The edits one operation wants to make to a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    edits: Vec<(usize, Edit)>,
    append: String,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `edit` at line `index` (0-based). One edit per line; a later
    /// call for the same line replaces the earlier one.
    pub fn edit(&mut self, index: usize, edit: Edit) {
        match self.edits.iter_mut().find(|(i, _)| *i == index) {
            Some(slot) => slot.1 = edit,
            None => self.edits.push((index, edit)),
        }
    }

    /// Append `text` after the last line.
    pub fn append(&mut self, text: &str) {
        self.append.push_str(text);
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty() && self.append.is_empty()
    }

    /// Produce the edited text.
    pub fn render(&self, snapshot: &str) -> String {
        let mut out = String::with_capacity(snapshot.len() + self.append.len() + 64);

        for (index, line) in scanner::lines(snapshot).enumerate() {
            match self.edits.iter().find(|(i, _)| *i == index) {
                Some((_, edit)) => edit.apply(line, &mut out),
                None => out.push_str(line),
            }
        }

        if !self.append.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.append);
        }

        out
    }
}

/// Read the whole file. A missing file is an error.
pub fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| EditError::read(path, e))
}

/// Read the whole file, treating a missing file as empty.
pub fn read_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(EditError::read(path, e)),
    }
}

/// Render `plan` over `snapshot` and write the result to `path`.
///
/// Nothing is written when the rendered text equals the snapshot and the
/// file already exists.
pub fn apply(path: &Path, snapshot: &str, plan: &Plan, mode: WriteMode) -> Result<()> {
    let rendered = plan.render(snapshot);
    if rendered == snapshot && path.exists() {
        debug!(path = %path.display(), "no change, skipping write");
        return Ok(());
    }
    write(path, &rendered, mode)
}

/// Put `content` at `path` according to `mode`.
pub fn write(path: &Path, content: &str, mode: WriteMode) -> Result<()> {
    match mode {
        WriteMode::InPlace => {
            fs::write(path, content).map_err(|e| EditError::write(path, e))?;
        }
        WriteMode::Atomic => write_atomic(path, content)?,
    }
    info!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    // Replace the file a symlink points at, not the link itself.
    let target = match fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(EditError::write(path, e)),
    };
    if fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) {
        debug!(path = %path.display(), target = %target.display(), "writing through link");
    }

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| EditError::write(path, e))?;
    temp.write_all(content.as_bytes())
        .and_then(|()| temp.flush())
        .map_err(|e| EditError::write(path, e))?;

    // NamedTempFile is created 0600; keep whatever the target had.
    if let Ok(metadata) = fs::metadata(&target) {
        fs::set_permissions(temp.path(), metadata.permissions())
            .map_err(|e| EditError::write(path, e))?;
    }

    temp.persist(&target).map_err(|e| EditError::Persist {
        path: target.clone(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const INPUT: &str = "[default]\na = b\n[second]\ne = f\n";

    #[test]
    fn test_empty_plan_renders_input() {
        assert_eq!(Plan::new().render(INPUT), INPUT);
    }

    #[test]
    fn test_insert_after() {
        let mut plan = Plan::new();
        plan.edit(0, Edit::InsertAfter("x = 1\n".to_string()));
        assert_eq!(
            plan.render(INPUT),
            "[default]\nx = 1\na = b\n[second]\ne = f\n"
        );
    }

    #[test]
    fn test_insert_after_unterminated_last_line() {
        let mut plan = Plan::new();
        plan.edit(0, Edit::InsertAfter("x = 1\n".to_string()));
        assert_eq!(plan.render("[default]"), "[default]\nx = 1\n");
    }

    #[test]
    fn test_insert_before() {
        let mut plan = Plan::new();
        plan.edit(2, Edit::InsertBefore("[new]\n".to_string()));
        assert_eq!(
            plan.render(INPUT),
            "[default]\na = b\n[new]\n[second]\ne = f\n"
        );
    }

    #[test]
    fn test_replace_and_drop() {
        let mut plan = Plan::new();
        plan.edit(1, Edit::Replace("a = 2\n".to_string()));
        plan.edit(3, Edit::Drop);
        assert_eq!(plan.render(INPUT), "[default]\na = 2\n[second]\n");
    }

    #[test]
    fn test_comment_then_uncomment() {
        let mut comment = Plan::new();
        comment.edit(1, Edit::Comment);
        let commented = comment.render(INPUT);
        assert_eq!(commented, "[default]\n# a = b\n[second]\ne = f\n");

        let mut uncomment = Plan::new();
        uncomment.edit(1, Edit::Uncomment);
        assert_eq!(uncomment.render(&commented), INPUT);
    }

    #[test]
    fn test_uncomment_strips_hash_and_spaces() {
        let mut plan = Plan::new();
        plan.edit(0, Edit::Uncomment);
        assert_eq!(plan.render("#   a=b"), "a=b");
    }

    #[test]
    fn test_later_edit_replaces_earlier() {
        let mut plan = Plan::new();
        plan.edit(1, Edit::Drop);
        plan.edit(1, Edit::Comment);
        assert_eq!(plan.render(INPUT), "[default]\n# a = b\n[second]\ne = f\n");
    }

    #[test]
    fn test_append_adds_missing_newline() {
        let mut plan = Plan::new();
        plan.append("[new]\ns = t\n");
        assert_eq!(plan.render("a = b"), "a = b\n[new]\ns = t\n");
        assert_eq!(plan.render(""), "[new]\ns = t\n");
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read(&dir.path().join("missing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_read_or_empty_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_or_empty(&dir.path().join("missing")).unwrap(), "");
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("test.ini");
        fs::write(&file, "old\n").unwrap();

        write(&file, "new\n", WriteMode::Atomic).unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "new\n");
        // Only the target remains; the temporary file was renamed away.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_through_symlink() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.ini");
        let link = dir.path().join("link.ini");
        fs::write(&real, "[default]\na = b\n").unwrap();
        symlink(&real, &link).unwrap();

        write(&link, "[default]\na = 2\n", WriteMode::Atomic).unwrap();

        assert_eq!(fs::read_to_string(&real).unwrap(), "[default]\na = 2\n");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("test.ini");
        fs::write(&file, "old\n").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();

        write(&file, "new\n", WriteMode::Atomic).unwrap();

        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_write_in_place_creates_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("test.ini");

        write(&file, "a = b\n", WriteMode::InPlace).unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "a = b\n");
    }

    #[test]
    fn test_apply_skips_unchanged_write() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("test.ini");
        fs::write(&file, INPUT).unwrap();
        let before = fs::metadata(&file).unwrap().modified().unwrap();

        apply(&file, INPUT, &Plan::new(), WriteMode::Atomic).unwrap();

        assert_eq!(fs::metadata(&file).unwrap().modified().unwrap(), before);
    }
}
