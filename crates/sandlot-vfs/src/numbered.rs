//! Line-addressed read decorator.
//!
//! Hosts that surface files to an agent or an editor want stable line
//! numbers next to the text. `read_numbered` renders any VFS file in
//! `cat -n` style; `Vfs::read_file` stays the raw variant.

use crate::{Vfs, VfsResult};

/// Minimum width of the line-number field. Wider files grow the field so
/// numbers stay right-aligned at every size.
const MIN_NUMBER_WIDTH: usize = 6;

/// Longest line rendered before truncation.
const MAX_LINE_CHARS: usize = 2000;

#[derive(Copy, Clone, Debug, Default)]
pub struct ReadOptions {
    /// 0-indexed first line to render.
    pub offset: Option<usize>,
    /// Maximum number of lines to render.
    pub limit: Option<usize>,
}

/// Read a file with a `<line-number>|` prefix on every line.
///
/// Line numbers are 1-indexed and right-aligned in a field of at least
/// [`MIN_NUMBER_WIDTH`]; lines longer than [`MAX_LINE_CHARS`] characters are
/// truncated with a trailing `...`.
pub fn read_numbered(vfs: &dyn Vfs, path: &str, options: ReadOptions) -> VfsResult<String> {
    let text = vfs.read_file(path)?;
    let lines: Vec<&str> = text.lines().collect();

    let offset = options.offset.unwrap_or(0);
    let end = match options.limit {
        Some(limit) => (offset + limit).min(lines.len()),
        None => lines.len(),
    };
    let width = field_width(lines.len());

    let mut out = String::with_capacity(text.len() + (end.saturating_sub(offset)) * (width + 1));
    for (idx, line) in lines
        .iter()
        .enumerate()
        .take(end)
        .skip(offset.min(lines.len()))
    {
        let number = idx + 1;
        out.push_str(&format!("{number:>width$}|"));
        out.push_str(&clip(line));
        out.push('\n');
    }
    Ok(out)
}

fn field_width(total_lines: usize) -> usize {
    let digits = total_lines.max(1).to_string().len();
    digits.max(MIN_NUMBER_WIDTH)
}

fn clip(line: &str) -> std::borrow::Cow<'_, str> {
    if line.chars().count() <= MAX_LINE_CHARS {
        return std::borrow::Cow::Borrowed(line);
    }
    let clipped: String = line.chars().take(MAX_LINE_CHARS).collect();
    std::borrow::Cow::Owned(format!("{clipped}..."))
}
