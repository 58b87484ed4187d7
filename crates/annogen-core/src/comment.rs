//! Comment transformation.
//!
//! Raw comments keep their delimiters (`/** ... */`, `///`, `///<`).
//! Every physical line loses its leading run of spaces, tabs, `/`, `*`
//! and `<`, plus a trailing `*/`; lines left empty are dropped. The
//! surviving lines are then laid out for one of three targets.

/// Indentation of doc-block lines.
pub const DOC_BLOCK_INDENT: &str = "    ";

/// Doc-block open/close delimiter.
pub const DOC_BLOCK_DELIMITER: &str = "\"\"\"";

/// Line-comment marker.
pub const LINE_COMMENT_MARKER: &str = "// ";

/// Inline docstring used when there is no comment.
pub const NO_DOCSTRING: &str = "No docstring";

const LEADING: &[char] = &[' ', '\t', '/', '*', '<'];

/// Output layout of [`transform_comment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// Indented lines between `"""` delimiters, `@tag` rewritten as `:tag`.
    DocBlock,
    /// `// ` before each line, no indentation.
    LineComment,
    /// One escaped line for a string literal in native glue code.
    Inline,
}

fn clean_line(line: &str) -> &str {
    let mut rest = line.trim_start_matches(LEADING);
    // Qt-style markers: `//!<`, `/*!`.
    if let Some(after) = rest.strip_prefix('!') {
        rest = after.trim_start_matches(LEADING);
    }
    let rest = rest.trim_end();
    rest.strip_suffix("*/").unwrap_or(rest).trim_end()
}

/// The non-empty, marker-free lines of a raw comment.
pub fn comment_lines(raw: &str) -> Vec<&str> {
    raw.lines()
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Transform a raw comment for the given target.
///
/// With no comment (or one with no text left after cleaning) doc-block
/// mode yields the bare indentation, line-comment mode an empty string
/// and inline mode [`NO_DOCSTRING`].
pub fn transform_comment(raw: Option<&str>, style: CommentStyle) -> String {
    let lines = raw.map(comment_lines).unwrap_or_default();

    match style {
        CommentStyle::DocBlock if lines.is_empty() => DOC_BLOCK_INDENT.to_string(),
        CommentStyle::DocBlock => {
            let mut out = format!("{DOC_BLOCK_INDENT}{DOC_BLOCK_DELIMITER}\n");
            for line in lines {
                out.push_str(DOC_BLOCK_INDENT);
                out.push_str(&line.replace('@', ":"));
                out.push('\n');
            }
            out.push_str(DOC_BLOCK_INDENT);
            out.push_str(DOC_BLOCK_DELIMITER);
            out
        }
        CommentStyle::LineComment => lines
            .iter()
            .map(|line| format!("{LINE_COMMENT_MARKER}{line}"))
            .collect::<Vec<_>>()
            .join("\n"),
        CommentStyle::Inline if lines.is_empty() => NO_DOCSTRING.to_string(),
        CommentStyle::Inline => lines
            .iter()
            .map(|&line| {
                line.strip_prefix("@brief")
                    .or_else(|| line.strip_prefix("\\brief"))
                    .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
                    .map(str::trim_start)
                    .unwrap_or(line)
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .replace('\\', "\\\\")
            .replace('"', "\\\""),
    }
}
