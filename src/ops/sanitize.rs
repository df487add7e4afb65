//! Normalization of typographic and invisible characters in C# sources.
//!
//! Sources pasted from chat clients and word processors pick up smart
//! quotes, dashes and zero-width marks that the C# compiler rejects or, worse,
//! silently accepts inside identifiers.

use std::path::Path;

use anyhow::Result;

use crate::util::fs::{read_utf8, relative_path, walk_files, write_string};

/// Extension of the files the sanitizer and source patcher touch.
pub const SOURCE_EXTENSION: &str = "cs";

/// Line terminator used when a sanitized file is written back.
pub const CANONICAL_NEWLINE: &str = "\r\n";

/// Characters replaced everywhere, with their replacement.
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201B}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{201F}', "\""),
    ('\u{00AB}', "\""),
    ('\u{00BB}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2026}', "..."),
    ('\u{00A0}', " "),
    ('\u{200B}', ""),
    ('\u{200C}', ""),
    ('\u{200D}', ""),
    ('\u{FEFF}', ""),
];

/// Invisible marks stripped from the start of every line.
const LINE_LEADING_MARKS: &[char] = &['\u{FEFF}', '\u{200B}', '\u{200C}', '\u{200D}'];

/// Sanitize `text`, returning `None` when nothing needed replacing.
///
/// When something changed the result uses [`CANONICAL_NEWLINE`] throughout;
/// whether the text ends with a newline is preserved.
pub fn sanitize_text(text: &str) -> Option<String> {
    let mut changed = false;
    let mut out = String::with_capacity(text.len());

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start_matches(LINE_LEADING_MARKS);
        changed |= trimmed.len() != line.len();

        for c in trimmed.chars() {
            match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
                Some((_, to)) => {
                    out.push_str(to);
                    changed = true;
                }
                None => out.push(c),
            }
        }
    }

    changed.then(|| normalize_newlines(&out, CANONICAL_NEWLINE))
}

/// Rewrite every line terminator (`\n` or `\r\n`) as `newline`.
pub fn normalize_newlines(text: &str, newline: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    let mut lines = text.split('\n').peekable();
    while let Some(line) = lines.next() {
        let is_last = lines.peek().is_none();
        if is_last {
            out.push_str(line);
        } else {
            out.push_str(line.strip_suffix('\r').unwrap_or(line));
            out.push_str(newline);
        }
    }
    out
}

/// Sanitize every C# source below `root` outside build output.
///
/// Returns the number of files rewritten. Files that need no change are not
/// touched, so a second run writes nothing.
pub fn sanitize_sources(root: &Path) -> Result<usize> {
    let mut count = 0;

    for path in walk_files(root, SOURCE_EXTENSION) {
        let Some(text) = read_utf8(&path)? else {
            continue;
        };

        if let Some(clean) = sanitize_text(&text) {
            write_string(&path, &clean)?;
            tracing::debug!("sanitized {}", relative_path(root, &path).display());
            count += 1;
        }
    }

    Ok(count)
}
