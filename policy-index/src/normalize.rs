//! Text normalization for extracted PDF pages.
//!
//! PDF extraction leaves layout noise: trailing spaces, long runs of blank
//! lines, form feeds and the occasional NUL. Chunk boundaries rely on
//! `\n\n` paragraph breaks, so those are kept while the noise goes.

use tracing::trace;

/// Clean up one page of extracted text.
///
/// - Drops NUL and form-feed characters, maps tabs and non-breaking spaces to a space.
/// - Collapses runs of spaces inside a line.
/// - Trims each line and collapses multiple blank lines into one.
/// - Trims leading/trailing blank lines of the page.
pub fn normalize_page_text(s: &str) -> String {
    trace!("normalize_page_text: input_len={}", s.len());

    let mut out = String::with_capacity(s.len());
    let mut blank_run = 0usize;

    for raw in s.lines() {
        let line = collapse_spaces(raw);

        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }

        out.push_str(&line);
        out.push('\n');
    }

    out.truncate(out.trim_end().len());
    out
}

fn collapse_spaces(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut pending_space = false;
    for c in line.chars() {
        match c {
            '\u{0}' | '\u{c}' => {}
            ' ' | '\t' | '\u{a0}' => pending_space = true,
            c => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_layout_noise() {
        let raw = "\n\n  Parental   leave\u{a0}policy  \n\n\n\nFathers\tare entitled\u{c}\n\n";
        assert_eq!(
            normalize_page_text(raw),
            "Parental leave policy\n\nFathers are entitled"
        );
    }

    #[test]
    fn empty_page_stays_empty() {
        assert_eq!(normalize_page_text(" \n\u{0}\n\t\n"), "");
    }
}
