//! Plain-text extraction from PDF syllabi.
//!
//! `pdf_extract` can panic on malformed input, so every call goes through
//! [`std::panic::catch_unwind`]. Any failure yields an empty string and the caller
//! decides what an empty document means.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

pub fn extract_text(data: &[u8]) -> String {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
    }));

    let pages = match result {
        Ok(Ok(pages)) => pages,
        Ok(Err(err)) => {
            warn!(error = %err, "pdf extraction failed");
            return String::new();
        }
        Err(_) => {
            warn!("pdf extraction panicked on malformed document");
            return String::new();
        }
    };

    let cleaned: Vec<String> = pages
        .iter()
        .map(|page| clean_page(page))
        .filter(|page| !page.is_empty())
        .collect();
    debug!(pages = pages.len(), non_empty = cleaned.len(), "extracted pdf text");
    cleaned.join("\n")
}

/// Trims trailing whitespace per line, collapses blank runs to at most two lines and
/// drops leading/trailing blank lines.
fn clean_page(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0_u32;
    for line in raw.lines().map(str::trim_end) {
        if line.is_empty() {
            blank_run += 1;
            if blank_run <= 2 {
                out.push('\n');
            }
        } else {
            blank_run = 0;
            out.push_str(line);
            out.push('\n');
        }
    }

    let trimmed = out.trim_matches('\n');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

/// Caps `text` at `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_yield_empty_text() {
        assert_eq!(extract_text(b"definitely not a pdf"), "");
        assert_eq!(extract_text(&[]), "");
    }

    #[test]
    fn clean_page_collapses_blank_runs() {
        let raw = "\n\nCS101 Syllabus   \n\n\n\n\nMidterm: Oct 12\n\n";
        assert_eq!(clean_page(raw), "CS101 Syllabus\n\n\nMidterm: Oct 12\n");
    }

    #[test]
    fn clean_page_of_whitespace_is_empty() {
        assert_eq!(clean_page("   \n \n\t\n"), "");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 15_000), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
