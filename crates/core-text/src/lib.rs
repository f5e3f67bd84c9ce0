//! Grapheme-aware text measurement for the renderer: display width of a
//! string, and splitting a string into glyph-sized pieces for tab expansion
//! and cursor-adjacent underlining.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Terminal column width of `text`, one grapheme cluster at a time so
/// combining marks don't inflate the count.
pub fn display_width(text: &str) -> usize {
    text.graphemes(true).map(|g| g.width()).sum()
}

/// Splits `text` into its grapheme clusters, each paired with its display
/// width — the unit the renderer truncates/pads/underlines at.
pub fn graphemes(text: &str) -> Vec<(&str, usize)> {
    text.graphemes(true).map(|g| (g, g.width())).collect()
}

/// Expands tabs to `tab_width`-aligned spaces, matching the original's
/// fixed-width tab rendering (no terminal tab-stop negotiation).
pub fn expand_tabs(text: &str, tab_width: u32) -> String {
    let tab_width = tab_width.max(1) as usize;
    let mut out = String::with_capacity(text.len());
    let mut column = 0usize;

    for grapheme in text.graphemes(true) {
        if grapheme == "\t" {
            let spaces = tab_width - (column % tab_width);
            out.push_str(&" ".repeat(spaces));
            column += spaces;
        } else {
            out.push_str(grapheme);
            column += grapheme.width();
        }
    }

    out
}

/// Truncates `text` to at most `max_width` display columns, never splitting
/// a grapheme cluster.
pub fn truncate_to_width(text: &str, max_width: usize) -> &str {
    let mut used = 0;
    let mut end = text.len();
    for (start, grapheme) in text.grapheme_indices(true) {
        let w = grapheme.width();
        if used + w > max_width {
            end = start;
            break;
        }
        used += w;
    }
    &text[..end]
}
