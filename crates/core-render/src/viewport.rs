//! Scrolls a rendered `Drawable` tree into a fixed-height terminal viewport:
//! flattens it to lines plus the current selection marker, keeps the marker
//! in view with a margin of context, and draws a proportional scrollbar in
//! the right column.

use crate::drawable::{Drawable, Item};
use crate::writer::Writer;

/// Lines of context kept between the selection marker and the viewport
/// edge, when there's enough content to keep it.
pub const EDGE_PADDING: usize = 5;

struct Frame {
    lines: Vec<String>,
    marker_line: Option<usize>,
}

fn flatten(items: Vec<Item>) -> Frame {
    let mut lines = Vec::with_capacity(items.len());
    let mut marker_line = None;
    for item in items {
        match item {
            Item::Line(line) => lines.push(line),
            Item::Marker(_) => marker_line = Some(lines.len()),
        }
    }
    Frame { lines, marker_line }
}

fn clamp_offset(total: usize, viewport_height: usize, offset: usize) -> usize {
    let max_offset = total.saturating_sub(viewport_height);
    offset.min(max_offset)
}

fn compute_scroll_offset(total: usize, viewport_height: usize, marker: Option<usize>, previous_offset: usize) -> usize {
    if viewport_height == 0 || total <= viewport_height {
        return 0;
    }

    let Some(marker) = marker else {
        return clamp_offset(total, viewport_height, previous_offset);
    };

    let mut offset = previous_offset;
    let wanted_top = marker.saturating_sub(EDGE_PADDING);
    let wanted_bottom = (marker + EDGE_PADDING).min(total - 1);

    if wanted_top < offset {
        offset = wanted_top;
    }
    if wanted_bottom >= offset + viewport_height {
        offset = wanted_bottom + 1 - viewport_height;
    }

    clamp_offset(total, viewport_height, offset)
}

/// A thumb occupying the rows proportional to the viewport within the
/// total content, on a track of thin vertical bars. A simplified stand-in
/// for a finer-grained (e.g. eighth-block) scrollbar.
fn scrollbar_column(total: usize, viewport_height: usize, offset: usize) -> Vec<char> {
    if viewport_height == 0 {
        return Vec::new();
    }
    if total <= viewport_height {
        return vec![' '; viewport_height];
    }

    let thumb_size = ((viewport_height * viewport_height) as f64 / total as f64).round().max(1.0) as usize;
    let thumb_size = thumb_size.min(viewport_height);
    let max_thumb_pos = viewport_height - thumb_size;
    let scrollable = total - viewport_height;
    let thumb_pos = if scrollable > 0 { (offset * max_thumb_pos) / scrollable } else { 0 };

    (0..viewport_height)
        .map(|row| if row >= thumb_pos && row < thumb_pos + thumb_size { '\u{2588}' } else { '\u{2502}' })
        .collect()
}

/// Tracks scroll position across frames so the viewport doesn't jump back
/// to the marker's padding every redraw once it's already in view.
#[derive(Default)]
pub struct Viewport {
    offset: usize,
}

impl Viewport {
    pub fn new() -> Viewport {
        Viewport { offset: 0 }
    }

    /// Renders `drawable` into a `width`x`height` terminal viewport and
    /// flushes it. Reserves the rightmost column for the scrollbar.
    pub fn draw(&mut self, drawable: &dyn Drawable, width: u16, height: u16) -> anyhow::Result<()> {
        let width = width as usize;
        let height = height as usize;
        let content_width = width.saturating_sub(1);

        let frame = flatten(drawable.render(content_width));
        let next_offset = compute_scroll_offset(frame.lines.len(), height, frame.marker_line, self.offset);
        if next_offset != self.offset {
            tracing::trace!(from = self.offset, to = next_offset, total = frame.lines.len(), "scroll");
        }
        self.offset = next_offset;
        let bar = scrollbar_column(frame.lines.len(), height, self.offset);

        let mut writer = Writer::new();
        for row in 0..height {
            writer.move_to(0, row as u16);
            writer.clear_line(0, row as u16);
            if let Some(line) = frame.lines.get(self.offset + row) {
                writer.print(line.clone());
            }
            if let Some(&glyph) = bar.get(row) {
                writer.move_to(content_width as u16, row as u16);
                writer.print(glyph.to_string());
            }
        }
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_stays_zero_when_content_fits_the_viewport() {
        assert_eq!(compute_scroll_offset(10, 20, Some(5), 0), 0);
    }

    #[test]
    fn offset_scrolls_down_to_keep_the_marker_in_view_with_padding() {
        let offset = compute_scroll_offset(100, 10, Some(50), 0);
        assert!(offset + EDGE_PADDING <= 50);
        assert!(50 < offset + 10);
    }

    #[test]
    fn offset_does_not_move_when_marker_already_comfortably_in_view() {
        let offset = compute_scroll_offset(100, 20, Some(15), 10);
        assert_eq!(offset, 10);
    }

    #[test]
    fn offset_scrolls_up_when_marker_moves_above_the_viewport() {
        let offset = compute_scroll_offset(100, 10, Some(2), 30);
        assert_eq!(offset, 0);
    }

    #[test]
    fn scrollbar_thumb_spans_the_whole_track_when_content_fits() {
        let bar = scrollbar_column(5, 10, 0);
        assert!(bar.iter().all(|&c| c == ' '));
    }

    #[test]
    fn scrollbar_thumb_sits_at_the_end_when_scrolled_to_the_bottom() {
        let bar = scrollbar_column(100, 10, 90);
        assert_eq!(bar.last(), Some(&'\u{2588}'));
    }
}
