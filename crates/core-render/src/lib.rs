//! Rendering (C8): lowers a change set and cursor/selection state into a
//! `Drawable` tree, then scrolls and paints it to the terminal. Also used
//! non-interactively (`--print`) to dump the whole change set to stdout.

mod changes;
mod drawable;
mod style;
mod viewport;
pub mod writer;

use std::collections::HashSet;

use jjdiff_change::{Change, Ref};

use core_state::Editor;

pub use changes::render_changes;
pub use drawable::{BoxDrawable, ColumnSpec, Drawable, Fill, Grid, Item, Marker, RawLine, Rows, SelectionMarker, Text};
pub use style::{Style, TextColor};
pub use viewport::{Viewport, EDGE_PADDING};
pub use writer::Writer;

/// Renders one interactive frame for `editor`'s current state into the
/// given viewport.
pub fn draw_editor_frame(viewport: &mut Viewport, editor: &Editor, width: u16, height: u16) -> anyhow::Result<()> {
    let rows = render_changes(editor.changes(), editor.included(), Some(editor.opened()), Some(editor.cursor()));
    viewport.draw(&rows, width, height)
}

/// Renders the whole change set to stdout with every file change opened
/// and no cursor or scrolling — the `--print` path.
pub fn print_changes(changes: &[Change], included: &HashSet<Ref>, width: usize) {
    let rows = render_changes(changes, included, None, None);
    for item in rows.render(width) {
        if let Item::Line(line) = item {
            println!("{line}");
        }
    }
}
