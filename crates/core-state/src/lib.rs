//! The selection/editor core (C7): a cursor state machine over a change
//! set, and an `Editor` that tracks which refs are included, which changes
//! are opened, and an undo/redo history of toggle actions.

mod cursor;
mod editor;

pub use cursor::{hunks, Cursor};
pub use editor::{Action, Editor, EditorResult};
