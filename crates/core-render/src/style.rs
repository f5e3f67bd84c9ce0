//! Text styling: foreground/background color, weight, and emphasis, and an
//! `update` operation for layering one style over another (e.g. a selection
//! highlight over a line's own diff coloring).

use crossterm::style::{Attribute, Color, ContentStyle};

/// One of the 16 standard terminal colors, plus `Default` for "whatever the
/// terminal's own default is" (as opposed to an explicit color).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    Default,
    Black,
    DarkGrey,
    Red,
    DarkRed,
    Green,
    DarkGreen,
    Yellow,
    DarkYellow,
    Blue,
    DarkBlue,
    Magenta,
    DarkMagenta,
    Cyan,
    DarkCyan,
    White,
    Grey,
}

impl TextColor {
    fn to_crossterm(self) -> Color {
        match self {
            TextColor::Default => Color::Reset,
            TextColor::Black => Color::Black,
            TextColor::DarkGrey => Color::DarkGrey,
            TextColor::Red => Color::Red,
            TextColor::DarkRed => Color::DarkRed,
            TextColor::Green => Color::Green,
            TextColor::DarkGreen => Color::DarkGreen,
            TextColor::Yellow => Color::Yellow,
            TextColor::DarkYellow => Color::DarkYellow,
            TextColor::Blue => Color::Blue,
            TextColor::DarkBlue => Color::DarkBlue,
            TextColor::Magenta => Color::Magenta,
            TextColor::DarkMagenta => Color::DarkMagenta,
            TextColor::Cyan => Color::Cyan,
            TextColor::DarkCyan => Color::DarkCyan,
            TextColor::White => Color::White,
            TextColor::Grey => Color::Grey,
        }
    }
}

/// A style is a set of *optional* overrides: `None` means "inherit whatever
/// is already in effect," which is what makes `update` a sensible
/// composition operation rather than a full replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    pub fg: Option<TextColor>,
    pub bg: Option<TextColor>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
}

impl Style {
    pub fn fg(color: TextColor) -> Style {
        Style { fg: Some(color), ..Style::default() }
    }

    pub fn bold() -> Style {
        Style { bold: Some(true), ..Style::default() }
    }

    pub fn underline() -> Style {
        Style { underline: Some(true), ..Style::default() }
    }

    /// Layers `other` on top of `self`: any field `other` sets wins, any
    /// field it leaves unset falls through to `self`.
    pub fn update(&self, other: &Style) -> Style {
        Style {
            fg: other.fg.or(self.fg),
            bg: other.bg.or(self.bg),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            underline: other.underline.or(self.underline),
        }
    }

    fn content_style(&self) -> ContentStyle {
        let mut style = ContentStyle::new();
        if let Some(fg) = self.fg {
            style.foreground_color = Some(fg.to_crossterm());
        }
        if let Some(bg) = self.bg {
            style.background_color = Some(bg.to_crossterm());
        }
        if self.bold == Some(true) {
            style.attributes.set(Attribute::Bold);
        }
        if self.italic == Some(true) {
            style.attributes.set(Attribute::Italic);
        }
        if self.underline == Some(true) {
            style.attributes.set(Attribute::Underlined);
        }
        style
    }

    /// Renders `text` with this style's ANSI escapes, resetting afterward.
    pub fn paint(&self, text: &str) -> String {
        self.content_style().apply(text).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_lets_the_overlay_win_only_on_fields_it_sets() {
        let base = Style { fg: Some(TextColor::Red), bold: Some(true), ..Style::default() };
        let overlay = Style { bg: Some(TextColor::Grey), ..Style::default() };
        let combined = base.update(&overlay);
        assert_eq!(combined.fg, Some(TextColor::Red));
        assert_eq!(combined.bg, Some(TextColor::Grey));
        assert_eq!(combined.bold, Some(true));
    }

    #[test]
    fn paint_round_trips_plain_text_when_unstyled() {
        let style = Style::default();
        assert_eq!(style.paint("hello"), "hello");
    }
}
