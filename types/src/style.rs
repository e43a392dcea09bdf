//! Styled-span model over escape-stripped plain text.

/// The 16-entry ANSI terminal palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

/// A merged visual style: overlapping SGR attributes collapse into one
/// composite value per span rather than producing overlapping spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub bold: bool,
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

impl Style {
    /// Whether this style carries no visible attributes.
    #[must_use]
    pub fn is_default(self) -> bool {
        self == Self::default()
    }
}

/// A contiguous styled run over a document's plain (escape-stripped) text.
///
/// Offsets are byte offsets into the plain text, half-open `[start, end)`.
/// Spans produced by the parser are non-overlapping and sorted by start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledSpan {
    start: usize,
    end: usize,
    style: Style,
}

impl StyledSpan {
    /// Construct a span. This is the single construction path; the private
    /// fields prevent mutation after construction.
    #[must_use]
    pub fn new(start: usize, end: usize, style: Style) -> Self {
        debug_assert!(start <= end, "span start must not exceed end");
        Self { start, end, style }
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    #[must_use]
    pub fn style(&self) -> Style {
        self.style
    }

    /// The `(start, end)` byte range of this span.
    #[must_use]
    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style_has_no_attributes() {
        let style = Style::default();
        assert!(style.is_default());
        assert!(!style.bold);
        assert_eq!(style.fg, None);
        assert_eq!(style.bg, None);
    }

    #[test]
    fn test_styled_is_not_default() {
        let style = Style {
            bold: true,
            ..Style::default()
        };
        assert!(!style.is_default());

        let style = Style {
            fg: Some(Color::Red),
            ..Style::default()
        };
        assert!(!style.is_default());
    }

    #[test]
    fn test_span_accessors() {
        let style = Style {
            bold: true,
            fg: Some(Color::Red),
            bg: None,
        };
        let span = StyledSpan::new(0, 5, style);
        assert_eq!(span.start(), 0);
        assert_eq!(span.end(), 5);
        assert_eq!(span.range(), (0, 5));
        assert_eq!(span.style(), style);
    }
}
