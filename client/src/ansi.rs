//! ANSI escape decoding for diagnostic output.
//!
//! [`parse`] turns raw analysis-server output into plain text plus styled
//! spans. Only the SGR family (reset, bold, 16-color foreground and
//! background) produces styles; every other escape sequence, and any
//! malformed one, is dropped silently — best-effort rendering must never
//! block the user from seeing output. Control characters other than
//! `\n`, `\t`, `\r` are dropped as well, so the plain output is always
//! safe to feed back through the parser.

use tether_types::{Color, Style, StyledSpan};

/// ASCII escape character that starts ANSI sequences.
const ESC: char = '\x1b';
/// ASCII bell character that can terminate OSC sequences.
const BEL: char = '\x07';

/// Decode `raw` into plain text and non-overlapping styled spans.
///
/// Span offsets are byte offsets into the returned plain text — escape
/// sequences contribute zero characters, so offsets are in the output
/// coordinate space, not the input's. Runs with the default style produce
/// no span. Idempotent: feeding the plain output back in returns it
/// unchanged with no spans.
#[must_use]
pub fn parse(raw: &str) -> (String, Vec<StyledSpan>) {
    let mut plain = String::with_capacity(raw.len());
    let mut spans = Vec::new();
    let mut style = Style::default();
    let mut span_start: Option<usize> = None;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ESC {
            if let Some(next) = consume_escape(&mut chars, style) {
                set_style(&mut style, next, &mut span_start, &mut spans, plain.len());
            }
        } else if is_allowed_control(c) {
            plain.push(c);
        } else if is_c0_control(c) || is_c1_control(c) || c == '\x7f' {
            if c == '\u{009b}' {
                // C1 CSI equivalent; drop its parameters too.
                let _ = consume_csi(&mut chars, style);
            }
        } else {
            if span_start.is_none() && !style.is_default() {
                span_start = Some(plain.len());
            }
            plain.push(c);
        }
    }

    close_span(&mut span_start, &mut spans, style, plain.len());
    (plain, spans)
}

fn is_c0_control(c: char) -> bool {
    c <= '\x1f'
}

fn is_allowed_control(c: char) -> bool {
    matches!(c, '\n' | '\t' | '\r')
}

fn is_c1_control(c: char) -> bool {
    ('\u{0080}'..='\u{009f}').contains(&c)
}

/// Record a style change at `offset`, closing the open span if the style
/// actually changed. Keeping one active style at a time is what makes the
/// output spans non-overlapping: attribute changes close-and-reopen.
fn set_style(
    style: &mut Style,
    next: Style,
    span_start: &mut Option<usize>,
    spans: &mut Vec<StyledSpan>,
    offset: usize,
) {
    if next == *style {
        return;
    }
    close_span(span_start, spans, *style, offset);
    *style = next;
    if !next.is_default() {
        *span_start = Some(offset);
    }
}

fn close_span(
    span_start: &mut Option<usize>,
    spans: &mut Vec<StyledSpan>,
    style: Style,
    offset: usize,
) {
    if let Some(start) = span_start.take()
        && offset > start
    {
        spans.push(StyledSpan::new(start, offset, style));
    }
}

/// Consume one escape sequence after ESC. Returns the new style when the
/// sequence was a recognized SGR; everything else is skipped wholesale.
fn consume_escape<I: Iterator<Item = char>>(
    chars: &mut std::iter::Peekable<I>,
    style: Style,
) -> Option<Style> {
    let &next = chars.peek()?;
    match next {
        // CSI sequence: ESC [ ... <final byte>
        '[' => {
            chars.next();
            consume_csi(chars, style)
        }
        // OSC sequence: ESC ] ... (BEL | ESC \)
        ']' => {
            chars.next();
            skip_osc_sequence(chars);
            None
        }
        // DCS, PM, APC sequences: ESC P/^/_ ... (ST)
        'P' | '^' | '_' => {
            chars.next();
            skip_until_st(chars);
            None
        }
        // Two-character sequences: ESC ( for G0, ESC ) for G1, etc.
        '(' | ')' | '*' | '+' | '#' | ' ' => {
            chars.next();
            chars.next();
            None
        }
        // Single-character commands: ESC 7, ESC 8, ESC c, etc.
        '7' | '8' | 'c' | 'D' | 'E' | 'H' | 'M' | 'N' | 'O' | 'Z' | '=' | '>' | '<' => {
            chars.next();
            None
        }
        // Unknown sequence - drop the lone ESC, next char parses normally.
        _ => None,
    }
}

/// Consume CSI parameter/intermediate bytes plus the final byte. Returns
/// a style only for a well-formed SGR (`final byte == 'm'`, numeric
/// parameters); every other CSI is dropped without effect.
fn consume_csi<I: Iterator<Item = char>>(
    chars: &mut std::iter::Peekable<I>,
    style: Style,
) -> Option<Style> {
    let mut params = String::new();
    while let Some(&c) = chars.peek() {
        if ('\x40'..='\x7e').contains(&c) {
            chars.next();
            if c == 'm' {
                return apply_sgr(&params, style);
            }
            return None;
        } else if ('\x20'..='\x3f').contains(&c) {
            chars.next();
            params.push(c);
        } else {
            // Invalid sequence or end of input.
            return None;
        }
    }
    None
}

/// Apply SGR parameters to `style`. An empty parameter list means reset.
/// Returns `None` (sequence dropped whole) when any parameter fails to
/// parse; unrecognized-but-numeric parameters are ignored individually.
fn apply_sgr(params: &str, mut style: Style) -> Option<Style> {
    for chunk in params.split(';') {
        let code: u16 = if chunk.is_empty() {
            0
        } else {
            chunk.parse().ok()?
        };
        match code {
            0 => style = Style::default(),
            1 => style.bold = true,
            22 => style.bold = false,
            30..=37 => style.fg = Some(palette(code - 30, false)),
            39 => style.fg = None,
            40..=47 => style.bg = Some(palette(code - 40, false)),
            49 => style.bg = None,
            90..=97 => style.fg = Some(palette(code - 90, true)),
            100..=107 => style.bg = Some(palette(code - 100, true)),
            _ => {}
        }
    }
    Some(style)
}

fn palette(index: u16, bright: bool) -> Color {
    match (index, bright) {
        (0, false) => Color::Black,
        (1, false) => Color::Red,
        (2, false) => Color::Green,
        (3, false) => Color::Yellow,
        (4, false) => Color::Blue,
        (5, false) => Color::Magenta,
        (6, false) => Color::Cyan,
        (7, false) => Color::White,
        (0, true) => Color::BrightBlack,
        (1, true) => Color::BrightRed,
        (2, true) => Color::BrightGreen,
        (3, true) => Color::BrightYellow,
        (4, true) => Color::BrightBlue,
        (5, true) => Color::BrightMagenta,
        (6, true) => Color::BrightCyan,
        _ => {
            if bright {
                Color::BrightWhite
            } else {
                Color::White
            }
        }
    }
}

/// Skip OSC sequence until BEL or ST (ESC \).
fn skip_osc_sequence<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) {
    while let Some(c) = chars.next() {
        if c == BEL {
            return;
        }
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}

/// Skip until ST (ESC \) for DCS/PM/APC sequences.
fn skip_until_st<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) {
    while let Some(c) = chars.next() {
        if c == ESC && chars.peek() == Some(&'\\') {
            chars.next();
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_bold() -> Style {
        Style {
            bold: true,
            fg: Some(Color::Red),
            bg: None,
        }
    }

    #[test]
    fn test_plain_text_passes_through() {
        let (plain, spans) = parse("no escapes here");
        assert_eq!(plain, "no escapes here");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_bold_red_error_prefix() {
        let (plain, spans) = parse("\x1b[1;31mERROR\x1b[0m: bad token");
        assert_eq!(plain, "ERROR: bad token");
        assert_eq!(spans, vec![StyledSpan::new(0, 5, red_bold())]);
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let inputs = [
            "\x1b[1;31mERROR\x1b[0m: bad token",
            "a\x1b]0;title\x07b\x1b[32mgreen",
            "tabs\tand\nnewlines\r\n",
        ];
        for raw in inputs {
            let (plain, _) = parse(raw);
            let (again, spans) = parse(&plain);
            assert_eq!(again, plain);
            assert!(spans.is_empty(), "re-parse of {plain:?} produced spans");
        }
    }

    #[test]
    fn test_plain_never_longer_than_raw() {
        let inputs = [
            "\x1b[31mred\x1b[0m",
            "\x1b[0m\x1b[1m\x1b[39m",
            "plain",
            "\x1b[1;31;42mmix\x1b[m",
        ];
        for raw in inputs {
            let (plain, _) = parse(raw);
            assert!(plain.len() <= raw.len());
        }
    }

    #[test]
    fn test_adjacent_styles_do_not_overlap() {
        let (plain, spans) = parse("\x1b[31mred\x1b[32mgreen\x1b[0mplain");
        assert_eq!(plain, "redgreenplain");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].range(), (0, 3));
        assert_eq!(spans[0].style().fg, Some(Color::Red));
        assert_eq!(spans[1].range(), (3, 8));
        assert_eq!(spans[1].style().fg, Some(Color::Green));
        for window in spans.windows(2) {
            assert!(window[0].end() <= window[1].start());
        }
    }

    #[test]
    fn test_attributes_merge_into_one_span() {
        let (plain, spans) = parse("\x1b[1m\x1b[31mboth\x1b[0m");
        assert_eq!(plain, "both");
        assert_eq!(spans, vec![StyledSpan::new(0, 4, red_bold())]);
    }

    #[test]
    fn test_background_colors() {
        let (plain, spans) = parse("\x1b[41mwarn\x1b[49m rest");
        assert_eq!(plain, "warn rest");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].range(), (0, 4));
        assert_eq!(spans[0].style().bg, Some(Color::Red));
    }

    #[test]
    fn test_bright_colors() {
        let (_, spans) = parse("\x1b[90mdim\x1b[0m");
        assert_eq!(spans[0].style().fg, Some(Color::BrightBlack));
        let (_, spans) = parse("\x1b[107mhl\x1b[0m");
        assert_eq!(spans[0].style().bg, Some(Color::BrightWhite));
    }

    #[test]
    fn test_normal_intensity_cancels_bold() {
        let (plain, spans) = parse("\x1b[1mA\x1b[22;31mB\x1b[0m");
        assert_eq!(plain, "AB");
        assert_eq!(spans.len(), 2);
        assert!(spans[0].style().bold);
        assert!(!spans[1].style().bold);
        assert_eq!(spans[1].style().fg, Some(Color::Red));
    }

    #[test]
    fn test_empty_sgr_is_reset() {
        let (plain, spans) = parse("\x1b[31mred\x1b[mplain");
        assert_eq!(plain, "redplain");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].range(), (0, 3));
    }

    #[test]
    fn test_unrecognized_sgr_param_ignored() {
        // Underline is not in the recognized family; the color still applies.
        let (plain, spans) = parse("\x1b[4;31munder\x1b[0m");
        assert_eq!(plain, "under");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].style().fg, Some(Color::Red));
        assert!(!spans[0].style().bold);
    }

    #[test]
    fn test_non_sgr_csi_dropped_without_style_effect() {
        let (plain, spans) = parse("\x1b[31mred\x1b[2Jstill red\x1b[0m");
        assert_eq!(plain, "redstill red");
        assert_eq!(spans, vec![StyledSpan::new(0, 12, Style {
            fg: Some(Color::Red),
            ..Style::default()
        })]);
    }

    #[test]
    fn test_overflowing_sgr_param_drops_sequence() {
        let (plain, spans) = parse("\x1b[99999999999999mtext");
        assert_eq!(plain, "text");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_osc_and_dcs_stripped() {
        let (plain, spans) = parse("a\x1b]52;c;SGVsbG8=\x07b\x1bPdata\x1b\\c");
        assert_eq!(plain, "abc");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_incomplete_escape_at_end() {
        let (plain, _) = parse("text\x1b");
        assert_eq!(plain, "text");
        let (plain, spans) = parse("text\x1b[31");
        assert_eq!(plain, "text");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_control_characters_dropped() {
        let (plain, _) = parse("a\x00b\u{009a}c\x7fd");
        assert_eq!(plain, "abcd");
        let (plain, _) = parse("keep\tthese\r\nplease");
        assert_eq!(plain, "keep\tthese\r\nplease");
    }

    #[test]
    fn test_c1_csi_equivalent_skipped_with_params() {
        let (plain, spans) = parse("Text\u{009b}31mColored");
        assert_eq!(plain, "TextColored");
        // C1 CSI is treated as hostile input and dropped whole, so the
        // color parameters do not take effect.
        assert!(spans.is_empty());
    }

    #[test]
    fn test_style_with_no_text_produces_no_span() {
        let (plain, spans) = parse("\x1b[31m\x1b[0mtext\x1b[32m");
        assert_eq!(plain, "text");
        assert!(spans.is_empty());
    }

    #[test]
    fn test_multibyte_offsets_are_bytes() {
        let (plain, spans) = parse("\x1b[31mé\x1b[0m!");
        assert_eq!(plain, "é!");
        assert_eq!(spans, vec![StyledSpan::new(0, 2, Style {
            fg: Some(Color::Red),
            ..Style::default()
        })]);
    }
}
