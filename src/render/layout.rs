//! Greedy word wrapping against measured glyph widths.

use super::font::TextRenderer;

/// One wrapped line and its measured size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedLine {
    pub text: String,
    pub width: u32,
    pub height: u32,
}

/// Caption broken into lines that fit a width budget.
///
/// Always holds at least one line; an empty caption yields a single empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedText {
    pub lines: Vec<WrappedLine>,
}

impl WrappedText {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Tallest measured line, used as the uniform line height of a text block.
    pub fn max_line_height(&self) -> u32 {
        self.lines.iter().map(|line| line.height).max().unwrap_or(0)
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }

    /// Every word across all lines, in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.texts().flat_map(str::split_whitespace)
    }
}

/// Wrap `caption` so each line measures at most `max_width` pixels with `font`.
///
/// Words are never split: a word wider than `max_width` sits alone on its own
/// line. Whitespace runs collapse to single spaces.
pub fn wrap<R>(caption: &str, font: &R, max_width: i64) -> WrappedText
where
    R: TextRenderer + ?Sized,
{
    let measured = |text: String| {
        let (width, height) = font.measure(&text);
        WrappedLine {
            text,
            width,
            height,
        }
    };

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in caption.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        let (candidate_width, _) = font.measure(&candidate);
        if i64::from(candidate_width) <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(measured(std::mem::take(&mut current)));
            }
            current = word.to_string();
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(measured(current));
    }

    tracing::debug!(
        "Wrapped {} chars into {} line(s) at max width {}",
        caption.len(),
        lines.len(),
        max_width
    );

    WrappedText { lines }
}
