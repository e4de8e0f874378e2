//! Line breaking for text elements.
//!
//! Widths are estimated from an average glyph advance; the SVG backend
//! anchors each line by alignment, so estimation error only affects where
//! lines break, never how they are aligned.

use postcraft_core::markup::Span;

/// Average glyph advance as a fraction of the font size.
pub const AVERAGE_ADVANCE: f32 = 0.55;

/// Metrics used to measure runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Font size in px.
    pub font_size: f32,
    /// Extra spacing after each glyph in px.
    pub letter_spacing: f32,
}

impl TextMetrics {
    /// Estimated advance of `text`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn measure(&self, text: &str) -> f32 {
        let glyphs = text.chars().count() as f32;
        glyphs * (self.font_size * AVERAGE_ADVANCE + self.letter_spacing)
    }
}

/// One laid-out line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    /// Runs in reading order; adjacent runs differ in emphasis.
    pub runs: Vec<Span>,
    /// Estimated width in px.
    pub width: f32,
}

impl TextLine {
    fn push(&mut self, text: &str, accent: bool, width: f32) {
        self.width += width;
        match self.runs.last_mut() {
            Some(last) if last.accent == accent => last.text.push_str(text),
            _ => self.runs.push(Span {
                text: text.to_string(),
                accent,
            }),
        }
    }

    /// Line text without emphasis.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug)]
enum Token {
    Word {
        text: String,
        accent: bool,
        // No whitespace separates it from the previous word.
        joined: bool,
    },
    Break,
}

fn tokenize(spans: &[Span]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pending_space = false;

    for span in spans {
        let mut word = String::new();
        let flush = |word: &mut String, tokens: &mut Vec<Token>, pending: &mut bool| {
            if !word.is_empty() {
                tokens.push(Token::Word {
                    text: std::mem::take(word),
                    accent: span.accent,
                    joined: !*pending,
                });
                *pending = false;
            }
        };
        for ch in span.text.chars() {
            if ch == '\n' {
                flush(&mut word, &mut tokens, &mut pending_space);
                tokens.push(Token::Break);
                pending_space = false;
            } else if ch.is_whitespace() {
                flush(&mut word, &mut tokens, &mut pending_space);
                pending_space = true;
            } else {
                word.push(ch);
            }
        }
        flush(&mut word, &mut tokens, &mut pending_space);
    }
    tokens
}

/// Break spans into lines no wider than `max_width` where possible.
///
/// Explicit newlines always break. A single word wider than the box
/// overflows rather than being split.
#[must_use]
pub fn layout(spans: &[Span], metrics: TextMetrics, max_width: f32) -> Vec<TextLine> {
    let space = metrics.measure(" ");
    let mut lines = Vec::new();
    let mut line = TextLine::default();

    for token in tokenize(spans) {
        match token {
            Token::Break => lines.push(std::mem::take(&mut line)),
            Token::Word {
                text,
                accent,
                joined,
            } => {
                let width = metrics.measure(&text);
                if line.runs.is_empty() || joined {
                    line.push(&text, accent, width);
                } else if line.width + space + width > max_width {
                    lines.push(std::mem::take(&mut line));
                    line.push(&text, accent, width);
                } else {
                    // A separating space is accented only between two accented words.
                    let prev = line.runs.last().is_some_and(|r| r.accent);
                    line.push(" ", prev && accent, space);
                    line.push(&text, accent, width);
                }
            }
        }
    }
    lines.push(line);
    lines
}
