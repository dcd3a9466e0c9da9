//! Assistant output rendering for the terminal.
//!
//! Splits text on ``` fences and alternates prose/code purely by position:
//! even segments are prose (newlines removed), odd segments are code printed
//! verbatim in color. Unbalanced fences are not repaired.

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

const FENCE: &str = "```";
const CODE_COLOR: Color = Color::Cyan;

/// Kind of a rendered segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Prose,
    Code,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub text: String,
}

/// Split `text` into alternating prose/code segments.
pub fn split_segments(text: &str) -> Vec<Segment> {
    text.split(FENCE)
        .enumerate()
        .map(|(i, part)| {
            if i % 2 == 0 {
                Segment {
                    kind: SegmentKind::Prose,
                    text: part.replace(['\r', '\n'], ""),
                }
            } else {
                Segment {
                    kind: SegmentKind::Code,
                    text: part.to_string(),
                }
            }
        })
        .collect()
}

/// Writes assistant text to a terminal-like sink.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn render<W: Write>(&self, text: &str, out: &mut W) -> io::Result<()> {
        for segment in split_segments(text) {
            match segment.kind {
                SegmentKind::Prose if segment.text.is_empty() => {}
                SegmentKind::Prose => writeln!(out, "{}", segment.text)?,
                SegmentKind::Code if self.color => {
                    queue!(
                        out,
                        SetForegroundColor(CODE_COLOR),
                        Print(&segment.text),
                        ResetColor,
                        Print("\n")
                    )?;
                }
                SegmentKind::Code => writeln!(out, "{}", segment.text)?,
            }
        }
        out.flush()
    }

    /// Print an error line, red when color is on.
    pub fn error<W: Write>(&self, message: &str, out: &mut W) -> io::Result<()> {
        if self.color {
            queue!(
                out,
                SetForegroundColor(Color::Red),
                Print(format!("Error: {message}")),
                ResetColor,
                Print("\n")
            )?;
        } else {
            writeln!(out, "Error: {message}")?;
        }
        out.flush()
    }
}
