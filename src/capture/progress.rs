//! Capture progress lines
//!
//! The capture binary reports progress as free-form text; the only structure
//! we rely on is the `frame #<N>` token.

use once_cell::sync::Lazy;
use regex::Regex;

static FRAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // Literal pattern, cannot fail to compile
    Regex::new(r"frame\s#(\d+)").expect("frame pattern is valid")
});

/// One line of subprocess output and the frame index it reports, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureProgressEvent {
    pub raw_line: String,
    pub parsed_frame_number: Option<u64>,
}

impl CaptureProgressEvent {
    /// Build an event from a raw output line (trailing whitespace removed)
    pub fn from_line(line: &str) -> Self {
        let raw_line = line.trim().to_string();
        let parsed_frame_number = parse_frame_number(&raw_line);
        Self {
            raw_line,
            parsed_frame_number,
        }
    }

    /// Whether this event reports a frame strictly beyond `frame_target`
    pub fn exceeds(&self, frame_target: u64) -> bool {
        self.parsed_frame_number
            .is_some_and(|frame| frame > frame_target)
    }
}

/// Extract the frame index from a `frame #<digits>` token
///
/// Digit runs too long for a `u64` are treated as no frame at all.
pub fn parse_frame_number(line: &str) -> Option<u64> {
    let captures = FRAME_PATTERN.captures(line)?;
    let digits = captures.get(1)?.as_str();
    match digits.parse::<u64>() {
        Ok(frame) => Some(frame),
        Err(e) => {
            warn!("Ignoring unparseable frame index '{}': {}", digits, e);
            None
        }
    }
}
