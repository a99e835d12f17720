//! Minecraft `§` colour codes in item display names.
//!
//! Names such as `§6Golden §fApple` switch colour mid-string. The table keeps
//! the raw names; these helpers split or strip the codes for display and logs.

const SECTION_SIGN: char = '§';

/// Colour used before the first code in a name.
pub const DEFAULT_COLOR: &str = "#FFFFFF";

/// A run of text drawn in one colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSegment {
    pub color: &'static str,
    pub text: String,
}

/// Hex colour for a Minecraft colour code digit.
pub fn color_for_code(code: char) -> Option<&'static str> {
    let color = match code.to_ascii_lowercase() {
        '0' => "#000000",
        '1' => "#0000AA",
        '2' => "#00AA00",
        '3' => "#00AAAA",
        '4' => "#AA0000",
        '5' => "#AA00AA",
        '6' => "#FFAA00",
        '7' => "#AAAAAA",
        '8' => "#555555",
        '9' => "#5555FF",
        'a' => "#55FF55",
        'b' => "#55FFFF",
        'c' => "#FF5555",
        'd' => "#FF55FF",
        'e' => "#FFFF55",
        'f' => "#FFFFFF",
        _ => return None,
    };
    Some(color)
}

/// Splits a raw name into coloured runs. Empty runs are dropped.
pub fn color_segments(raw: &str) -> Vec<NameSegment> {
    let mut segments = Vec::new();
    let mut color = DEFAULT_COLOR;
    let mut text = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == SECTION_SIGN {
            if let Some(next_color) = chars.peek().copied().and_then(color_for_code) {
                chars.next();
                if !text.is_empty() {
                    segments.push(NameSegment {
                        color,
                        text: std::mem::take(&mut text),
                    });
                }
                color = next_color;
                continue;
            }
        }
        text.push(ch);
    }

    if !text.is_empty() {
        segments.push(NameSegment { color, text });
    }
    segments
}

/// The name with every colour code removed.
pub fn strip_formatting(raw: &str) -> String {
    color_segments(raw).into_iter().map(|s| s.text).collect()
}
