use crate::paint::Color;

/// A run of text drawn in one color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    pub text: String,
    pub color: Color,
}

/// Splits `text` on inline color tags.
///
/// Recognised tags are `{#RRGGBB}` (opaque) and `{#AARRGGBB}`: exactly six
/// or eight hex digits between `{#` and `}`. A tag switches the color of
/// everything after it and is removed from the output. Anything else,
/// including truncated or malformed tags, is kept as literal text.
///
/// Never returns empty segments; an empty or tag-only input yields an empty
/// vector.
pub fn preprocess_text(text: &str, default_color: Color) -> Vec<TextSegment> {
    let mut segments = Vec::new();
    let mut color = default_color;
    let mut run_start = 0;
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        if let Some((tag_color, tag_len)) = parse_color_tag(rest) {
            push_segment(&mut segments, &text[run_start..i], color);
            color = tag_color;
            i += tag_len;
            run_start = i;
            continue;
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }
    push_segment(&mut segments, &text[run_start..], color);

    segments
}

/// Concatenation of all segment texts, i.e. `text` without its color tags.
pub(crate) fn strip_markup(text: &str) -> String {
    preprocess_text(text, Color::default()).into_iter().map(|s| s.text).collect()
}

fn push_segment(segments: &mut Vec<TextSegment>, text: &str, color: Color) {
    if !text.is_empty() {
        segments.push(TextSegment { text: text.to_owned(), color });
    }
}

/// Parses a tag at the start of `s`, returning its color and byte length.
fn parse_color_tag(s: &str) -> Option<(Color, usize)> {
    let body = s.strip_prefix("{#")?;
    let digits = body.bytes().take(9).take_while(u8::is_ascii_hexdigit).count();
    if digits != 6 && digits != 8 {
        return None;
    }
    if body.as_bytes().get(digits) != Some(&b'}') {
        return None;
    }

    let value = u32::from_str_radix(&body[..digits], 16).ok()?;
    let argb = if digits == 6 { 0xFF00_0000 | value } else { value };
    Some((Color::from_argb(argb), digits + 3))
}
