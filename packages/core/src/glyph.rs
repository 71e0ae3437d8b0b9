//! Splitting raw generator output into a display glyph and a text label.

/// Glyph and label the generator answers with when two inputs cannot be
/// combined.
pub const FAILURE_GLYPH: &str = "❌";
pub const FAILURE_TEXT: &str = "Failed";

const ZWJ: char = '\u{200D}';

/// Split generator output into `(glyph, text)`.
///
/// The glyph is the first user-perceived symbol: one char plus any
/// variation selectors, skin-tone modifiers, keycap marks, tag sequences,
/// zero-width-joined components or a second regional indicator. The text is
/// whatever follows, with surrounding whitespace removed.
///
/// `"🔥Lava"` splits into `("🔥", "Lava")`. A single-char output such as
/// `"X"` splits into `("X", "")`; the empty label is rejected later by item
/// validation.
pub fn split_glyph(raw: &str) -> (String, String) {
    let trimmed = raw.trim();
    let mut chars = trimmed.char_indices().peekable();

    let Some((_, first)) = chars.next() else {
        return (String::new(), String::new());
    };

    let mut end = first.len_utf8();
    let mut joined = false;

    if is_regional_indicator(first)
        && let Some(&(idx, next)) = chars.peek()
        && is_regional_indicator(next)
    {
        end = idx + next.len_utf8();
        chars.next();
    }

    while let Some(&(idx, c)) = chars.peek() {
        if joined || is_modifier(c) {
            joined = false;
        } else if c == ZWJ {
            joined = true;
        } else {
            break;
        }
        end = idx + c.len_utf8();
        chars.next();
    }

    let glyph = trimmed[..end].to_string();
    let text = trimmed[end..].trim().to_string();
    (glyph, text)
}

/// Check whether a split result is the generator's "cannot combine" answer.
pub fn is_failure_sentinel(glyph: &str, text: &str) -> bool {
    glyph.trim_end_matches('\u{FE0F}') == FAILURE_GLYPH
        && (text.is_empty() || text.eq_ignore_ascii_case(FAILURE_TEXT))
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_modifier(c: char) -> bool {
    matches!(c,
        '\u{FE0E}' | '\u{FE0F}'
        | '\u{20E3}'
        | '\u{1F3FB}'..='\u{1F3FF}'
        | '\u{E0020}'..='\u{E007F}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(raw: &str) -> (String, String) {
        split_glyph(raw)
    }

    #[test]
    fn splits_emoji_prefixed_text() {
        assert_eq!(split("🔥Lava"), ("🔥".into(), "Lava".into()));
        assert_eq!(split("💨 Steam"), ("💨".into(), "Steam".into()));
        assert_eq!(split("  🌋 Molten Rock \n"), ("🌋".into(), "Molten Rock".into()));
    }

    #[test]
    fn single_char_output_has_empty_text() {
        assert_eq!(split("X"), ("X".into(), "".into()));
        assert_eq!(split("🔥"), ("🔥".into(), "".into()));
    }

    #[test]
    fn empty_output() {
        assert_eq!(split(""), ("".into(), "".into()));
        assert_eq!(split("   "), ("".into(), "".into()));
    }

    #[test]
    fn keeps_variation_selector_with_glyph() {
        assert_eq!(split("🌬️Wind"), ("🌬️".into(), "Wind".into()));
        assert_eq!(split("❄️ Snow"), ("❄️".into(), "Snow".into()));
    }

    #[test]
    fn keeps_zwj_sequence_and_skin_tone_with_glyph() {
        assert_eq!(split("👩‍🚀Astronaut"), ("👩‍🚀".into(), "Astronaut".into()));
        assert_eq!(split("👍🏽Approval"), ("👍🏽".into(), "Approval".into()));
        assert_eq!(
            split("🏳️‍🌈 Rainbow Flag"),
            ("🏳️‍🌈".into(), "Rainbow Flag".into())
        );
    }

    #[test]
    fn keeps_flag_pair_together() {
        assert_eq!(split("🇯🇵Japan"), ("🇯🇵".into(), "Japan".into()));
    }

    #[test]
    fn plain_text_splits_on_first_char() {
        assert_eq!(split("Lava"), ("L".into(), "ava".into()));
    }

    #[test]
    fn recognizes_failure_sentinel() {
        let (glyph, text) = split("❌ Failed");
        assert!(is_failure_sentinel(&glyph, &text));
        let (glyph, text) = split("❌");
        assert!(is_failure_sentinel(&glyph, &text));
        let (glyph, text) = split("💨 Steam");
        assert!(!is_failure_sentinel(&glyph, &text));
    }

    #[test]
    fn failed_label_needs_the_cross_glyph() {
        let (glyph, text) = split("💥 Failed");
        assert!(!is_failure_sentinel(&glyph, &text));
        let (glyph, text) = split("\u{274C}\u{FE0F}Failed");
        assert!(is_failure_sentinel(&glyph, &text));
        let (glyph, text) = split("❌ Fire");
        assert!(!is_failure_sentinel(&glyph, &text));
    }
}
