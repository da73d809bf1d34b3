//! Emoji removal over the standard pictographic Unicode blocks.

/// Emoticons, pictographs, transport, flags, misc symbols, dingbats and the
/// supplemental symbol blocks.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x1F600, 0x1F64F),
    (0x1F300, 0x1F5FF),
    (0x1F680, 0x1F6FF),
    (0x1F1E0, 0x1F1FF),
    (0x2600, 0x26FF),
    (0x2700, 0x27BF),
    (0x1F900, 0x1F9FF),
    (0x1FA70, 0x1FAFF),
];

fn is_emoji(c: char) -> bool {
    let code = c as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(start, end)| (start..=end).contains(&code))
}

pub fn remove_emojis(text: &str) -> String {
    text.chars().filter(|&c| !is_emoji(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_common_emojis() {
        assert_eq!(remove_emojis("Great job 😀🚀✅!"), "Great job !");
    }

    #[test]
    fn test_strips_flags_and_supplemental_symbols() {
        assert_eq!(remove_emojis("🇰🇷 team 🥳🪀"), " team ");
    }

    #[test]
    fn test_keeps_hangul_and_punctuation() {
        let text = "잘했어요! (score: 85%) — ok";
        assert_eq!(remove_emojis(text), text);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(remove_emojis(""), "");
    }
}
