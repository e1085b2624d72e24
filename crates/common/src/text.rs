/// Notice appended when output is cut at the byte limit.
pub const TRUNCATION_NOTICE: &str = "\n... [output truncated]";

/// Truncate `text` to at most `max_bytes` bytes, appending a truncation
/// notice when anything was cut. The result never exceeds `max_bytes` plus
/// the notice length. Cuts land on a char boundary so the result stays
/// valid UTF-8.
pub fn truncate_with_notice(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut cut = max_bytes;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = text[..cut].to_string();
    out.push_str(TRUNCATION_NOTICE);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_untouched() {
        assert_eq!(truncate_with_notice("hello", 100), "hello");
    }

    #[test]
    fn long_text_cut_with_notice() {
        let text = "x".repeat(50);
        let out = truncate_with_notice(&text, 10);
        assert!(out.starts_with("xxxxxxxxxx"));
        assert!(out.ends_with(TRUNCATION_NOTICE));
        assert!(out.len() <= 10 + TRUNCATION_NOTICE.len());
    }

    #[test]
    fn cut_lands_on_char_boundary() {
        // "é" is two bytes; a limit of 3 falls inside the second one.
        let out = truncate_with_notice("aéé", 3);
        assert!(out.starts_with("aé"));
        assert!(out.ends_with(TRUNCATION_NOTICE));
    }

    #[test]
    fn exact_limit_is_not_truncated() {
        assert_eq!(truncate_with_notice("abcde", 5), "abcde");
    }
}
