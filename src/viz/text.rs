//! Text fitting for axis labels and chart titles.
//!
//! Plotters cannot measure text before drawing it, so widths are estimated from
//! the character count.

/// Rough pixel width of `text` at `font_px`.
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    ((text.chars().count() as f32) * (font_px as f32) * 0.60).ceil() as u32
}

/// Shorten `text` so it fits `max_px`, ending in `…` when anything was cut.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut kept: Vec<char> = text.chars().collect();
    while !kept.is_empty() {
        kept.pop();
        let candidate: String = kept.iter().chain(std::iter::once(&'…')).collect();
        if estimate_text_width_px(&candidate, font_px) <= max_px {
            return candidate;
        }
    }
    String::new()
}

/// Break `text` into lines no wider than `max_px`, splitting on spaces.
/// A single word wider than the limit is truncated rather than split.
pub fn wrap_text_to_width(text: &str, font_px: u32, max_px: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut cur = String::new();
    for word in text.split_whitespace() {
        let candidate = if cur.is_empty() {
            word.to_string()
        } else {
            format!("{cur} {word}")
        };
        if estimate_text_width_px(&candidate, font_px) <= max_px {
            cur = candidate;
            continue;
        }
        if !cur.is_empty() {
            lines.push(std::mem::take(&mut cur));
        }
        cur = truncate_to_width(word, font_px, max_px);
    }
    if !cur.is_empty() {
        lines.push(cur);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_adds_ellipsis() {
        assert_eq!(truncate_to_width("Chad", 10, 100), "Chad");
        let t = truncate_to_width("Democratic Republic of the Congo", 10, 60);
        assert!(t.ends_with('…'));
        assert!(estimate_text_width_px(&t, 10) <= 60);
    }

    #[test]
    fn wrapping_respects_width() {
        let lines = wrap_text_to_width("Average prevalence of raised BP by country", 10, 120);
        assert!(lines.len() > 1);
        for l in &lines {
            assert!(estimate_text_width_px(l, 10) <= 120, "{l}");
        }
    }
}
