use std::collections::HashMap;

use crate::font::FontMetrics;
use crate::types::Pt;

// Degraded-mode advance when metrics are unavailable: half the font size per
// character, the characters-per-line heuristic expressed per glyph.
const HEURISTIC_ADVANCE_PER_MILLE: i64 = 500;

/// Greedy word-atomic wrap. Lines fit `max_width` except for a single token
/// wider than the column, which is placed alone un-split. Empty input yields
/// one empty line so downstream height computation never sees zero lines.
/// Pure in (text, font, size, max_width); a metrics failure degrades to a
/// character-count estimate instead of aborting.
pub fn wrap(
    text: &str,
    font: &str,
    size: Pt,
    max_width: Pt,
    metrics: &dyn FontMetrics,
) -> Vec<String> {
    let max_width = max_width.max(Pt::from_f32(1.0));
    match wrap_measured(text, font, size, max_width, metrics) {
        Some(lines) => lines,
        None => wrap_with(text, max_width, |token| estimate_width(size, token)),
    }
}

/// Width of `text`, measured when the provider can, estimated when it
/// cannot. Drawing code uses this so centering and hot-zone math stay
/// consistent with the wrap fallback.
pub(crate) fn width_or_estimate(
    metrics: &dyn FontMetrics,
    font: &str,
    size: Pt,
    text: &str,
) -> Pt {
    metrics
        .text_width(font, size, text)
        .unwrap_or_else(|_| estimate_width(size, text))
}

fn estimate_width(size: Pt, text: &str) -> Pt {
    let units = HEURISTIC_ADVANCE_PER_MILLE * text.chars().count() as i64;
    Pt::from_milli_i64(size.to_milli_i64() * units / 1000)
}

fn wrap_measured(
    text: &str,
    font: &str,
    size: Pt,
    max_width: Pt,
    metrics: &dyn FontMetrics,
) -> Option<Vec<String>> {
    let mut widths_ok = true;
    let lines = wrap_with(text, max_width, |token| {
        match metrics.text_width(font, size, token) {
            Ok(value) => value,
            Err(_) => {
                widths_ok = false;
                Pt::ZERO
            }
        }
    });
    if widths_ok { Some(lines) } else { None }
}

fn wrap_with(text: &str, max_width: Pt, mut measure: impl FnMut(&str) -> Pt) -> Vec<String> {
    let space_width = measure(" ");
    let mut word_widths: HashMap<String, Pt> = HashMap::new();
    let mut lines = Vec::new();

    for segment in text.split('\n') {
        if segment.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        let mut current = String::new();
        let mut current_width = Pt::ZERO;
        for word in segment.split_whitespace() {
            let word_width = match word_widths.get(word) {
                Some(value) => *value,
                None => {
                    let value = measure(word);
                    word_widths.insert(word.to_string(), value);
                    value
                }
            };
            if current.is_empty() {
                if word_width > max_width {
                    // Over-wide token: alone on its own line, un-split.
                    lines.push(word.to_string());
                } else {
                    current.push_str(word);
                    current_width = word_width;
                }
            } else {
                let next_width = current_width + space_width + word_width;
                if next_width <= max_width {
                    current.push(' ');
                    current.push_str(word);
                    current_width = next_width;
                } else {
                    lines.push(std::mem::take(&mut current));
                    if word_width > max_width {
                        lines.push(word.to_string());
                        current_width = Pt::ZERO;
                    } else {
                        current.push_str(word);
                        current_width = word_width;
                    }
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
