use crate::font::FontMetrics;
use crate::surface::Surface;
use crate::types::{Pt, Rect};
use crate::wrap::width_or_estimate;

// Vertical extent fallbacks when the metrics provider cannot resolve the
// font, in per-mille of the font size.
const FALLBACK_ASCENT: i64 = 800;
const FALLBACK_DESCENT: i64 = 200;

/// A piece of text as it was actually drawn: origin, baseline, font.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RenderedText<'a> {
    pub text: &'a str,
    pub font: &'a str,
    pub size: Pt,
    pub x: Pt,
    pub baseline_y: Pt,
}

/// The clickable rectangle for a rendered link: the measured bounding box of
/// the display text, not the enclosing cell.
pub(crate) fn hot_zone(metrics: &dyn FontMetrics, rendered: &RenderedText<'_>) -> Rect {
    let width = width_or_estimate(metrics, rendered.font, rendered.size, rendered.text);
    let ascent = metrics
        .ascent(rendered.font, rendered.size)
        .unwrap_or_else(|_| per_mille(rendered.size, FALLBACK_ASCENT));
    let descent = metrics
        .descent(rendered.font, rendered.size)
        .unwrap_or_else(|_| per_mille(rendered.size, FALLBACK_DESCENT));
    Rect {
        x: rendered.x,
        y: rendered.baseline_y - descent,
        width,
        height: ascent + descent,
    }
}

pub(crate) fn register_text_link(
    surface: &mut dyn Surface,
    metrics: &dyn FontMetrics,
    url: &str,
    rendered: &RenderedText<'_>,
) {
    let zone = hot_zone(metrics, rendered);
    surface.register_link(url, zone.x, zone.y, zone.width, zone.height);
}

fn per_mille(size: Pt, units: i64) -> Pt {
    Pt::from_milli_i64(size.to_milli_i64() * units / 1000)
}
