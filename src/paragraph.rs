use crate::error::LayoutError;
use crate::paginate::Cursor;
use crate::table::RenderSession;
use crate::types::{Color, Pt};
use crate::wrap::wrap;

/// Style for free text drawn outside tables.
#[derive(Debug, Clone)]
pub struct ParagraphStyle {
    pub font: String,
    pub size: Pt,
    pub color: Color,
    pub line_spacing: Pt,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            font: "Helvetica".to_string(),
            size: Pt::from_f32(10.0),
            color: Color::BLACK,
            line_spacing: Pt::from_f32(12.0),
        }
    }
}

/// Wrapped free-text block with the table engine's cursor and page-break
/// discipline, minus headers and the continuation note. Paragraphs may
/// split between lines at a page break.
pub(crate) fn render_paragraph(
    session: &mut RenderSession<'_>,
    text: &str,
    style: &ParagraphStyle,
    x: Pt,
    width: Pt,
    start_y: Pt,
) -> Result<Pt, LayoutError> {
    let geometry = *session.geometry;
    let lines = wrap(text, &style.font, style.size, width, session.metrics);
    let mut cursor = Cursor {
        page: 1,
        y: start_y.min(geometry.top_y()),
    };

    for line in &lines {
        if cursor.y - style.line_spacing < geometry.bottom_margin() {
            if let Some(logger) = session.debug {
                logger.log_page_break(cursor.page, cursor.page + 1, "paragraph_overflow");
            }
            session.surface.start_new_page();
            cursor.page += 1;
            cursor.y = geometry.top_y();
        }
        let baseline = cursor.y - style.line_spacing + (style.line_spacing - style.size) / 2;
        if !line.is_empty() {
            session.surface.set_fill_color(style.color);
            session
                .surface
                .draw_text(x, baseline, line, &style.font, style.size);
        }
        cursor.y -= style.line_spacing;
    }

    Ok(cursor.y)
}
