use crate::debug::{DebugLogger, layout_debug_enabled};
use crate::error::LayoutError;
use crate::font::FontMetrics;
use crate::links::{RenderedText, register_text_link};
use crate::paginate::{PageFlow, PageGeometry, RenderPhase};
use crate::surface::Surface;
use crate::types::{Color, Pt};
use crate::wrap::{width_or_estimate, wrap};

pub(crate) const CONTINUATION_NOTE: &str = "Continued on next page...";

/// One table entry. Numeric cells are center-aligned by convention; link
/// cells draw their display text in the link color and register a hot-zone.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Link { text: String, url: String },
    Numeric(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Cell::Link {
            text: text.into(),
            url: url.into(),
        }
    }

    /// Numeric cells accept anything displayable; the value is coerced to
    /// its string form once, on construction.
    pub fn numeric(value: impl ToString) -> Self {
        Cell::Numeric(value.to_string())
    }

    pub fn display_text(&self) -> &str {
        match self {
            Cell::Text(text) => text,
            Cell::Link { text, .. } => text,
            Cell::Numeric(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: texts.into_iter().map(|t| Cell::Text(t.into())).collect(),
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

#[derive(Debug, Clone)]
pub struct TableStyle {
    pub header_background: Color,
    pub alt_row_background: Color,
    pub grid_color: Color,
    pub title_color: Color,
    pub header_text_color: Color,
    pub body_text_color: Color,
    pub link_color: Color,
    pub title_font: String,
    pub header_font: String,
    pub body_font: String,
    pub title_size: Pt,
    pub header_size: Pt,
    pub body_size: Pt,
    pub line_spacing: Pt,
    pub cell_padding: Pt,
    pub text_inset: Pt,
    pub min_row_height: Pt,
    pub min_header_height: Pt,
    pub title_height: Pt,
    pub repeat_title_on_continuation: bool,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header_background: Color::rgb(0.16, 0.26, 0.38),
            alt_row_background: Color::rgb(0.93, 0.95, 0.97),
            grid_color: Color::rgb(0.62, 0.62, 0.62),
            title_color: Color::WHITE,
            header_text_color: Color::WHITE,
            body_text_color: Color::BLACK,
            link_color: Color::rgb(0.05, 0.25, 0.63),
            title_font: "Helvetica-Bold".to_string(),
            header_font: "Helvetica-Bold".to_string(),
            body_font: "Helvetica".to_string(),
            title_size: Pt::from_f32(12.0),
            header_size: Pt::from_f32(9.0),
            body_size: Pt::from_f32(8.0),
            line_spacing: Pt::from_f32(10.0),
            cell_padding: Pt::from_f32(6.0),
            text_inset: Pt::from_f32(4.0),
            min_row_height: Pt::from_f32(16.0),
            min_header_height: Pt::from_f32(18.0),
            title_height: Pt::from_f32(20.0),
            repeat_title_on_continuation: false,
        }
    }
}

/// Everything one table render needs: headers, rows, per-column widths, and
/// style. Immutable once handed to the engine; the engine borrows it.
#[derive(Debug, Clone)]
pub struct TableSpec {
    title: Option<String>,
    headers: Vec<String>,
    rows: Vec<Row>,
    column_widths: Vec<Pt>,
    style: TableStyle,
}

impl TableSpec {
    pub fn new<I, S>(headers: I, column_widths: Vec<Pt>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: None,
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            column_widths,
            style: TableStyle::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_widths(&self) -> &[Pt] {
        &self.column_widths
    }

    pub fn style(&self) -> &TableStyle {
        &self.style
    }

    /// The table width every row and header shares: the sum of the column
    /// widths.
    pub fn table_width(&self) -> Pt {
        self.column_widths.iter().sum()
    }

    pub(crate) fn validate(&self) -> Result<(), LayoutError> {
        if self.headers.is_empty() {
            return Err(LayoutError::InvalidSpec(
                "table must have at least one column".to_string(),
            ));
        }
        if self.column_widths.len() != self.headers.len() {
            return Err(LayoutError::InvalidSpec(format!(
                "{} column widths for {} headers",
                self.column_widths.len(),
                self.headers.len()
            )));
        }
        if let Some(width) = self.column_widths.iter().find(|w| !w.is_positive()) {
            return Err(LayoutError::InvalidSpec(format!(
                "column width {:.1}pt is not positive",
                width.to_f32()
            )));
        }
        for (index, row) in self.rows.iter().enumerate() {
            if row.cells().len() != self.headers.len() {
                return Err(LayoutError::InvalidSpec(format!(
                    "row {} has {} cells, table has {} columns",
                    index,
                    row.cells().len(),
                    self.headers.len()
                )));
            }
        }
        Ok(())
    }
}

/// One row after measurement: its vertical extent and the wrapped lines per
/// cell. Lives for the duration of one row render.
pub(crate) struct MeasuredRow {
    pub height: Pt,
    pub cell_lines: Vec<Vec<String>>,
}

/// Row height rule: the tallest cell decides. Recomputed per row; cell
/// content differs even though column widths are table-wide constants.
pub(crate) fn measure_cells(
    texts: &[&str],
    column_widths: &[Pt],
    font: &str,
    size: Pt,
    min_height: Pt,
    style: &TableStyle,
    metrics: &dyn FontMetrics,
) -> MeasuredRow {
    let mut cell_lines = Vec::with_capacity(texts.len());
    let mut max_line_count = 1usize;
    for (text, width) in texts.iter().zip(column_widths) {
        let wrap_width = (*width - style.text_inset * 2).max(Pt::from_f32(1.0));
        let lines = wrap(text, font, size, wrap_width, metrics);
        max_line_count = max_line_count.max(lines.len());
        cell_lines.push(lines);
    }
    let height = (style.line_spacing * max_line_count as i32 + style.cell_padding).max(min_height);
    MeasuredRow { height, cell_lines }
}

fn measure_row(
    row: &Row,
    spec: &TableSpec,
    metrics: &dyn FontMetrics,
) -> MeasuredRow {
    let texts: Vec<&str> = row.cells().iter().map(Cell::display_text).collect();
    let style = spec.style();
    measure_cells(
        &texts,
        spec.column_widths(),
        &style.body_font,
        style.body_size,
        style.min_row_height,
        style,
        metrics,
    )
}

fn measure_header(spec: &TableSpec, metrics: &dyn FontMetrics) -> MeasuredRow {
    let texts: Vec<&str> = spec.headers().iter().map(String::as_str).collect();
    let style = spec.style();
    measure_cells(
        &texts,
        spec.column_widths(),
        &style.header_font,
        style.header_size,
        style.min_header_height,
        style,
        metrics,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellAlign {
    Left,
    Center,
}

/// Borrowed collaborators for one render call, passed explicitly through the
/// layout functions.
pub(crate) struct RenderSession<'a> {
    pub surface: &'a mut dyn Surface,
    pub metrics: &'a dyn FontMetrics,
    pub geometry: &'a PageGeometry,
    pub debug: Option<&'a DebugLogger>,
}

/// Renders the whole table, breaking pages as needed, and returns the final
/// cursor Y so the caller can stack more content beneath.
pub(crate) fn render_table(
    session: &mut RenderSession<'_>,
    spec: &TableSpec,
    start_x: Pt,
    start_y: Pt,
) -> Result<Pt, LayoutError> {
    spec.validate()?;
    let style = spec.style();
    let mut flow = PageFlow::new(session.geometry, start_y, session.debug);
    let mut title_drawn = false;
    flow.begin();

    loop {
        match flow.phase() {
            RenderPhase::Idle => unreachable!("render loop starts after begin()"),
            RenderPhase::HeaderPending => {
                let show_title = spec.title().is_some()
                    && (!title_drawn || style.repeat_title_on_continuation);
                let header = measure_header(spec, session.metrics);
                let title_height = if show_title {
                    style.title_height
                } else {
                    Pt::ZERO
                };
                let block = header.height + title_height;
                // A low start cursor (content stacked above) may leave no
                // room for the header block; break before drawing anything.
                if !flow.fits(block) && flow.cursor.y < session.geometry.top_y() {
                    flow.request_page_break("header_block_does_not_fit");
                    continue;
                }
                let mut y = flow.cursor.y;
                if show_title {
                    draw_title_bar(session, spec, start_x, y);
                    title_drawn = true;
                    y -= style.title_height;
                }
                draw_header_row(session, spec, &header, start_x, y);
                flow.headers_emitted(block);
            }
            RenderPhase::BodyRendering => {
                if flow.state.next_row_index >= spec.rows().len() {
                    flow.complete();
                    continue;
                }
                let row = &spec.rows()[flow.state.next_row_index];
                let measured = measure_row(row, spec, session.metrics);
                if !flow.fits(measured.height) && !flow.must_force_place() {
                    flow.request_page_break("row_does_not_fit");
                    continue;
                }
                draw_body_row(
                    session,
                    spec,
                    flow.state.next_row_index,
                    row,
                    &measured,
                    start_x,
                    flow.cursor.y,
                );
                flow.row_placed(measured.height);
            }
            RenderPhase::PageBreak => {
                if flow.state.headers_emitted_on_current_page {
                    draw_continuation_note(session, style, start_x);
                }
                session.surface.start_new_page();
                flow.page_started();
            }
            RenderPhase::Done => break,
        }
    }

    if layout_debug_enabled() {
        eprintln!(
            "[tableflow.debug] table rendered rows={} pages={} final_y_pt={:.3}",
            flow.state.rows_rendered_so_far,
            flow.cursor.page,
            flow.cursor.y.to_f32()
        );
    }
    if let Some(logger) = session.debug {
        logger.increment("layout.table.rendered", 1);
        logger.increment("layout.rows.rendered", flow.state.rows_rendered_so_far as u64);
    }

    Ok(flow.cursor.y)
}

fn draw_title_bar(session: &mut RenderSession<'_>, spec: &TableSpec, x: Pt, y_top: Pt) {
    let style = spec.style();
    let Some(title) = spec.title() else {
        return;
    };
    session.surface.set_fill_color(style.header_background);
    session.surface.draw_rect(
        x,
        y_top - style.title_height,
        spec.table_width(),
        style.title_height,
        true,
        false,
    );
    let baseline = y_top - style.title_height + (style.title_height - style.title_size) / 2;
    session.surface.set_fill_color(style.title_color);
    session.surface.draw_text(
        x + style.text_inset,
        baseline,
        title,
        &style.title_font,
        style.title_size,
    );
}

fn draw_header_row(
    session: &mut RenderSession<'_>,
    spec: &TableSpec,
    header: &MeasuredRow,
    x: Pt,
    y_top: Pt,
) {
    let style = spec.style();
    session.surface.set_stroke_color(style.grid_color);
    session.surface.set_fill_color(style.header_background);
    let mut cell_x = x;
    for width in spec.column_widths() {
        session.surface.draw_rect(
            cell_x,
            y_top - header.height,
            *width,
            header.height,
            true,
            true,
        );
        cell_x += *width;
    }
    let mut cell_x = x;
    for (lines, width) in header.cell_lines.iter().zip(spec.column_widths()) {
        draw_cell_lines(
            session,
            lines,
            &style.header_font,
            style.header_size,
            style.header_text_color,
            cell_x,
            *width,
            y_top,
            header.height,
            style.line_spacing,
            style.text_inset,
            CellAlign::Center,
            None,
        );
        cell_x += *width;
    }
}

fn draw_body_row(
    session: &mut RenderSession<'_>,
    spec: &TableSpec,
    row_index: usize,
    row: &Row,
    measured: &MeasuredRow,
    x: Pt,
    y_top: Pt,
) {
    let style = spec.style();
    if row_index % 2 == 1 {
        session.surface.set_fill_color(style.alt_row_background);
        session.surface.draw_rect(
            x,
            y_top - measured.height,
            spec.table_width(),
            measured.height,
            true,
            false,
        );
    }

    session.surface.set_stroke_color(style.grid_color);
    let mut cell_x = x;
    for width in spec.column_widths() {
        session.surface.draw_rect(
            cell_x,
            y_top - measured.height,
            *width,
            measured.height,
            false,
            true,
        );
        cell_x += *width;
    }

    let mut cell_x = x;
    for ((cell, lines), width) in row
        .cells()
        .iter()
        .zip(&measured.cell_lines)
        .zip(spec.column_widths())
    {
        let (color, align) = match cell {
            Cell::Text(_) => (style.body_text_color, CellAlign::Left),
            Cell::Numeric(_) => (style.body_text_color, CellAlign::Center),
            Cell::Link { .. } => (style.link_color, CellAlign::Left),
        };
        let link_url = match cell {
            Cell::Link { url, .. } => Some(url.as_str()),
            _ => None,
        };
        draw_cell_lines(
            session,
            lines,
            &style.body_font,
            style.body_size,
            color,
            cell_x,
            *width,
            y_top,
            measured.height,
            style.line_spacing,
            style.text_inset,
            align,
            link_url,
        );
        cell_x += *width;
    }
}

/// Draws a cell's wrapped lines, vertically centering the block within the
/// row. For link cells the first rendered line also becomes the hot-zone.
fn draw_cell_lines(
    session: &mut RenderSession<'_>,
    lines: &[String],
    font: &str,
    size: Pt,
    color: Color,
    cell_x: Pt,
    col_width: Pt,
    row_top: Pt,
    row_height: Pt,
    line_spacing: Pt,
    inset: Pt,
    align: CellAlign,
    link_url: Option<&str>,
) {
    let block_height = line_spacing * lines.len() as i32;
    let top_offset = ((row_height - block_height) / 2).max(Pt::ZERO);
    session.surface.set_fill_color(color);

    for (index, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let baseline = row_top - top_offset - line_spacing * (index as i32 + 1)
            + (line_spacing - size) / 2;
        let text_x = match align {
            CellAlign::Left => cell_x + inset,
            CellAlign::Center => {
                let line_width = width_or_estimate(session.metrics, font, size, line);
                (cell_x + (col_width - line_width) / 2).max(cell_x + inset)
            }
        };
        session.surface.draw_text(text_x, baseline, line, font, size);
        if index == 0 {
            if let Some(url) = link_url {
                let rendered = RenderedText {
                    text: line,
                    font,
                    size,
                    x: text_x,
                    baseline_y: baseline,
                };
                register_text_link(session.surface, session.metrics, url, &rendered);
            }
        }
    }
}

fn draw_continuation_note(session: &mut RenderSession<'_>, style: &TableStyle, x: Pt) {
    let y = (session.geometry.bottom_margin() - style.line_spacing).max(Pt::ZERO);
    session.surface.set_fill_color(style.body_text_color);
    session
        .surface
        .draw_text(x, y, CONTINUATION_NOTE, &style.body_font, style.body_size);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FixedMetrics;

    fn widths(values: &[f32]) -> Vec<Pt> {
        values.iter().map(|v| Pt::from_f32(*v)).collect()
    }

    #[test]
    fn numeric_cells_coerce_values_to_strings() {
        assert_eq!(Cell::numeric(42).display_text(), "42");
        assert_eq!(Cell::numeric(3.5).display_text(), "3.5");
        assert_eq!(Cell::numeric("7").display_text(), "7");
    }

    #[test]
    fn link_cells_expose_display_text_only() {
        let cell = Cell::link("view", "https://maps.example/route/1");
        assert_eq!(cell.display_text(), "view");
    }

    #[test]
    fn table_width_is_the_sum_of_column_widths() {
        let spec = TableSpec::new(["A", "B"], widths(&[100.0, 150.0]));
        assert_eq!(spec.table_width().to_milli_i64(), 250_000);
    }

    #[test]
    fn validate_rejects_width_count_mismatch() {
        let spec = TableSpec::new(["A", "B"], widths(&[100.0]));
        assert!(matches!(
            spec.validate(),
            Err(LayoutError::InvalidSpec(_))
        ));
    }

    #[test]
    fn validate_rejects_non_positive_column_width() {
        let spec = TableSpec::new(["A", "B"], widths(&[100.0, 0.0]));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn validate_rejects_short_rows() {
        let mut spec = TableSpec::new(["A", "B"], widths(&[100.0, 100.0]));
        spec.add_row(Row::from_texts(["only one"]));
        let err = spec.validate().unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn validate_accepts_a_well_formed_spec() {
        let mut spec = TableSpec::new(["A", "B"], widths(&[100.0, 100.0]));
        spec.add_row(Row::from_texts(["x", "y"]));
        spec.add_row(Row::new(vec![Cell::numeric(1), Cell::link("v", "https://e.com")]));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn single_line_row_gets_the_minimum_height() {
        let style = TableStyle::default();
        let metrics = FixedMetrics::default();
        let measured = measure_cells(
            &["x", "y"],
            &widths(&[100.0, 100.0]),
            &style.body_font,
            style.body_size,
            style.min_row_height,
            &style,
            &metrics,
        );
        assert_eq!(
            measured.height.to_milli_i64(),
            style.min_row_height.to_milli_i64()
        );
        assert_eq!(measured.cell_lines.len(), 2);
        assert_eq!(measured.cell_lines[0], vec!["x"]);
    }

    #[test]
    fn tallest_cell_decides_the_row_height() {
        let style = TableStyle::default();
        let metrics = FixedMetrics::default();
        // 4pt per char at body size 8; 50pt column minus insets wraps tightly.
        let long = "alpha beta gamma delta epsilon zeta";
        let measured = measure_cells(
            &[long, "y"],
            &widths(&[50.0, 100.0]),
            &style.body_font,
            style.body_size,
            style.min_row_height,
            &style,
            &metrics,
        );
        let line_count = measured.cell_lines[0].len() as i32;
        assert!(line_count > 1);
        let expected = style.line_spacing * line_count + style.cell_padding;
        assert_eq!(measured.height.to_milli_i64(), expected.to_milli_i64());
    }

    #[test]
    fn row_height_is_monotone_in_text_length() {
        let style = TableStyle::default();
        let metrics = FixedMetrics::default();
        let cols = widths(&[80.0, 80.0]);
        let mut text = String::new();
        let mut previous = Pt::ZERO;
        for _ in 0..12 {
            text.push_str("word ");
            let measured = measure_cells(
                &[text.trim(), "fixed"],
                &cols,
                &style.body_font,
                style.body_size,
                style.min_row_height,
                &style,
                &metrics,
            );
            assert!(measured.height >= previous);
            previous = measured.height;
        }
    }

    #[test]
    fn empty_cell_still_counts_one_line() {
        let style = TableStyle::default();
        let metrics = FixedMetrics::default();
        let measured = measure_cells(
            &["", ""],
            &widths(&[100.0, 100.0]),
            &style.body_font,
            style.body_size,
            style.min_row_height,
            &style,
            &metrics,
        );
        assert_eq!(measured.cell_lines[0].len(), 1);
        assert!(measured.height.is_positive());
    }
}
