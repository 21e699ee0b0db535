use std::sync::Arc;

use crate::font::FontMetrics;
use crate::types::{Color, Pt, Rect, Size};
use crate::wrap::width_or_estimate;

/// The immediate-mode page-drawing capability the layout engine is built on.
/// Implementations own the page byte format and the global page cursor; the
/// engine only issues calls in document order. Drawing is infallible in this
/// contract; a collaborator with a continue-on-error policy absorbs its own
/// failures.
pub trait Surface {
    fn set_fill_color(&mut self, color: Color);
    fn set_stroke_color(&mut self, color: Color);
    fn draw_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, fill: bool, stroke: bool);
    fn draw_text(&mut self, x: Pt, y: Pt, text: &str, font: &str, size: Pt);
    fn measure_text(&self, text: &str, font: &str, size: Pt) -> Pt;
    fn start_new_page(&mut self);
    fn register_link(&mut self, url: &str, x: Pt, y: Pt, width: Pt, height: Pt);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFillColor(Color),
    SetStrokeColor(Color),
    DrawRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        fill: bool,
        stroke: bool,
    },
    DrawText {
        x: Pt,
        y: Pt,
        text: String,
        font: String,
        size: Pt,
    },
}

#[derive(Debug, Clone)]
pub struct LinkRegion {
    pub url: String,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub commands: Vec<Command>,
    pub links: Vec<LinkRegion>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
}

impl GraphicsState {
    fn fresh() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
        }
    }
}

/// Command-recording surface: the reference collaborator and the test
/// double. Pages carry their draw commands plus the link regions registered
/// while they were current, so a back end can emit per-page annotations.
pub struct PageCanvas {
    page_size: Size,
    metrics: Arc<dyn FontMetrics>,
    pages: Vec<Page>,
    current: Page,
    state: GraphicsState,
}

impl PageCanvas {
    pub fn new(page_size: Size, metrics: Arc<dyn FontMetrics>) -> Self {
        Self {
            page_size,
            metrics,
            pages: Vec::new(),
            current: Page::new(),
            state: GraphicsState::fresh(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn current_command_count(&self) -> usize {
        self.current.commands.len()
    }

    pub fn is_current_empty(&self) -> bool {
        self.current.commands.is_empty() && self.current.links.is_empty()
    }

    pub fn finish(mut self) -> Document {
        if !self.is_current_empty() || self.pages.is_empty() {
            let current = std::mem::replace(&mut self.current, Page::new());
            self.pages.push(current);
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

impl Surface for PageCanvas {
    fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color == color {
            return;
        }
        self.state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    fn draw_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, fill: bool, stroke: bool) {
        self.current.commands.push(Command::DrawRect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        });
    }

    fn draw_text(&mut self, x: Pt, y: Pt, text: &str, font: &str, size: Pt) {
        self.current.commands.push(Command::DrawText {
            x,
            y,
            text: text.to_string(),
            font: font.to_string(),
            size,
        });
    }

    fn measure_text(&self, text: &str, font: &str, size: Pt) -> Pt {
        width_or_estimate(self.metrics.as_ref(), font, size, text)
    }

    fn start_new_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(current);
        self.state = GraphicsState::fresh();
    }

    fn register_link(&mut self, url: &str, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.current.links.push(LinkRegion {
            url: url.to_string(),
            rect: Rect {
                x,
                y,
                width,
                height,
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FixedMetrics;

    fn canvas() -> PageCanvas {
        PageCanvas::new(Size::a4(), Arc::new(FixedMetrics::default()))
    }

    #[test]
    fn repeated_color_changes_are_deduplicated() {
        let mut canvas = canvas();
        let gray = Color::rgb(0.9, 0.9, 0.9);
        canvas.set_fill_color(gray);
        canvas.set_fill_color(gray);
        canvas.set_fill_color(Color::BLACK);
        let doc = canvas.finish();
        let sets: Vec<&Command> = doc.pages[0]
            .commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::SetFillColor(_)))
            .collect();
        assert_eq!(sets.len(), 2);
    }

    #[test]
    fn color_state_resets_on_new_page() {
        let mut canvas = canvas();
        let gray = Color::rgb(0.9, 0.9, 0.9);
        canvas.set_fill_color(gray);
        canvas.start_new_page();
        // Same color again on the fresh page must be re-emitted.
        canvas.set_fill_color(gray);
        let doc = canvas.finish();
        assert_eq!(doc.pages.len(), 2);
        assert!(doc.pages[1]
            .commands
            .iter()
            .any(|cmd| matches!(cmd, Command::SetFillColor(c) if *c == gray)));
    }

    #[test]
    fn links_are_collected_on_the_page_they_were_registered_on() {
        let mut canvas = canvas();
        canvas.register_link(
            "https://example.com/a",
            Pt::from_f32(10.0),
            Pt::from_f32(700.0),
            Pt::from_f32(40.0),
            Pt::from_f32(10.0),
        );
        canvas.start_new_page();
        canvas.register_link(
            "https://example.com/b",
            Pt::from_f32(10.0),
            Pt::from_f32(700.0),
            Pt::from_f32(40.0),
            Pt::from_f32(10.0),
        );
        let doc = canvas.finish();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].links.len(), 1);
        assert_eq!(doc.pages[0].links[0].url, "https://example.com/a");
        assert_eq!(doc.pages[1].links.len(), 1);
        assert_eq!(doc.pages[1].links[0].url, "https://example.com/b");
    }

    #[test]
    fn finish_keeps_the_trailing_page() {
        let mut canvas = canvas();
        canvas.draw_text(
            Pt::from_f32(10.0),
            Pt::from_f32(700.0),
            "hello",
            "Test",
            Pt::from_f32(10.0),
        );
        let doc = canvas.finish();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].commands.len(), 1);
    }

    #[test]
    fn finish_on_empty_canvas_yields_one_blank_page() {
        let doc = canvas().finish();
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].commands.is_empty());
    }

    #[test]
    fn measure_text_delegates_to_metrics() {
        let canvas = canvas();
        let width = canvas.measure_text("abcd", "Test", Pt::from_f32(10.0));
        assert_eq!(width.to_milli_i64(), 20_000);
    }
}
