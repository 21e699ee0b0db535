mod debug;
mod error;
mod font;
mod links;
mod paginate;
mod paragraph;
mod surface;
mod table;
mod types;
mod wrap;

pub use error::LayoutError;
pub use font::{FixedMetrics, FontMetrics, FontRegistry, MetricsError};
pub use paginate::{Cursor, PageGeometry};
pub use paragraph::ParagraphStyle;
pub use surface::{Command, Document, LinkRegion, Page, PageCanvas, Surface};
pub use table::{Cell, Row, TableSpec, TableStyle};
pub use types::{Color, Margins, Pt, Rect, Size};

use debug::DebugLogger;
use std::path::PathBuf;
use std::sync::Arc;
use table::RenderSession;

/// Table layout and pagination over an immediate-mode drawing surface.
/// Construction happens once per document-generation run; the engine is
/// then reused for every table and paragraph in the document.
pub struct LayoutEngine {
    geometry: PageGeometry,
    metrics: Arc<dyn FontMetrics>,
    debug: Option<Arc<DebugLogger>>,
}

#[derive(Clone)]
pub struct LayoutEngineBuilder {
    page_size: Size,
    margins: Margins,
    font_files: Vec<PathBuf>,
    font_dirs: Vec<PathBuf>,
    metrics: Option<Arc<dyn FontMetrics>>,
    debug_path: Option<PathBuf>,
}

impl LayoutEngineBuilder {
    pub fn new() -> Self {
        Self {
            page_size: Size::a4(),
            margins: Margins::all(50.0),
            font_files: Vec::new(),
            font_dirs: Vec::new(),
            metrics: None,
            debug_path: None,
        }
    }

    pub fn page_size(mut self, page_size: Size) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn register_font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_files.push(path.into());
        self
    }

    pub fn register_font_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(path.into());
        self
    }

    /// Replaces the file-backed registry with caller-supplied metrics.
    pub fn with_metrics(mut self, metrics: Arc<dyn FontMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Enables the JSONL render trace at `path`.
    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<LayoutEngine, LayoutError> {
        let geometry = PageGeometry::new(self.page_size, self.margins);
        geometry.validate(Pt::from_f32(1.0))?;
        let metrics: Arc<dyn FontMetrics> = match self.metrics {
            Some(metrics) => metrics,
            None => {
                let mut registry = FontRegistry::new();
                for dir in &self.font_dirs {
                    registry.register_dir(dir);
                }
                for file in &self.font_files {
                    registry.register_file(file)?;
                }
                Arc::new(registry)
            }
        };
        let debug = match self.debug_path {
            Some(path) => Some(Arc::new(DebugLogger::new(path)?)),
            None => None,
        };
        Ok(LayoutEngine {
            geometry,
            metrics,
            debug,
        })
    }
}

impl Default for LayoutEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    pub fn builder() -> LayoutEngineBuilder {
        LayoutEngineBuilder::new()
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn metrics(&self) -> &dyn FontMetrics {
        self.metrics.as_ref()
    }

    /// A recording surface matched to this engine's page size and metrics.
    pub fn new_canvas(&self) -> PageCanvas {
        PageCanvas::new(self.geometry.page_size, self.metrics.clone())
    }

    /// Renders `spec` starting at (`start_x`, `start_y`), breaking pages as
    /// needed, and returns the final cursor Y so more content can be
    /// stacked beneath the table.
    pub fn render_table(
        &self,
        surface: &mut dyn Surface,
        spec: &TableSpec,
        start_x: Pt,
        start_y: Pt,
    ) -> Result<Pt, LayoutError> {
        let style = spec.style();
        let title_height = if spec.title().is_some() {
            style.title_height
        } else {
            Pt::ZERO
        };
        self.geometry
            .validate(title_height + style.min_header_height + style.min_row_height)?;
        let mut session = RenderSession {
            surface,
            metrics: self.metrics.as_ref(),
            geometry: &self.geometry,
            debug: self.debug.as_deref(),
        };
        let result = table::render_table(&mut session, spec, start_x, start_y);
        if let Some(logger) = &self.debug {
            logger.emit_summary("render_table");
            logger.flush();
        }
        result
    }

    /// Free-text block beneath or between tables; same page-break
    /// discipline, no headers or continuation note.
    pub fn render_paragraph(
        &self,
        surface: &mut dyn Surface,
        text: &str,
        style: &ParagraphStyle,
        x: Pt,
        width: Pt,
        start_y: Pt,
    ) -> Result<Pt, LayoutError> {
        self.geometry.validate(style.line_spacing)?;
        let mut session = RenderSession {
            surface,
            metrics: self.metrics.as_ref(),
            geometry: &self.geometry,
            debug: self.debug.as_deref(),
        };
        let result = paragraph::render_paragraph(&mut session, text, style, x, width, start_y);
        if let Some(logger) = &self.debug {
            logger.emit_summary("render_paragraph");
            logger.flush();
        }
        result
    }

    /// Standalone word-wrap for callers drawing free text themselves.
    pub fn wrap(&self, text: &str, font: &str, size: Pt, max_width: Pt) -> Vec<String> {
        wrap::wrap(text, font, size, max_width, self.metrics.as_ref())
    }
}
