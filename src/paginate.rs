use crate::debug::DebugLogger;
use crate::error::LayoutError;
use crate::types::{Margins, Pt, Size};

/// Printable region of a page. Y coordinates grow upward from the page
/// bottom; content flows downward, so the cursor starts at `top_y` and
/// decreases. The bottom margin reserves room for the continuation note.
#[derive(Debug, Clone, Copy)]
pub struct PageGeometry {
    pub page_size: Size,
    pub margins: Margins,
}

impl PageGeometry {
    pub fn new(page_size: Size, margins: Margins) -> Self {
        Self { page_size, margins }
    }

    pub fn top_y(&self) -> Pt {
        self.page_size.height - self.margins.top
    }

    pub fn bottom_margin(&self) -> Pt {
        self.margins.bottom
    }

    pub fn usable_height(&self) -> Pt {
        self.top_y() - self.bottom_margin()
    }

    pub fn content_left(&self) -> Pt {
        self.margins.left
    }

    pub fn content_width(&self) -> Pt {
        (self.page_size.width - self.margins.left - self.margins.right).max(Pt::ZERO)
    }

    pub(crate) fn validate(&self, min_block: Pt) -> Result<(), LayoutError> {
        if !self.page_size.width.is_positive() || !self.page_size.height.is_positive() {
            return Err(LayoutError::InvalidConfiguration(
                "page size must be positive".to_string(),
            ));
        }
        if self.usable_height() < min_block {
            return Err(LayoutError::InvalidConfiguration(format!(
                "usable page height {:.1}pt cannot hold a header and one row ({:.1}pt)",
                self.usable_height().to_f32(),
                min_block.to_f32()
            )));
        }
        Ok(())
    }
}

/// Current drawing position: page number (1-based) and Y offset. Owned by
/// one render call; the page number is relative to that call, the surface
/// keeps the document-global page cursor.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub page: usize,
    pub y: Pt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderPhase {
    Idle,
    HeaderPending,
    BodyRendering,
    PageBreak,
    Done,
}

/// Per-render bookkeeping. Created at the start of one render call,
/// discarded at the end; never shared across renders.
#[derive(Debug)]
pub(crate) struct RenderState {
    pub headers_emitted_on_current_page: bool,
    pub next_row_index: usize,
    pub rows_rendered_so_far: usize,
    pub body_rows_on_current_page: usize,
}

impl RenderState {
    fn new() -> Self {
        Self {
            headers_emitted_on_current_page: false,
            next_row_index: 0,
            rows_rendered_so_far: 0,
            body_rows_on_current_page: 0,
        }
    }
}

/// The pagination controller: owns the cursor and render state, and is the
/// only place phase transitions happen. Layout code asks `fits` before any
/// drawing for a row begins; rows are never split across pages.
pub(crate) struct PageFlow<'a> {
    geometry: &'a PageGeometry,
    debug: Option<&'a DebugLogger>,
    pub cursor: Cursor,
    pub state: RenderState,
    phase: RenderPhase,
}

impl<'a> PageFlow<'a> {
    pub fn new(geometry: &'a PageGeometry, start_y: Pt, debug: Option<&'a DebugLogger>) -> Self {
        let y = start_y.min(geometry.top_y());
        Self {
            geometry,
            debug,
            cursor: Cursor { page: 1, y },
            state: RenderState::new(),
            phase: RenderPhase::Idle,
        }
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// Idle -> HeaderPending, on the first call of a render.
    pub fn begin(&mut self) {
        debug_assert_eq!(self.phase, RenderPhase::Idle);
        self.phase = RenderPhase::HeaderPending;
    }

    /// HeaderPending -> BodyRendering, after the title bar and header row
    /// have been drawn.
    pub fn headers_emitted(&mut self, consumed: Pt) {
        debug_assert_eq!(self.phase, RenderPhase::HeaderPending);
        self.cursor.y -= consumed;
        self.state.headers_emitted_on_current_page = true;
        self.phase = RenderPhase::BodyRendering;
    }

    pub fn fits(&self, height: Pt) -> bool {
        self.cursor.y - height >= self.geometry.bottom_margin()
    }

    /// A row taller than the remaining space is still placed when the page
    /// holds no body rows yet; breaking again from an empty page would not
    /// free any more room.
    pub fn must_force_place(&self) -> bool {
        self.state.body_rows_on_current_page == 0
    }

    /// HeaderPending | BodyRendering -> PageBreak.
    pub fn request_page_break(&mut self, reason: &str) {
        debug_assert!(matches!(
            self.phase,
            RenderPhase::HeaderPending | RenderPhase::BodyRendering
        ));
        if let Some(logger) = self.debug {
            logger.log_page_break(self.cursor.page, self.cursor.page + 1, reason);
        }
        self.phase = RenderPhase::PageBreak;
    }

    /// PageBreak -> HeaderPending, after the surface has started the new
    /// page. Per-page state resets here, so a forgotten flag cannot leak
    /// across the break.
    pub fn page_started(&mut self) {
        debug_assert_eq!(self.phase, RenderPhase::PageBreak);
        self.cursor.page += 1;
        self.cursor.y = self.geometry.top_y();
        self.state.headers_emitted_on_current_page = false;
        self.state.body_rows_on_current_page = 0;
        self.phase = RenderPhase::HeaderPending;
    }

    pub fn row_placed(&mut self, height: Pt) {
        debug_assert_eq!(self.phase, RenderPhase::BodyRendering);
        self.cursor.y -= height;
        self.state.next_row_index += 1;
        self.state.rows_rendered_so_far += 1;
        self.state.body_rows_on_current_page += 1;
    }

    /// BodyRendering -> Done, once every row has been consumed.
    pub fn complete(&mut self) {
        debug_assert!(matches!(
            self.phase,
            RenderPhase::BodyRendering | RenderPhase::HeaderPending
        ));
        self.phase = RenderPhase::Done;
    }
}
