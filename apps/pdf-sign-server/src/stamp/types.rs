//! Stamping data types

use serde::{Deserialize, Serialize};

/// Default stamp font size in points
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Stamps never start closer than this to the left edge
pub const DEFAULT_MIN_LEFT_MARGIN: f32 = 30.0;

/// Default baseline distance from the bottom edge
pub const DEFAULT_BASELINE_OFFSET: f32 = 30.0;

/// A page's visible-area box in points (72 points = 1 inch)
///
/// `x`/`y` is the lower-left corner; boxes stored with swapped corners are
/// normalized on read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    /// Build from a PDF rectangle `[x0 y0 x1 y1]`
    pub fn from_rect(rect: [f32; 4]) -> Self {
        let [x0, y0, x1, y1] = rect;
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// The box as a PDF rectangle `[llx lly urx ury]`
    pub fn to_rect(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }
}

/// One page of a source document, in document order
#[derive(Debug, Clone, Copy)]
pub struct SourcePage<H> {
    /// 0-based position in the document
    pub index: usize,
    /// Backend handle used to composite onto this page
    pub handle: H,
    pub geometry: PageGeometry,
}

/// Placement constants for the stamp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StampLayout {
    pub font_size: f32,
    pub min_left_margin: f32,
    pub baseline_offset: f32,
}

impl Default for StampLayout {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            min_left_margin: DEFAULT_MIN_LEFT_MARGIN,
            baseline_offset: DEFAULT_BASELINE_OFFSET,
        }
    }
}

impl StampLayout {
    /// Horizontal start of the stamp, relative to the page's left edge
    ///
    /// Centered, but clamped to the left margin so narrow pages never get a
    /// negative coordinate.
    pub fn horizontal_offset(&self, page_width: f32, text_width: f32) -> f32 {
        ((page_width - text_width) / 2.0).max(self.min_left_margin)
    }

    /// Absolute baseline origin of the stamp on a page
    pub fn origin(&self, geometry: &PageGeometry, text_width: f32) -> (f32, f32) {
        (
            geometry.x + self.horizontal_offset(geometry.width, text_width),
            geometry.y + self.baseline_offset,
        )
    }
}

/// What to stamp onto a document
#[derive(Debug, Clone, Default)]
pub struct StampRequest {
    /// Already-normalized stamp text
    pub text: String,
    /// Document title; `None` or empty leaves metadata untouched
    pub title: Option<String>,
}

impl StampRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Title to write, if any
    pub fn effective_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

/// One of the 14 standard PDF fonts, referenced without embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandardFont {
    /// PostScript name written as `/BaseFont`
    pub base_font: &'static str,
    /// Resource name the overlay content uses to select the font
    pub resource_name: &'static str,
}

/// A page-sized rendering that holds only the stamp text
///
/// `content` is a PDF content stream drawn in the page's own coordinate
/// space, meant to be placed as a form XObject over `bbox`.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub bbox: [f32; 4],
    pub content: Vec<u8>,
    pub font: StandardFont,
}

/// Output of a stamping run
#[derive(Debug, Clone)]
pub struct StampedPdf {
    pub data: Vec<u8>,
    pub page_count: usize,
}
