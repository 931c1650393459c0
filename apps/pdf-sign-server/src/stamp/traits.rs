//! Stamping capabilities
//!
//! PDF-library-agnostic interfaces the stamping procedure is written
//! against. The production implementations live in `lopdf_backend` and
//! `fonts`.

use super::error::Result;
use super::types::{Overlay, PageGeometry, SourcePage};

/// Parses PDF bytes into ordered pages with geometry
pub trait PdfReader {
    /// Parsed document the backend works on
    type Document;
    /// Handle identifying a page inside `Document`
    type PageHandle: Copy;

    /// Parse a PDF byte stream
    fn read(&self, data: &[u8]) -> Result<Self::Document>;

    /// Pages in document order, with their visible-area boxes
    fn pages(&self, document: &Self::Document) -> Result<Vec<SourcePage<Self::PageHandle>>>;
}

/// Composites overlays and serializes the result
pub trait PdfWriter: PdfReader {
    /// Draw `overlay` on top of the page's existing content
    fn composite(
        &self,
        document: &mut Self::Document,
        page: &SourcePage<Self::PageHandle>,
        overlay: &Overlay,
    ) -> Result<()>;

    /// Set the document title metadata
    fn set_title(&self, document: &mut Self::Document, title: &str) -> Result<()>;

    /// Serialize the document
    fn write(&self, document: Self::Document) -> Result<Vec<u8>>;
}

/// Measures and renders a single line of text
pub trait TextRenderer: Send + Sync {
    /// Width of `text` at `font_size`, in points
    fn text_width(&self, text: &str, font_size: f32) -> f32;

    /// Render `text` with its baseline starting at `origin` onto a
    /// transparent surface the size of `page`
    fn render(
        &self,
        text: &str,
        font_size: f32,
        origin: (f32, f32),
        page: &PageGeometry,
    ) -> Result<Overlay>;
}
