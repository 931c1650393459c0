//! Page-overlay stamping
//!
//! Renders a short line of text onto every page of a PDF, horizontally
//! centered near the bottom edge, and optionally sets the document title.
//!
//! # Architecture
//!
//! ```text
//!   PDF bytes ──► PdfReader ──► [SourcePage + PageGeometry] ...
//!                                     │
//!                       TextRenderer (width, overlay)
//!                                     │
//!                                     ▼
//!                 PdfWriter (composite, title) ──► PDF bytes
//! ```
//!
//! Stamping is not idempotent: stamping a stamped document adds a second
//! text layer on top of the first.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pdf_sign_server::stamp::{StampLayout, StampRequest, Stamper};
//!
//! let stamper = Stamper::new(StampLayout::default());
//! let signed = stamper.stamp(&pdf_bytes, &StampRequest::new("Initials: AB"))?;
//! assert_eq!(signed.page_count, page_count);
//! ```

mod error;
mod fonts;
mod lopdf_backend;
mod traits;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, StampError};
pub use fonts::Helvetica;
pub use lopdf_backend::{LopdfBackend, LopdfDocument};
pub use traits::{PdfReader, PdfWriter, TextRenderer};
pub use types::{
    Overlay, PageGeometry, SourcePage, StampLayout, StampRequest, StampedPdf, StandardFont,
    DEFAULT_BASELINE_OFFSET, DEFAULT_FONT_SIZE, DEFAULT_MIN_LEFT_MARGIN,
};

/// The stamping procedure, generic over the PDF backend and text renderer
#[derive(Debug, Clone)]
pub struct Stamper<B = LopdfBackend, R = Helvetica> {
    backend: B,
    renderer: R,
    layout: StampLayout,
}

impl Stamper {
    /// Stamper using lopdf and built-in Helvetica metrics
    pub fn new(layout: StampLayout) -> Self {
        Self::with_parts(LopdfBackend, Helvetica, layout)
    }
}

impl<B, R> Stamper<B, R>
where
    B: PdfWriter,
    R: TextRenderer,
{
    pub fn with_parts(backend: B, renderer: R, layout: StampLayout) -> Self {
        Self {
            backend,
            renderer,
            layout,
        }
    }

    /// Stamp `request.text` onto every page of `data`
    ///
    /// Fails without producing output if the document or any page box
    /// cannot be read.
    pub fn stamp(&self, data: &[u8], request: &StampRequest) -> Result<StampedPdf> {
        let mut document = self.backend.read(data)?;
        let pages = self.backend.pages(&document)?;

        let font_size = self.layout.font_size;
        let text_width = self.renderer.text_width(&request.text, font_size);

        for page in &pages {
            let origin = self.layout.origin(&page.geometry, text_width);
            let overlay = self
                .renderer
                .render(&request.text, font_size, origin, &page.geometry)?;
            self.backend.composite(&mut document, page, &overlay)?;

            tracing::trace!(
                page = page.index + 1,
                x = origin.0,
                y = origin.1,
                width = page.geometry.width,
                height = page.geometry.height,
                "Stamped page"
            );
        }

        if let Some(title) = request.effective_title() {
            self.backend.set_title(&mut document, title)?;
        }

        let data = self.backend.write(document)?;

        tracing::debug!(
            pages = pages.len(),
            text_width,
            output_bytes = data.len(),
            "Stamping complete"
        );

        Ok(StampedPdf {
            data,
            page_count: pages.len(),
        })
    }
}

impl Default for Stamper {
    fn default() -> Self {
        Self::new(StampLayout::default())
    }
}
