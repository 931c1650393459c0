//! Standard-font text rendering
//!
//! Helvetica is one of the 14 standard PDF fonts, so viewers supply it and
//! nothing gets embedded. Widths come from the Adobe AFM metrics for
//! WinAnsiEncoding, in 1/1000 text-space units.

use lopdf::content::{Content, Operation};
use lopdf::Object;

use super::error::{Result, StampError};
use super::traits::TextRenderer;
use super::types::{Overlay, PageGeometry, StandardFont};

/// Glyph advance widths for codes 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, // ' ' .. ')'
    389, 584, 278, 333, 278, 278, 556, 556, 556, 556, // '*' .. '3'
    556, 556, 556, 556, 556, 556, 278, 278, 584, 584, // '4' .. '='
    584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, // '>' .. 'G'
    722, 278, 500, 667, 556, 833, 722, 778, 667, 778, // 'H' .. 'Q'
    722, 667, 611, 722, 667, 944, 667, 667, 611, 278, // 'R' .. '['
    278, 278, 469, 556, 333, 556, 556, 500, 556, 556, // '\\' .. 'e'
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 'f' .. 'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, // 'p' .. 'y'
    500, 334, 260, 334, 584, // 'z' .. '~'
];

const FIRST_CHAR: u32 = 32;
const LAST_CHAR: u32 = 126;

/// Stand-in for characters the metrics table does not cover
const REPLACEMENT_CHAR: char = '?';

/// Helvetica at WinAnsiEncoding, drawn without embedding
#[derive(Debug, Clone, Copy, Default)]
pub struct Helvetica;

impl Helvetica {
    pub const FONT: StandardFont = StandardFont {
        base_font: "Helvetica",
        resource_name: "F1",
    };

    /// Replace everything outside printable ASCII with `?`
    ///
    /// Measuring and drawing both go through this so the reported width is
    /// the width of what ends up on the page.
    pub fn drawable(text: &str) -> String {
        text.chars()
            .map(|c| {
                if (FIRST_CHAR..=LAST_CHAR).contains(&(c as u32)) {
                    c
                } else {
                    REPLACEMENT_CHAR
                }
            })
            .collect()
    }

    fn glyph_width(c: char) -> u16 {
        let code = c as u32;
        if (FIRST_CHAR..=LAST_CHAR).contains(&code) {
            HELVETICA_WIDTHS[(code - FIRST_CHAR) as usize]
        } else {
            HELVETICA_WIDTHS[(REPLACEMENT_CHAR as u32 - FIRST_CHAR) as usize]
        }
    }
}

impl TextRenderer for Helvetica {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(Self::glyph_width(c))).sum();
        units as f32 * font_size / 1000.0
    }

    fn render(
        &self,
        text: &str,
        font_size: f32,
        origin: (f32, f32),
        page: &PageGeometry,
    ) -> Result<Overlay> {
        let text = Self::drawable(text);
        let (x, y) = origin;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new("g", vec![Object::Integer(0)]),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(Self::FONT.resource_name.as_bytes().to_vec()),
                        font_size.into(),
                    ],
                ),
                Operation::new("Td", vec![x.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        };

        let content = content
            .encode()
            .map_err(|e| StampError::Write(format!("Failed to encode overlay content: {}", e)))?;

        Ok(Overlay {
            bbox: page.to_rect(),
            content,
            font: Self::FONT,
        })
    }
}
