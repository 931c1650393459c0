//! In-memory PDF fixtures for tests

use lopdf::{dictionary, Document, Object, Stream};

const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// How a fixture page declares its MediaBox
#[derive(Debug, Clone, Copy)]
pub enum BoxSource {
    Own([f32; 4]),
    /// Take it from the Pages node (which then carries US Letter)
    Inherited,
    Missing,
}

#[derive(Debug, Clone, Copy)]
pub struct TestPage {
    pub media_box: BoxSource,
}

impl TestPage {
    pub fn letter() -> Self {
        Self::with_box(LETTER)
    }

    pub fn with_box(rect: [f32; 4]) -> Self {
        Self {
            media_box: BoxSource::Own(rect),
        }
    }

    pub fn inherit_box() -> Self {
        Self {
            media_box: BoxSource::Inherited,
        }
    }

    pub fn no_box() -> Self {
        Self {
            media_box: BoxSource::Missing,
        }
    }
}

fn rect_object(rect: [f32; 4]) -> Object {
    Object::Array(rect.iter().map(|v| Object::from(*v)).collect())
}

/// Build a PDF whose pages each draw a filled square with a font resource
///
/// The page content deliberately leaves a `cm` transform unbalanced to mimic
/// real-world producers.
pub fn build_pdf(pages: &[TestPage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"2 0 0 2 0 0 cm 0 0 1 rg 10 10 50 50 re f".to_vec(),
        ));
        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F0" => font_id },
            },
        };
        if let BoxSource::Own(rect) = page.media_box {
            page_dict.set("MediaBox", rect_object(rect));
        }
        kids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let mut pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
    };
    if pages
        .iter()
        .any(|p| matches!(p.media_box, BoxSource::Inherited))
    {
        pages_dict.set("MediaBox", rect_object(LETTER));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A single US Letter page
pub fn letter_pdf() -> Vec<u8> {
    build_pdf(&[TestPage::letter()])
}
