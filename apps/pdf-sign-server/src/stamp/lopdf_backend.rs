//! lopdf-based reader/writer
//!
//! Overlays are attached as form XObjects: the page's original content
//! streams get wrapped in `q`/`Q`, then a trailing stream paints the form.
//! Nothing in the original streams is rewritten.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::error::{Result, StampError};
use super::traits::{PdfReader, PdfWriter};
use super::types::{Overlay, PageGeometry, SourcePage, StandardFont};

/// How far up the page tree inherited attributes are looked for
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Prefix for the XObject resource names of stamp overlays
const OVERLAY_NAME_PREFIX: &str = "Stamp";

/// A parsed PDF being stamped
pub struct LopdfDocument {
    inner: Document,
    /// Font dictionaries already added to this document
    fonts: HashMap<&'static str, ObjectId>,
}

impl LopdfDocument {
    pub fn from_document(inner: Document) -> Self {
        Self {
            inner,
            fonts: HashMap::new(),
        }
    }

    /// Access the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    fn font_id(&mut self, font: StandardFont) -> ObjectId {
        if let Some(id) = self.fonts.get(font.base_font) {
            return *id;
        }

        let id = self.inner.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Object::Name(font.base_font.as_bytes().to_vec()),
            "Encoding" => "WinAnsiEncoding",
        });
        self.fonts.insert(font.base_font, id);
        id
    }
}

impl std::fmt::Debug for LopdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfDocument")
            .field("page_count", &self.page_count())
            .finish_non_exhaustive()
    }
}

/// The lopdf PDF backend
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl PdfReader for LopdfBackend {
    type Document = LopdfDocument;
    type PageHandle = ObjectId;

    fn read(&self, data: &[u8]) -> Result<LopdfDocument> {
        let inner = Document::load_mem(data)
            .map_err(|e| StampError::Parse(format!("Failed to load PDF: {}", e)))?;

        inner
            .catalog()
            .map_err(|e| StampError::Parse(format!("Missing document catalog: {}", e)))?;

        Ok(LopdfDocument::from_document(inner))
    }

    fn pages(&self, document: &LopdfDocument) -> Result<Vec<SourcePage<ObjectId>>> {
        document
            .inner
            .get_pages()
            .into_values()
            .enumerate()
            .map(|(index, page_id)| {
                let rect = media_box(&document.inner, page_id).map_err(|reason| {
                    StampError::PageGeometry {
                        page: index + 1,
                        reason,
                    }
                })?;
                let geometry = PageGeometry::from_rect(rect);
                if !(geometry.width > 0.0 && geometry.height > 0.0) {
                    return Err(StampError::PageGeometry {
                        page: index + 1,
                        reason: format!("degenerate box {:?}", rect),
                    });
                }
                Ok(SourcePage {
                    index,
                    handle: page_id,
                    geometry,
                })
            })
            .collect()
    }
}

impl PdfWriter for LopdfBackend {
    fn composite(
        &self,
        document: &mut LopdfDocument,
        page: &SourcePage<ObjectId>,
        overlay: &Overlay,
    ) -> Result<()> {
        let page_id = page.handle;
        let font_id = document.font_id(overlay.font);

        let mut fonts = Dictionary::new();
        fonts.set(overlay.font.resource_name, Object::Reference(font_id));
        let form = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => overlay.bbox.iter().map(|v| Object::from(*v)).collect::<Vec<_>>(),
                "Resources" => dictionary! { "Font" => fonts },
            },
            overlay.content.clone(),
        );
        let form_id = document.inner.add_object(form);

        let doc = &mut document.inner;

        let mut resources = effective_resources(doc, page_id)?;
        let mut xobjects = match resources.get(b"XObject") {
            Ok(obj) => resolve(doc, obj)
                .and_then(|o| o.as_dict().ok())
                .cloned()
                .unwrap_or_default(),
            Err(_) => Dictionary::new(),
        };
        let name = unique_name(&xobjects, OVERLAY_NAME_PREFIX);
        xobjects.set(name.clone(), Object::Reference(form_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        let existing = content_refs(doc, page_id)?;

        let head_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let tail = Content {
            operations: vec![
                Operation::new("Q", vec![]),
                Operation::new("q", vec![]),
                Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        // Leading newline: the previous stream may end mid-line
        let mut tail_bytes = b"\n".to_vec();
        tail_bytes.extend(
            tail.encode()
                .map_err(|e| StampError::Write(format!("Failed to encode page content: {}", e)))?,
        );
        let tail_id = doc.add_object(Stream::new(Dictionary::new(), tail_bytes));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(head_id));
        contents.extend(existing);
        contents.push(Object::Reference(tail_id));

        let page_dict = doc
            .get_dictionary_mut(page_id)
            .map_err(|e| StampError::Parse(format!("Failed to get page object: {}", e)))?;
        page_dict.set("Resources", Object::Dictionary(resources));
        page_dict.set("Contents", Object::Array(contents));

        Ok(())
    }

    fn set_title(&self, document: &mut LopdfDocument, title: &str) -> Result<()> {
        let doc = &mut document.inner;
        let title = text_string(title);

        let info_ref = match doc.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };

        if let Some(id) = info_ref {
            if let Ok(info) = doc.get_dictionary_mut(id) {
                info.set("Title", title);
                return Ok(());
            }
        } else if let Ok(Object::Dictionary(info)) = doc.trailer.get_mut(b"Info") {
            info.set("Title", title);
            return Ok(());
        }

        let info_id = doc.add_object(dictionary! { "Title" => title });
        doc.trailer.set("Info", Object::Reference(info_id));
        Ok(())
    }

    fn write(&self, document: LopdfDocument) -> Result<Vec<u8>> {
        let mut inner = document.inner;
        let mut output = Vec::new();
        inner
            .save_to(&mut output)
            .map_err(|e| StampError::Write(format!("Failed to save PDF: {}", e)))?;
        Ok(output)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Follow a single indirect reference
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look up a page attribute, walking `/Parent` for inheritable keys
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }
        let parent = match node.get(b"Parent") {
            Ok(Object::Reference(id)) => *id,
            _ => return None,
        };
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn number(doc: &Document, obj: &Object) -> Option<f32> {
    match resolve(doc, obj)? {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// The page's MediaBox as `[x0 y0 x1 y1]`
fn media_box(doc: &Document, page_id: ObjectId) -> std::result::Result<[f32; 4], String> {
    let obj = inherited(doc, page_id, b"MediaBox").ok_or_else(|| "no MediaBox".to_string())?;
    let values = obj
        .as_array()
        .map_err(|_| "MediaBox is not an array".to_string())?;
    if values.len() != 4 {
        return Err(format!("MediaBox has {} entries, expected 4", values.len()));
    }

    let mut rect = [0.0_f32; 4];
    for (slot, value) in rect.iter_mut().zip(values) {
        *slot = number(doc, value)
            .filter(|v| v.is_finite())
            .ok_or_else(|| "MediaBox entry is not a number".to_string())?;
    }
    Ok(rect)
}

/// Copy of the resources the page actually uses, inherited or not
fn effective_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => Ok(dict.clone()),
        Some(_) => Err(StampError::Parse(format!(
            "Resources of page object {:?} is not a dictionary",
            page_id
        ))),
        None => Ok(Dictionary::new()),
    }
}

/// The page's content streams as a flat list of objects
fn content_refs(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| StampError::Parse(format!("Failed to get page object: {}", e)))?;

    let contents = match page.get(b"Contents") {
        Ok(obj) => obj,
        Err(_) => return Ok(Vec::new()),
    };

    match contents {
        Object::Array(items) => Ok(items.clone()),
        Object::Reference(id) => match doc.get_object(*id) {
            // Indirect array of streams
            Ok(Object::Array(items)) => Ok(items.clone()),
            Ok(_) => Ok(vec![Object::Reference(*id)]),
            Err(e) => Err(StampError::Parse(format!("Dangling page content: {}", e))),
        },
        Object::Null => Ok(Vec::new()),
        other => Err(StampError::Parse(format!(
            "Unexpected page content object: {:?}",
            other
        ))),
    }
}

/// First `{prefix}{n}` not already used as a key
fn unique_name(dict: &Dictionary, prefix: &str) -> String {
    (0..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|name| !dict.has(name.as_bytes()))
        .unwrap_or_else(|| prefix.to_string())
}

/// Encode a PDF text string: literal for ASCII, UTF-16BE with BOM otherwise
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        Object::string_literal(text)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stamp::fonts::Helvetica;
    use crate::stamp::testing::{build_pdf, TestPage};

    fn load(data: &[u8]) -> LopdfDocument {
        LopdfBackend.read(data).unwrap()
    }

    #[test]
    fn test_read_rejects_garbage() {
        let err = LopdfBackend.read(b"definitely not a pdf").unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_pages_report_geometry_in_order() {
        let data = build_pdf(&[
            TestPage::letter(),
            TestPage::with_box([0.0, 0.0, 595.0, 842.0]),
            TestPage::with_box([0.0, 0.0, 100.0, 40.0]),
        ]);
        let doc = load(&data);
        let pages = LopdfBackend.pages(&doc).unwrap();

        assert_eq!(pages.len(), 3);
        assert_eq!(pages.iter().map(|p| p.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(pages[0].geometry.width, 612.0);
        assert_eq!(pages[1].geometry.height, 842.0);
        assert_eq!(pages[2].geometry.width, 100.0);
    }

    #[test]
    fn test_media_box_is_inherited_from_page_tree() {
        let data = build_pdf(&[TestPage::inherit_box()]);
        let doc = load(&data);
        let pages = LopdfBackend.pages(&doc).unwrap();
        // build_pdf puts US Letter on the Pages node
        assert_eq!(pages[0].geometry.to_rect(), [0.0, 0.0, 612.0, 792.0]);
    }

    #[test]
    fn test_missing_media_box_is_parse_error() {
        let data = build_pdf(&[TestPage::letter(), TestPage::no_box()]);
        let doc = load(&data);
        // Nothing to inherit: no page in this tree asks for it
        match LopdfBackend.pages(&doc) {
            Err(StampError::PageGeometry { page, .. }) => assert_eq!(page, 2),
            other => panic!("expected geometry error, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_degenerate_media_box_is_parse_error() {
        let data = build_pdf(&[TestPage::with_box([0.0, 0.0, 0.0, 792.0])]);
        let doc = load(&data);
        assert!(matches!(
            LopdfBackend.pages(&doc),
            Err(StampError::PageGeometry { page: 1, .. })
        ));
    }

    #[test]
    fn test_unique_name_skips_taken_names() {
        let mut dict = Dictionary::new();
        assert_eq!(unique_name(&dict, "Stamp"), "Stamp0");
        dict.set("Stamp0", Object::Null);
        dict.set("Stamp1", Object::Null);
        assert_eq!(unique_name(&dict, "Stamp"), "Stamp2");
    }

    #[test]
    fn test_text_string_encoding() {
        assert_eq!(text_string("Lease").as_str().unwrap(), b"Lease");

        let encoded = text_string("Zoë");
        let bytes = encoded.as_str().unwrap();
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(&bytes[2..], &[0x00, b'Z', 0x00, b'o', 0x00, 0xEB]);
    }

    #[test]
    fn test_set_title_reuses_existing_info() {
        let data = build_pdf(&[TestPage::letter()]);
        let mut doc = load(&data);
        LopdfBackend.set_title(&mut doc, "First").unwrap();
        LopdfBackend.set_title(&mut doc, "Second").unwrap();

        let info_id = doc.inner().trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.inner().get_dictionary(info_id).unwrap();
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Second");
    }

    #[test]
    fn test_composite_keeps_original_content_first() {
        let data = build_pdf(&[TestPage::letter()]);
        let mut doc = load(&data);
        let pages = LopdfBackend.pages(&doc).unwrap();
        let original = content_refs(doc.inner(), pages[0].handle).unwrap();

        let overlay = Overlay {
            bbox: pages[0].geometry.to_rect(),
            content: b"BT ET".to_vec(),
            font: StandardFont {
                base_font: "Helvetica",
                resource_name: "F1",
            },
        };
        LopdfBackend.composite(&mut doc, &pages[0], &overlay).unwrap();

        let ids = |objects: Vec<Object>| -> Vec<ObjectId> {
            objects.iter().map(|o| o.as_reference().unwrap()).collect()
        };
        let original = ids(original);
        let after = ids(content_refs(doc.inner(), pages[0].handle).unwrap());
        assert_eq!(after.len(), original.len() + 2);
        assert_eq!(&after[1..=original.len()], &original[..]);

        // Existing page resources survive next to the overlay
        let page = doc.inner().get_dictionary(pages[0].handle).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        assert!(resources.has(b"Font"));
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert!(xobjects.has(b"Stamp0"));
    }

    #[test]
    fn test_font_dictionary_is_shared() {
        let data = build_pdf(&[TestPage::letter(), TestPage::letter()]);
        let mut doc = load(&data);
        let first = doc.font_id(Helvetica::FONT);
        let second = doc.font_id(Helvetica::FONT);
        assert_eq!(first, second);
    }
}
