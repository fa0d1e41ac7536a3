mod overlay;

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::error::Error;
use crate::fonts::EmbeddedFont;
use crate::model::{Page, Placement};
use crate::source::SourceBytes;

pub(crate) use overlay::build_overlay;

const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// The certificate template. Holds the original bytes only; every render
/// parses its own private copy so rows never see each other's edits.
pub struct Template {
    bytes: SourceBytes,
    page_count: usize,
}

impl Template {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let bytes = SourceBytes::map(path).map_err(|e| Error::TemplateLoad(e.to_string()))?;
        Self::from_source(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Error> {
        Self::from_source(SourceBytes::from(bytes))
    }

    fn from_source(bytes: SourceBytes) -> Result<Self, Error> {
        let doc = parse(&bytes)?;
        let page_count = doc.get_pages().len();
        log::debug!("Template: {} pages, {} bytes", page_count, bytes.len());
        Ok(Self { bytes, page_count })
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub(crate) fn load(&self) -> Result<TemplateDocument, Error> {
        TemplateDocument::new(parse(&self.bytes)?)
    }
}

fn parse(bytes: &[u8]) -> Result<Document, Error> {
    let doc = Document::load_mem(bytes).map_err(|e| Error::TemplateLoad(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(Error::TemplateLoad("template PDF is encrypted".into()));
    }
    if doc.get_pages().is_empty() {
        return Err(Error::TemplateLoad("template has no pages".into()));
    }
    Ok(doc)
}

/// Private, mutable copy of the template for one row.
pub(crate) struct TemplateDocument {
    doc: Document,
    pages: [ObjectId; 2],
}

impl TemplateDocument {
    fn new(mut doc: Document) -> Result<Self, Error> {
        let pages = doc.get_pages();
        let first = *pages
            .get(&1)
            .ok_or_else(|| Error::TemplateLoad("template has no pages".into()))?;
        let second = match pages.get(&2) {
            Some(&id) => id,
            None => append_blank_page(&mut doc, first)?,
        };
        Ok(Self {
            doc,
            pages: [first, second],
        })
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub(crate) fn page_id(&self, page: Page) -> ObjectId {
        self.pages[page.index()]
    }

    /// Stamp `placements` on top of `page`'s existing content.
    pub(crate) fn overlay(
        &mut self,
        page: Page,
        font: &EmbeddedFont,
        color: [f32; 3],
        placements: &[Placement],
    ) -> Result<(), Error> {
        if placements.is_empty() {
            return Ok(());
        }
        let page_id = self.page_id(page);
        let font_name = register_font(&mut self.doc, page_id, font.id)?;
        let content = build_overlay(font, font_name.as_bytes(), color, placements);
        append_content(&mut self.doc, page_id, content)
    }

    pub(crate) fn save(mut self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| Error::Pdf(format!("failed to serialize PDF: {e}")))?;
        Ok(out)
    }
}

/// Inherited page attribute lookup (MediaBox, Resources), walking up the
/// Pages tree with a depth limit.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let Some(obj) = inherited(doc, page_id, b"MediaBox") else {
        return LETTER;
    };
    let Ok(arr) = resolve(doc, obj).as_array() else {
        return LETTER;
    };
    let values: Vec<f32> = arr
        .iter()
        .filter_map(|o| resolve(doc, o).as_float().ok())
        .collect();
    match values.as_slice() {
        [a, b, c, d] => [*a, *b, *c, *d],
        _ => LETTER,
    }
}

fn append_blank_page(doc: &mut Document, first: ObjectId) -> Result<ObjectId, Error> {
    let media = media_box(doc, first);
    let pages_id = doc
        .catalog()
        .and_then(|c| c.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| Error::TemplateLoad(format!("missing page tree: {e}")))?;

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media.iter().map(|&v| Object::Real(v)).collect::<Vec<_>>(),
        "Resources" => dictionary! {},
    });

    let pages = doc
        .get_dictionary_mut(pages_id)
        .map_err(|e| Error::TemplateLoad(format!("bad page tree: {e}")))?;
    let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(1);
    match pages.get_mut(b"Kids") {
        Ok(Object::Array(kids)) => kids.push(Object::Reference(page_id)),
        _ => return Err(Error::TemplateLoad("page tree has no Kids array".into())),
    }
    pages.set("Count", count + 1);
    log::debug!("Template has one page; appended blank page {media:?}");
    Ok(page_id)
}

fn dictionary_of(doc: &Document, obj: Option<&Object>) -> Dictionary {
    obj.map(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_default()
}

/// Give the page its own copy of its (possibly inherited or shared)
/// resources with the overlay font added, and return the resource name.
fn register_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<String, Error> {
    let mut resources = dictionary_of(doc, inherited(doc, page_id, b"Resources"));
    let mut fonts = dictionary_of(doc, resources.get(b"Font").ok());

    let mut n = 1;
    let name = loop {
        let candidate = format!("FOvl{n}");
        if !fonts.has(candidate.as_bytes()) {
            break candidate;
        }
        n += 1;
    };
    fonts.set(name.as_bytes().to_vec(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(name)
}

/// Append `content` after the page's own streams, which are wrapped in
/// `q`/`Q` so their graphics state does not leak into the overlay.
fn append_content(doc: &mut Document, page_id: ObjectId, content: Vec<u8>) -> Result<(), Error> {
    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&content, 6);
    let overlay_id = doc.add_object(Stream::new(
        dictionary! { "Filter" => "FlateDecode" },
        compressed,
    ));

    let existing = doc.get_dictionary(page_id)?.get(b"Contents").ok().cloned();
    let mut streams = match existing {
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![Object::Reference(id)],
        },
        Some(Object::Array(arr)) => arr,
        _ => Vec::new(),
    };
    if !streams.is_empty() {
        let save_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let restore_id = doc.add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec()));
        streams.insert(0, Object::Reference(save_id));
        streams.push(Object::Reference(restore_id));
    }
    streams.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(streams));
    Ok(())
}
