#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use constancia_fill::{FieldRecord, FontAsset, Template, TemplateLayout};
use lopdf::content::Content as PageContent;
use lopdf::{Document, Object};
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

pub const LETTER: (f32, f32) = (612.0, 792.0);
pub const A4: (f32, f32) = (595.0, 842.0);

/// A template with `page_count` pages of the given size, each carrying a
/// title in its own Helvetica resource named F1.
pub fn template_pdf(page_count: usize, size: (f32, f32)) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let catalog_id = Ref::new(1);
    let pages_id = Ref::new(2);
    let font_id = Ref::new(3);
    let page_ids: Vec<Ref> = (0..page_count).map(|i| Ref::new(4 + 2 * i as i32)).collect();
    let content_ids: Vec<Ref> = (0..page_count).map(|i| Ref::new(5 + 2 * i as i32)).collect();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_count as i32);
    pdf.type1_font(font_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for i in 0..page_count {
        let mut content = Content::new();
        content.begin_text();
        content.set_font(Name(b"F1"), 16.0);
        content.next_line(72.0, size.1 - 52.0);
        content.show(Str(b"CONSTANCIA"));
        content.end_text();
        let raw = content.finish();
        pdf.stream(content_ids[i], raw.as_slice());

        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, size.0, size.1))
            .parent(pages_id)
            .contents(content_ids[i]);
        page.resources().fonts().pair(Name(b"F1"), font_id);
    }

    pdf.finish()
}

pub fn template(page_count: usize) -> Template {
    Template::from_bytes(template_pdf(page_count, LETTER)).expect("fixture template loads")
}

pub fn layout() -> TemplateLayout {
    TemplateLayout::constancia()
}

pub fn helvetica() -> FontAsset {
    FontAsset::Helvetica
}

pub fn record(pairs: &[(&str, &str)]) -> FieldRecord {
    pairs.iter().copied().collect()
}

/// Overlay text found in an output PDF.
#[derive(Clone, Debug, PartialEq)]
pub struct Stamp {
    pub page: u32,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub text: Vec<u8>,
}

impl Stamp {
    /// WinAnsi bytes below 0x80 and Latin-1 letters decode to themselves.
    pub fn text(&self) -> String {
        self.text.iter().map(|&b| b as char).collect()
    }
}

/// Every `Tj` drawn with an overlay font, with its `Td` position.
pub fn stamps(pdf: &[u8]) -> Vec<Stamp> {
    let doc = Document::load_mem(pdf).expect("output parses");
    let mut out = Vec::new();
    for (page_no, page_id) in doc.get_pages() {
        let bytes = doc.get_page_content(page_id).expect("page content");
        let content = PageContent::decode(&bytes).expect("content decodes");
        let mut font: Vec<u8> = Vec::new();
        let mut size = 0.0;
        let mut pos = (0.0, 0.0);
        for op in &content.operations {
            match op.operator.as_str() {
                "Tf" => {
                    font = op.operands[0].as_name().expect("font name").to_vec();
                    size = op.operands[1].as_float().expect("font size");
                }
                "Td" => {
                    pos = (
                        op.operands[0].as_float().expect("x"),
                        op.operands[1].as_float().expect("y"),
                    );
                }
                "Tj" if font.starts_with(b"FOvl") => {
                    if let Object::String(text, _) = &op.operands[0] {
                        out.push(Stamp {
                            page: page_no,
                            x: pos.0,
                            y: pos.1,
                            size,
                            text: text.clone(),
                        });
                    }
                }
                _ => {}
            }
        }
    }
    out
}

pub fn page_count(pdf: &[u8]) -> usize {
    Document::load_mem(pdf).expect("output parses").get_pages().len()
}

pub fn media_boxes(pdf: &[u8]) -> Vec<Vec<f32>> {
    let doc = Document::load_mem(pdf).expect("output parses");
    doc.get_pages()
        .values()
        .map(|&id| {
            let page = doc.get_dictionary(id).expect("page dict");
            page.get(b"MediaBox")
                .and_then(Object::as_array)
                .expect("page has its own MediaBox")
                .iter()
                .map(|o| o.as_float().expect("number"))
                .collect()
        })
        .collect()
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let n = NEXT.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "constancia-fill-{tag}-{}-{n}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
