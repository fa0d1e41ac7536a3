use std::collections::BTreeSet;

use crate::classify::{FieldKind, classify, parse_choice};
use crate::error::Error;
use crate::fonts::FontAsset;
use crate::layout::TemplateLayout;
use crate::model::{FieldRecord, Page, Placement};
use crate::pdf::Template;

fn mark(layout: &TemplateLayout, x: f32, y: f32) -> Placement {
    Placement {
        text: layout.mark_glyph.clone(),
        x,
        y,
        font_size: layout.mark_size,
    }
}

/// Everything one page of `record` draws, in record field order.
///
/// Marks (categorical and ordinal) only ever land on the first page; the
/// second page carries free text from its own position table.
pub fn plan_page(layout: &TemplateLayout, record: &FieldRecord, page: Page) -> Vec<Placement> {
    let mut placements = Vec::new();
    for (field, value) in record.iter() {
        let placement = match classify(layout, field, page) {
            FieldKind::Categorical(_) | FieldKind::Ordinal { .. } if page != Page::First => None,
            FieldKind::Categorical(table) => parse_choice(value)
                .and_then(|v| table.get(&v))
                .map(|pt| mark(layout, pt.x, pt.y)),
            FieldKind::Ordinal { y } => parse_choice(value)
                .and_then(|v| u8::try_from(v).ok())
                .and_then(|v| layout.ordinal_x.get(&v))
                .map(|&x| mark(layout, x, y)),
            FieldKind::FreeText(spec) => {
                let text = value.trim();
                (!text.is_empty()).then(|| Placement {
                    text: text.to_string(),
                    x: spec.x,
                    y: spec.y,
                    font_size: spec.size.unwrap_or(layout.default_text_size),
                })
            }
            FieldKind::Unmapped => None,
        };
        match placement {
            Some(p) => placements.push(p),
            None => log::trace!("{page:?}: field {field:?} = {value:?} not drawn"),
        }
    }
    placements
}

/// Fill one copy of the template with `record` and serialize it.
pub fn render_record(
    template: &Template,
    layout: &TemplateLayout,
    font: &FontAsset,
    record: &FieldRecord,
) -> Result<Vec<u8>, Error> {
    let plans: Vec<(Page, Vec<Placement>)> = Page::ALL
        .into_iter()
        .map(|page| (page, plan_page(layout, record, page)))
        .collect();
    let used_chars: BTreeSet<char> = plans
        .iter()
        .flat_map(|(_, placements)| placements.iter())
        .flat_map(|p| p.text.chars())
        .collect();

    // Every drawn character must be encodable, or the row fails.
    let missing = font.unsupported_chars(&used_chars)?;
    if !missing.is_empty() {
        let text = plans
            .iter()
            .flat_map(|(_, placements)| placements.iter())
            .find(|p| p.text.chars().any(|c| missing.contains(&c)))
            .map(|p| p.text.as_str())
            .unwrap_or_default();
        return Err(Error::Encoding(format!(
            "{text:?} has characters {missing:?} that {} cannot draw",
            font.name()
        )));
    }

    let mut doc = template.load()?;
    if !used_chars.is_empty() {
        let embedded = font.embed(doc.document_mut(), &used_chars)?;
        for (page, placements) in &plans {
            doc.overlay(*page, &embedded, layout.text_color, placements)?;
        }
    }

    doc.save()
}
