use std::collections::BTreeMap;

use crate::layout::TemplateLayout;
use crate::model::{CoordinateSpec, Page, Point};

/// How a field is drawn on a given page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldKind<'a> {
    /// Value picks both x and y.
    Categorical(&'a BTreeMap<i64, Point>),
    /// Value 1..6 picks x; the field fixes y.
    Ordinal { y: f32 },
    FreeText(&'a CoordinateSpec),
    Unmapped,
}

/// First match wins: categorical, ordinal, then the page's free-text table.
/// Categorical and ordinal tables are global; only free text is page-scoped.
pub fn classify<'a>(layout: &'a TemplateLayout, field: &str, page: Page) -> FieldKind<'a> {
    if let Some(table) = layout.categorical.get(field) {
        return FieldKind::Categorical(table);
    }
    if let Some(&y) = layout.ordinal_rows.get(field) {
        return FieldKind::Ordinal { y };
    }
    match layout.positions(page).get(field) {
        Some(spec) => FieldKind::FreeText(spec),
        None => FieldKind::Unmapped,
    }
}

/// Strict integer parse of a trimmed cell; anything else means "no mark".
pub(crate) fn parse_choice(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}
