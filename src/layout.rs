//! Template descriptor: every coordinate table for one revision of the
//! certificate artwork. Coordinates are only valid for the revision they were
//! measured against, so a new template revision ships a new descriptor.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{CoordinateSpec, Page, Point};

pub const DEFAULT_REVISION: &str = "constancia-2025.1";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateLayout {
    pub revision: String,
    /// Column that names a record; rows without it are not rendered.
    pub display_field: String,
    #[serde(default = "default_mark_glyph")]
    pub mark_glyph: String,
    #[serde(default = "default_mark_size")]
    pub mark_size: f32,
    #[serde(default = "default_text_size")]
    pub default_text_size: f32,
    #[serde(default)]
    pub text_color: [f32; 3],
    /// Rating → x for ordinal marks.
    pub ordinal_x: BTreeMap<u8, f32>,
    /// Ordinal field → y of its rubric row.
    pub ordinal_rows: BTreeMap<String, f32>,
    /// Categorical field → value → mark position.
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<i64, Point>>,
    pub page1: BTreeMap<String, CoordinateSpec>,
    #[serde(default)]
    pub page2: BTreeMap<String, CoordinateSpec>,
}

fn default_mark_glyph() -> String {
    "x".to_string()
}

fn default_mark_size() -> f32 {
    11.0
}

fn default_text_size() -> f32 {
    12.0
}

const TEXT: f32 = 11.0;

impl TemplateLayout {
    /// Built-in descriptor for a revision name.
    pub fn builtin(revision: &str) -> Option<Self> {
        match revision {
            DEFAULT_REVISION => Some(Self::constancia()),
            _ => None,
        }
    }

    pub fn builtin_revisions() -> &'static [&'static str] {
        &[DEFAULT_REVISION]
    }

    /// Service-social certificate, two pages, US Letter.
    pub fn constancia() -> Self {
        // 6 = fully satisfactory ... 1 = not satisfactory; columns 48pt apart.
        let ordinal_x = BTreeMap::from([
            (6, 231.0),
            (5, 279.0),
            (4, 327.0),
            (3, 375.0),
            (2, 423.0),
            (1, 471.0),
        ]);

        let ordinal_rows = [
            ("Responsabilidad", 458.0),
            ("Iniciativa", 443.0),
            ("Colaboracion", 425.0),
            ("Puntualidad", 410.0),
            ("CalidadDelTrabajo", 395.0),
            ("Comunicacion", 380.0),
        ]
        .into_iter()
        .map(|(k, y)| (k.to_string(), y))
        .collect();

        let yes_no = |y: f32| {
            BTreeMap::from([
                (1, Point { x: 396.0, y }),
                (0, Point { x: 456.0, y }),
            ])
        };
        let categorical = BTreeMap::from([
            ("RecomendariaAlAlumno".to_string(), yes_no(107.0)),
            ("CumplioObjetivos".to_string(), yes_no(137.0)),
        ]);

        let page1 = [
            ("Fecha", CoordinateSpec::new(373.0, 626.0, TEXT)),
            ("Nombre", CoordinateSpec::new(53.0, 618.0, TEXT)),
            ("NoDeCuenta", CoordinateSpec::new(75.0, 602.0, TEXT)),
            ("Carrera", CoordinateSpec::new(220.0, 602.0, TEXT)),
            ("Organizacion", CoordinateSpec::new(140.0, 585.0, TEXT)),
            ("Responsable", CoordinateSpec::new(180.0, 567.0, TEXT)),
            ("Programa", CoordinateSpec::new(110.0, 553.0, TEXT)),
            ("FechaInicio", CoordinateSpec::new(145.0, 539.0, TEXT)),
            ("FechaTermino", CoordinateSpec::new(325.0, 539.0, TEXT)),
        ]
        .into_iter()
        .map(|(k, spec)| (k.to_string(), spec))
        .collect();

        let page2 = [
            ("Nombre", CoordinateSpec::new(120.0, 700.0, TEXT)),
            ("NoDeCuenta", CoordinateSpec::new(120.0, 684.0, TEXT)),
            ("Carrera", CoordinateSpec::new(330.0, 684.0, TEXT)),
            ("Observaciones", CoordinateSpec::new(72.0, 600.0, TEXT)),
            ("Fecha", CoordinateSpec::new(373.0, 160.0, TEXT)),
        ]
        .into_iter()
        .map(|(k, spec)| (k.to_string(), spec))
        .collect();

        Self {
            revision: DEFAULT_REVISION.to_string(),
            display_field: "Nombre".to_string(),
            mark_glyph: default_mark_glyph(),
            mark_size: default_mark_size(),
            default_text_size: default_text_size(),
            text_color: [0.0, 0.0, 0.0],
            ordinal_x,
            ordinal_rows,
            categorical,
            page1,
            page2,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let layout: TemplateLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Layout(format!("{}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn positions(&self, page: Page) -> &BTreeMap<String, CoordinateSpec> {
        match page {
            Page::First => &self.page1,
            Page::Second => &self.page2,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.display_field.trim().is_empty() {
            return Err(Error::Layout("display_field must not be empty".into()));
        }
        if self.mark_glyph.is_empty() {
            return Err(Error::Layout("mark_glyph must not be empty".into()));
        }
        if !(self.mark_size > 0.0 && self.default_text_size > 0.0) {
            return Err(Error::Layout("font sizes must be positive".into()));
        }
        if let Some((field, _)) = self
            .page1
            .iter()
            .chain(self.page2.iter())
            .find(|(_, spec)| spec.size.is_some_and(|s| s <= 0.0))
        {
            return Err(Error::Layout(format!("font size for {field} must be positive")));
        }
        if self.text_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(Error::Layout("text_color components must be within 0..1".into()));
        }
        Ok(())
    }
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self::constancia()
    }
}
