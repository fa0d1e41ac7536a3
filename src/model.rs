use serde::{Deserialize, Serialize};

/// One CSV row: field name → trimmed value, in header order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldRecord {
    fields: Vec<(String, String)>,
    line: Option<u64>,
}

impl FieldRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. A repeated name overwrites the earlier value in place,
    /// so the last duplicate header wins without changing draw order.
    pub fn insert(&mut self, name: impl Into<String>, value: impl AsRef<str>) {
        let name = name.into();
        let value = value.as_ref().trim().to_string();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Same record, tagged with the 1-based source line it was read from.
    pub fn at_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn line(&self) -> Option<u64> {
        self.line
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of `field` if present and not blank.
    pub fn display_value(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|v| !v.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_empty())
    }
}

impl<K: Into<String>, V: AsRef<str>> FromIterator<(K, V)> for FieldRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = FieldRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Position in PDF points (bottom-left origin).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Free-text position with an optional font size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSpec {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
}

impl CoordinateSpec {
    pub const fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            x,
            y,
            size: Some(size),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Page {
    First,
    Second,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::First, Page::Second];

    pub fn index(self) -> usize {
        match self {
            Page::First => 0,
            Page::Second => 1,
        }
    }
}

/// One piece of text to stamp on a page.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
}

/// A filled document for one input record.
#[derive(Clone, Debug)]
pub struct RenderedArtifact {
    /// Index of the originating record in the ingested sequence.
    pub row: usize,
    pub name: String,
    pub bytes: Vec<u8>,
}
