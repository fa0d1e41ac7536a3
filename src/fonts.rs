use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use pdf_writer::types::{SystemInfo, UnicodeCmap};
use pdf_writer::{Name, Str};
use ttf_parser::Face;

use crate::error::Error;
use crate::source::SourceBytes;

/// Font used for every overlay placement of a batch.
pub enum FontAsset {
    /// Standard 14 Helvetica, WinAnsi encoded, not embedded.
    Helvetica,
    TrueType(TrueTypeFont),
}

pub struct TrueTypeFont {
    name: String,
    data: SourceBytes,
    face_index: u32,
}

/// Font object registered in one output document.
pub(crate) struct EmbeddedFont {
    pub(crate) id: ObjectId,
    char_to_gid: Option<BTreeMap<char, u16>>,
}

impl EmbeddedFont {
    /// Bytes for a `Tj` operand in this font's encoding.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

impl FontAsset {
    /// Load a TrueType/OpenType file (first face of a collection).
    pub fn open(path: &Path) -> Result<Self, Error> {
        let data = SourceBytes::map(path)
            .map_err(|e| Error::FontEmbed(e.to_string()))?;
        let fallback = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Custom")
            .to_string();
        Self::from_source(data, &fallback)
    }

    pub fn from_bytes(data: Vec<u8>, fallback_name: &str) -> Result<Self, Error> {
        Self::from_source(SourceBytes::from(data), fallback_name)
    }

    fn from_source(data: SourceBytes, fallback_name: &str) -> Result<Self, Error> {
        let face = Face::parse(&data, 0)
            .map_err(|e| Error::FontEmbed(format!("{fallback_name}: {e}")))?;
        let name = font_family_name(&face).unwrap_or_else(|| fallback_name.to_string());
        log::debug!("Loaded font {name} ({} glyphs)", face.number_of_glyphs());
        Ok(FontAsset::TrueType(TrueTypeFont {
            name,
            data,
            face_index: 0,
        }))
    }

    pub fn name(&self) -> &str {
        match self {
            FontAsset::Helvetica => "Helvetica",
            FontAsset::TrueType(tt) => &tt.name,
        }
    }

    /// Characters of `chars` this font has no code or glyph for.
    pub fn unsupported_chars(&self, chars: &BTreeSet<char>) -> Result<Vec<char>, Error> {
        match self {
            FontAsset::Helvetica => Ok(chars
                .iter()
                .copied()
                .filter(|&c| char_to_winansi(c).is_none())
                .collect()),
            FontAsset::TrueType(tt) => {
                let face = Face::parse(&tt.data, tt.face_index)
                    .map_err(|e| Error::FontEmbed(format!("{}: {e}", tt.name)))?;
                Ok(chars
                    .iter()
                    .copied()
                    .filter(|&c| face.glyph_index(c).is_none())
                    .collect())
            }
        }
    }

    /// Add the font objects to `doc`. Custom fonts are subset to `used_chars`.
    pub(crate) fn embed(
        &self,
        doc: &mut Document,
        used_chars: &BTreeSet<char>,
    ) -> Result<EmbeddedFont, Error> {
        match self {
            FontAsset::Helvetica => {
                let id = doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                });
                Ok(EmbeddedFont {
                    id,
                    char_to_gid: None,
                })
            }
            FontAsset::TrueType(tt) => embed_truetype(doc, tt, used_chars),
        }
    }
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

/// Embed as a CIDFont (Type0 composite) with Identity-H encoding, subset to
/// the glyphs this document uses.
fn embed_truetype(
    doc: &mut Document,
    font: &TrueTypeFont,
    used_chars: &BTreeSet<char>,
) -> Result<EmbeddedFont, Error> {
    let face = Face::parse(&font.data, font.face_index)
        .map_err(|e| Error::FontEmbed(format!("{}: {e}", font.name)))?;

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);
    let bb = face.global_bounding_box();
    let bbox = vec![
        real(bb.x_min as f32 / units * 1000.0),
        real(bb.y_min as f32 / units * 1000.0),
        real(bb.x_max as f32 / units * 1000.0),
        real(bb.y_max as f32 / units * 1000.0),
    ];

    // Sorted inputs keep glyph ids, widths and the CMap stable across runs.
    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = BTreeMap::new();
    let mut gid_widths: BTreeMap<u16, f32> = BTreeMap::new();
    for &ch in used_chars {
        let Some(gid) = face.glyph_index(ch) else {
            log::debug!("{} has no glyph for {ch:?}", font.name);
            continue;
        };
        let new_gid = remapper.remap(gid.0);
        char_to_gid.insert(ch, new_gid);
        let w = face
            .glyph_hor_advance(gid)
            .map(|adv| adv as f32 / units * 1000.0)
            .unwrap_or(0.0);
        gid_widths.insert(new_gid, w);
    }

    let subset_data = subsetter::subset(&font.data, font.face_index, &remapper)
        .map_err(|e| Error::FontEmbed(format!("subsetting {} failed: {e}", font.name)))?;

    let ps_name = font.name.replace(' ', "");

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&subset_data, 6);
    let data_id = doc.add_object(Stream::new(
        dictionary! {
            "Length1" => subset_data.len() as i64,
            "Filter" => "FlateDecode",
        },
        compressed,
    ));

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(ps_name.as_bytes().to_vec()),
        "Flags" => 32,
        "FontBBox" => bbox,
        "ItalicAngle" => 0,
        "Ascent" => real(ascent),
        "Descent" => real(descent),
        "CapHeight" => real(cap_height),
        "StemV" => 80,
        "FontFile2" => data_id,
    });

    let widths: Vec<Object> = gid_widths
        .iter()
        .flat_map(|(&gid, &w)| [Object::Integer(gid as i64), Object::Array(vec![real(w)])])
        .collect();

    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => Object::Name(ps_name.as_bytes().to_vec()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "DW" => 0,
        "W" => widths,
        "CIDToGIDMap" => "Identity",
    });

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        },
    );
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    let tounicode_id = doc.add_object(Stream::new(
        dictionary! {},
        cmap_data.as_slice().to_vec(),
    ));

    let id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(ps_name.as_bytes().to_vec()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => tounicode_id,
    });

    log::debug!(
        "Embedded {} subset: {} glyphs, {} bytes",
        font.name,
        char_to_gid.len(),
        subset_data.len(),
    );

    Ok(EmbeddedFont {
        id,
        char_to_gid: Some(char_to_gid),
    })
}

/// Map a single Unicode char to its WinAnsi (Windows-1252) byte.
fn char_to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x0020..=0x007E => Some(c as u8),
        0x00A0..=0x00FF => Some(c as u8), // Latin-1 supplement maps directly
        0x20AC => Some(0x80),
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201C => Some(0x93),
        0x201D => Some(0x94),
        0x2022 => Some(0x95), // bullet
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02DC => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Convert a UTF-8 string to WinAnsi bytes; unmappable chars are dropped.
pub fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars().filter_map(char_to_winansi).collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &BTreeMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}
