use pdf_writer::{Content, Name, Str};

use crate::fonts::EmbeddedFont;
use crate::model::Placement;

/// Content stream drawing every placement in order, each in its own text
/// object so positions are absolute.
pub(crate) fn build_overlay(
    font: &EmbeddedFont,
    font_name: &[u8],
    color: [f32; 3],
    placements: &[Placement],
) -> Vec<u8> {
    let mut content = Content::new();
    content.save_state();
    content.set_fill_rgb(color[0], color[1], color[2]);
    for p in placements {
        let encoded = font.encode(&p.text);
        if encoded.is_empty() {
            log::debug!("Nothing encodable in {:?}, skipped", p.text);
            continue;
        }
        content.begin_text();
        content.set_font(Name(font_name), p.font_size);
        content.next_line(p.x, p.y);
        content.show(Str(&encoded));
        content.end_text();
    }
    content.restore_state();
    content.finish().as_slice().to_vec()
}
