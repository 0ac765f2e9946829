// Match harfbuzz code style.
#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]
#![allow(non_snake_case)]

pub mod common;
pub mod error;
pub mod face;
pub mod glyph_attributes;
pub mod line_break;
pub mod ot_layout;
pub mod ot_layout_common;
pub mod ot_layout_gpos_table;
pub mod ot_layout_gsub_table;
pub mod ot_map;
pub mod ot_shape;
pub mod ot_shape_fallback;
pub mod shape;
pub mod unicode;

use ttf_parser::Tag as hb_tag_t;

#[cfg(not(feature = "std"))]
use core_maths::CoreFloat;

fn round(x: f32) -> f32 {
    x.round()
}
