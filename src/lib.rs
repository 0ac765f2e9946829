/*!
`harfshape` is the shaping core of the classic (Qt-era) HarfBuzz shaper, written in Rust.

It provides:

- Unicode line-break classification for a UTF-16 string ([`char_attributes`]).
- Heuristic glyph attributes and cluster maps for scripts without a custom shaper.
- OpenType feature selection, substitution and positioning through
  pluggable GSUB/GPOS providers, with `ttf-parser` backed defaults.
- A fallback mark positioner for fonts without usable positioning data.

Shaping is done per script run:

```no_run
use harfshape::{Face, Script, ScriptItem, ShapeOutput, ShaperItem};

let data = std::fs::read("font.ttf").unwrap();
let mut face = Face::from_slice(&data, 0).unwrap();
let text: Vec<u16> = "office".encode_utf16().collect();
let item = ShaperItem::new(&text, ScriptItem::new(0, text.len(), Script::Common, 0));

let mut output = ShapeOutput::with_capacity(text.len());
harfshape::shape(&mut face, &item, &mut output).unwrap();
```
*/

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

mod hb;

pub use ttf_parser;

pub use ttf_parser::{GlyphId, Tag};

pub use hb::common::{Script, ScriptItem, ShaperFlags};
pub use hb::error::{LayoutError, ShapeError};
pub use hb::face::{hb_face_t as Face, FontFuncs, GlyphMetrics};
pub use hb::glyph_attributes::{heuristic_set_glyph_attributes, GlyphAttributes, Justification};
pub use hb::line_break::{calc_line_breaks, CharAttributes, LineBreakClass, LineBreakType};
pub use hb::ot_layout::{
    hb_buffer_t as LayoutBuffer, GlyphItem, LayoutTable, PositioningTable, Position,
    SubstitutionTable,
};
pub use hb::ot_layout_gpos_table::TtfPositioningTable;
pub use hb::ot_layout_gsub_table::TtfSubstitutionTable;
pub use hb::ot_map::{
    required_tables, script_tag, select_script, OpenTypeFeature, RequiredTables, BASIC_FEATURES,
    CCMP_PROPERTY, DEFAULT_SCRIPT, POSITIONING_PROPERTIES,
};
pub use hb::ot_shape::{ot_position, ot_shape, PositionOutcome};
pub use hb::ot_shape_fallback::heuristic_position;
pub use hb::shape::{
    basic_shape, char_attributes, char_attributes_with, shape, shape_item, string_to_glyphs,
    AttributesFunc, GlyphOffset, GlyphRun, ScriptEngine, ScriptEngines, ScriptShaper, ShapeFunc,
    ShapeOutput, ShaperItem,
};
