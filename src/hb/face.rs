use alloc::boxed::Box;
use alloc::vec::Vec;

use smallvec::SmallVec;
use ttf_parser::opentype_layout::FeatureIndex;
use ttf_parser::GlyphId;

use super::common::{Script, ShaperFlags};
use super::glyph_attributes::GlyphAttributes;
use super::ot_layout::{hb_buffer_t, PositioningTable, SubstitutionTable};
use super::ot_layout_gpos_table::TtfPositioningTable;
use super::ot_layout_gsub_table::TtfSubstitutionTable;
use super::ot_map;
use super::shape::ShapeOutput;

// https://docs.microsoft.com/en-us/typography/opentype/spec/cmap#windows-platform-platform-id--3
const WINDOWS_SYMBOL_ENCODING: u16 = 0;
const WINDOWS_UNICODE_BMP_ENCODING: u16 = 1;
const WINDOWS_UNICODE_FULL_ENCODING: u16 = 10;

// https://docs.microsoft.com/en-us/typography/opentype/spec/name#platform-specific-encoding-and-language-ids-unicode-platform-platform-id--0
const UNICODE_1_0_ENCODING: u16 = 0;
const UNICODE_1_1_ENCODING: u16 = 1;
const UNICODE_ISO_ENCODING: u16 = 2;
const UNICODE_2_0_BMP_ENCODING: u16 = 3;
const UNICODE_2_0_FULL_ENCODING: u16 = 4;
const UNICODE_FULL_ENCODING: u16 = 6;

/// Glyph bounding box and advance, in font units.
///
/// The y axis points down: `y` is the negated top of the glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GlyphMetrics {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Bounding box width.
    pub width: i32,
    /// Bounding box height.
    pub height: i32,
    /// Horizontal advance.
    pub x_offset: i32,
    /// Vertical advance.
    pub y_offset: i32,
}

/// Font services used by the shaper.
pub trait FontFuncs {
    /// Maps a code point to a glyph.
    fn glyph_index(&self, c: u32) -> Option<GlyphId>;

    /// Horizontal advance of a glyph.
    fn glyph_advance(&self, glyph: GlyphId, flags: ShaperFlags) -> i32;

    /// Bounding box and advance of a glyph.
    fn glyph_metrics(&self, glyph: GlyphId) -> Option<GlyphMetrics>;

    /// Font ascent.
    fn ascent(&self) -> i32;

    /// Checks that the font uses a symbol encoding.
    fn is_symbol_font(&self) -> bool {
        false
    }
}

impl FontFuncs for ttf_parser::Face<'_> {
    fn glyph_index(&self, c: u32) -> Option<GlyphId> {
        let subtable_idx = find_best_cmap_subtable(self)?;
        let subtable = self.tables().cmap?.subtables.get(subtable_idx)?;

        if subtable.platform_id == ttf_parser::PlatformId::Macintosh && c > 0x7F {
            return None;
        }

        match subtable.glyph_index(c) {
            Some(gid) => Some(gid),
            // Symbol fonts map U+F000..F0FF, which is what Windows uses for U+0000..00FF.
            None if subtable.platform_id == ttf_parser::PlatformId::Windows
                && subtable.encoding_id == WINDOWS_SYMBOL_ENCODING
                && c <= 0x00FF =>
            {
                subtable.glyph_index(0xF000 + c)
            }
            None => None,
        }
    }

    fn glyph_advance(&self, glyph: GlyphId, flags: ShaperFlags) -> i32 {
        let Some(hmtx) = self.tables().hmtx else {
            return i32::from(self.units_per_em());
        };

        let advance = if flags.contains(ShaperFlags::USE_DESIGN_METRICS) {
            // The default instance, without variation deltas.
            hmtx.advance(glyph)
        } else {
            self.glyph_hor_advance(glyph)
        };

        advance.map_or(0, i32::from)
    }

    fn glyph_metrics(&self, glyph: GlyphId) -> Option<GlyphMetrics> {
        if glyph.0 >= self.number_of_glyphs() {
            return None;
        }

        let advance = FontFuncs::glyph_advance(self, glyph, ShaperFlags::empty());
        let metrics = match self.glyph_bounding_box(glyph) {
            Some(bbox) => GlyphMetrics {
                x: i32::from(bbox.x_min),
                y: -i32::from(bbox.y_max),
                width: i32::from(bbox.x_max) - i32::from(bbox.x_min),
                height: i32::from(bbox.y_max) - i32::from(bbox.y_min),
                x_offset: advance,
                y_offset: 0,
            },
            // Empty glyph.
            None => GlyphMetrics {
                x_offset: advance,
                ..GlyphMetrics::default()
            },
        };

        Some(metrics)
    }

    fn ascent(&self) -> i32 {
        i32::from(self.ascender())
    }

    fn is_symbol_font(&self) -> bool {
        find_cmap_subtable(
            self,
            ttf_parser::PlatformId::Windows,
            WINDOWS_SYMBOL_ENCODING,
        )
        .is_some()
    }
}

/// A font face prepared for shaping.
///
/// Owns the font services, the layout tables, the OpenType feature
/// selection of the last shaped script and the scratch buffers used while
/// shaping. Shaping mutates the face, so a face shapes one run at a time.
pub struct hb_face_t<'a> {
    pub(crate) font: Box<dyn FontFuncs + 'a>,
    pub(crate) gsub: Option<Box<dyn SubstitutionTable + 'a>>,
    pub(crate) gpos: Option<Box<dyn PositioningTable + 'a>>,
    supported_scripts: [bool; Script::COUNT],
    is_symbol_font: bool,

    pub(crate) current: Option<(Script, ShaperFlags)>,
    pub(crate) gsub_features: SmallVec<[(FeatureIndex, u32); 8]>,
    pub(crate) gpos_features: SmallVec<[(FeatureIndex, u32); 8]>,
    pub(crate) has_opentype_kerning: bool,
    pub(crate) glyphs_substituted: bool,

    // Scratch. Cleared between runs, never shrunk.
    pub(crate) buffer: hb_buffer_t,
    pub(crate) tmp_attributes: Vec<GlyphAttributes>,
    pub(crate) tmp_log_clusters: Vec<u32>,
    // The caller's output before the current run, restored on failure.
    pub(crate) saved_output: ShapeOutput,
}

impl<'a> hb_face_t<'a> {
    /// Creates a new `Face` from data.
    ///
    /// Data will be referenced, not owned.
    pub fn from_slice(data: &'a [u8], face_index: u32) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, face_index).ok()?;
        Some(Self::from_face(face))
    }

    /// Creates a new `Face` from [`ttf_parser::Face`], using its GSUB, GPOS
    /// and GDEF tables.
    pub fn from_face(face: ttf_parser::Face<'a>) -> Self {
        let gsub = TtfSubstitutionTable::from_face(&face)
            .map(|t| Box::new(t) as Box<dyn SubstitutionTable + 'a>);
        let gpos = TtfPositioningTable::from_face(&face)
            .map(|t| Box::new(t) as Box<dyn PositioningTable + 'a>);
        Self::with_tables(face, gsub, gpos)
    }

    /// Creates a new `Face` from font services and layout table providers.
    pub fn with_tables(
        font: impl FontFuncs + 'a,
        gsub: Option<Box<dyn SubstitutionTable + 'a>>,
        gpos: Option<Box<dyn PositioningTable + 'a>>,
    ) -> Self {
        let is_symbol_font = font.is_symbol_font();
        let mut face = hb_face_t {
            font: Box::new(font),
            gsub,
            gpos,
            supported_scripts: [false; Script::COUNT],
            is_symbol_font,
            current: None,
            gsub_features: SmallVec::new(),
            gpos_features: SmallVec::new(),
            has_opentype_kerning: false,
            glyphs_substituted: false,
            buffer: hb_buffer_t::new(),
            tmp_attributes: Vec::new(),
            tmp_log_clusters: Vec::new(),
            saved_output: ShapeOutput::default(),
        };

        for script in Script::ALL {
            face.supported_scripts[script.index()] =
                ot_map::check_script(face.gsub.as_deref(), face.gpos.as_deref(), script);
        }

        log::debug!(
            "face: gsub={} gpos={} symbol={}",
            face.gsub.is_some(),
            face.gpos.is_some(),
            face.is_symbol_font
        );

        face
    }

    /// Font services of the face.
    #[inline]
    pub fn font(&self) -> &dyn FontFuncs {
        &*self.font
    }

    /// Checks that the font uses a symbol encoding.
    ///
    /// Soft hyphens are printed in symbol fonts.
    #[inline]
    pub fn is_symbol_font(&self) -> bool {
        self.is_symbol_font
    }

    /// Checks that the layout tables can shape `script`.
    ///
    /// Scripts that need substitution are unsupported without a GSUB table
    /// that has them.
    #[inline]
    pub fn supports_script(&self, script: Script) -> bool {
        self.supported_scripts[script.index()]
    }

    /// Checks that the face has a substitution table.
    #[inline]
    pub fn has_substitution_table(&self) -> bool {
        self.gsub.is_some()
    }

    /// Checks that the face has a positioning table.
    #[inline]
    pub fn has_positioning_table(&self) -> bool {
        self.gpos.is_some()
    }

    /// Checks that the selected GPOS features include `kern`.
    #[inline]
    pub fn has_opentype_kerning(&self) -> bool {
        self.has_opentype_kerning
    }

    /// Number of glyphs the scratch buffers hold without reallocating.
    pub fn scratch_capacity(&self) -> usize {
        self.tmp_attributes
            .capacity()
            .min(self.tmp_log_clusters.capacity())
            .min(self.buffer.capacity())
    }
}

fn find_best_cmap_subtable(face: &ttf_parser::Face) -> Option<u16> {
    use ttf_parser::PlatformId;

    // Symbol subtable.
    find_cmap_subtable(face, PlatformId::Windows, WINDOWS_SYMBOL_ENCODING)
        // 32-bit subtables:
        .or_else(|| find_cmap_subtable(face, PlatformId::Windows, WINDOWS_UNICODE_FULL_ENCODING))
        .or_else(|| find_cmap_subtable(face, PlatformId::Unicode, UNICODE_FULL_ENCODING))
        .or_else(|| find_cmap_subtable(face, PlatformId::Unicode, UNICODE_2_0_FULL_ENCODING))
        // 16-bit subtables:
        .or_else(|| find_cmap_subtable(face, PlatformId::Windows, WINDOWS_UNICODE_BMP_ENCODING))
        .or_else(|| find_cmap_subtable(face, PlatformId::Unicode, UNICODE_2_0_BMP_ENCODING))
        .or_else(|| find_cmap_subtable(face, PlatformId::Unicode, UNICODE_ISO_ENCODING))
        .or_else(|| find_cmap_subtable(face, PlatformId::Unicode, UNICODE_1_1_ENCODING))
        .or_else(|| find_cmap_subtable(face, PlatformId::Unicode, UNICODE_1_0_ENCODING))
        // MacRoman subtable:
        .or_else(|| find_cmap_subtable(face, PlatformId::Macintosh, 0))
}

fn find_cmap_subtable(
    face: &ttf_parser::Face,
    platform_id: ttf_parser::PlatformId,
    encoding_id: u16,
) -> Option<u16> {
    face.tables()
        .cmap?
        .subtables
        .into_iter()
        .position(|s| s.platform_id == platform_id && s.encoding_id == encoding_id)
        .and_then(|i| u16::try_from(i).ok())
}
