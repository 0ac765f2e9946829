use alloc::vec::Vec;

use ttf_parser::gdef::GlyphClass;
use ttf_parser::opentype_layout::{FeatureIndex, Lookup, LookupIndex, ScriptIndex};
use ttf_parser::GlyphId;

use super::error::LayoutError;
use super::hb_tag_t;
use super::ot_layout::GlyphItem;

#[allow(dead_code)]
pub mod lookup_flags {
    pub const RIGHT_TO_LEFT: u16 = 0x0001;
    pub const IGNORE_BASE_GLYPHS: u16 = 0x0002;
    pub const IGNORE_LIGATURES: u16 = 0x0004;
    pub const IGNORE_MARKS: u16 = 0x0008;
    pub const IGNORE_FLAGS: u16 = 0x000E;
    pub const USE_MARK_FILTERING_SET: u16 = 0x0010;
    pub const MARK_ATTACHMENT_TYPE_MASK: u16 = 0xFF00;
}

/// A lookup to apply, with the union of the properties of the features
/// referencing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ActiveLookup {
    pub index: LookupIndex,
    pub properties: u32,
}

/// Checks that a lookup with `lookup_properties` applies to a glyph.
///
/// A glyph is skipped when it carries every property bit of the lookup.
#[inline]
pub(crate) fn lookup_applies(glyph: &GlyphItem, lookup_properties: u32) -> bool {
    !glyph.properties & lookup_properties != 0
}

pub(crate) trait LayoutTableExt {
    fn script_index(&self, tag: hb_tag_t) -> Option<ScriptIndex>;
    fn default_feature(&self, script: ScriptIndex, tag: hb_tag_t) -> Option<FeatureIndex>;
    fn default_features(&self, script: ScriptIndex) -> Vec<hb_tag_t>;
    fn active_lookups(
        &self,
        features: &[(FeatureIndex, u32)],
    ) -> Result<Vec<ActiveLookup>, LayoutError>;
}

impl LayoutTableExt for ttf_parser::opentype_layout::LayoutTable<'_> {
    fn script_index(&self, tag: hb_tag_t) -> Option<ScriptIndex> {
        self.scripts.index(tag)
    }

    fn default_feature(&self, script: ScriptIndex, tag: hb_tag_t) -> Option<FeatureIndex> {
        let sys = self.scripts.get(script)?.default_language?;
        sys.feature_indices
            .into_iter()
            .find(|&index| self.features.get(index).map(|v| v.tag) == Some(tag))
    }

    fn default_features(&self, script: ScriptIndex) -> Vec<hb_tag_t> {
        let Some(sys) = self.scripts.get(script).and_then(|s| s.default_language) else {
            return Vec::new();
        };

        sys.feature_indices
            .into_iter()
            .filter_map(|index| self.features.get(index).map(|v| v.tag))
            .collect()
    }

    // Lookups are applied in lookup list order, no matter the order of features.
    fn active_lookups(
        &self,
        features: &[(FeatureIndex, u32)],
    ) -> Result<Vec<ActiveLookup>, LayoutError> {
        let mut lookups: Vec<ActiveLookup> = Vec::new();
        for &(feature_index, properties) in features {
            let Some(feature) = self.features.get(feature_index) else {
                log::warn!("unknown feature index {}", feature_index);
                continue;
            };

            for index in feature.lookup_indices {
                if self.lookups.get(index).is_none() {
                    return Err(LayoutError::InvalidLookup { lookup: index });
                }

                match lookups.iter_mut().find(|l| l.index == index) {
                    Some(lookup) => lookup.properties |= properties,
                    None => lookups.push(ActiveLookup { index, properties }),
                }
            }
        }

        lookups.sort_by_key(|l| l.index);
        Ok(lookups)
    }
}

/// Decides which glyphs a lookup ignores, from its flags and GDEF.
#[derive(Clone, Copy)]
pub(crate) struct GlyphFilter<'a> {
    gdef: Option<&'a ttf_parser::gdef::Table<'a>>,
    flags: u16,
    mark_filtering_set: Option<u16>,
}

impl<'a> GlyphFilter<'a> {
    pub fn new(gdef: Option<&'a ttf_parser::gdef::Table<'a>>, lookup: &Lookup) -> Self {
        GlyphFilter {
            gdef,
            flags: lookup.flags.0,
            mark_filtering_set: lookup.mark_filtering_set,
        }
    }

    pub fn is_mark(&self, glyph: GlyphId) -> bool {
        self.gdef
            .and_then(|gdef| gdef.glyph_class(glyph))
            .map_or(false, |class| class == GlyphClass::Mark)
    }

    pub fn skip(&self, glyph: GlyphId) -> bool {
        let Some(gdef) = self.gdef else {
            return false;
        };

        match gdef.glyph_class(glyph) {
            Some(GlyphClass::Base) => self.flags & lookup_flags::IGNORE_BASE_GLYPHS != 0,
            Some(GlyphClass::Ligature) => self.flags & lookup_flags::IGNORE_LIGATURES != 0,
            Some(GlyphClass::Mark) => {
                if self.flags & lookup_flags::IGNORE_MARKS != 0 {
                    return true;
                }

                if self.flags & lookup_flags::USE_MARK_FILTERING_SET != 0 {
                    return !gdef.is_mark_glyph(glyph, self.mark_filtering_set);
                }

                let class = (self.flags & lookup_flags::MARK_ATTACHMENT_TYPE_MASK) >> 8;
                class != 0 && gdef.glyph_mark_attachment_class(glyph) != class
            }
            _ => false,
        }
    }

    /// Index of the first glyph after `index` that is not ignored.
    pub fn next(&self, glyphs: &[GlyphItem], index: usize) -> Option<usize> {
        (index + 1..glyphs.len()).find(|&i| !self.skip(glyphs[i].glyph))
    }

    /// Index of the last glyph before `index` that is not ignored.
    pub fn prev(&self, glyphs: &[GlyphItem], index: usize) -> Option<usize> {
        (0..index).rev().find(|&i| !self.skip(glyphs[i].glyph))
    }
}
