//! OpenType layout.
//!
//! The glyph buffer shared by GSUB and GPOS providers and the traits a
//! provider implements.

use alloc::vec::Vec;

use ttf_parser::opentype_layout::{FeatureIndex, ScriptIndex};
use ttf_parser::GlyphId;

use super::error::LayoutError;
use super::hb_tag_t;

/// A glyph in the layout buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphItem {
    /// Glyph id.
    pub glyph: GlyphId,
    /// Per-glyph property bits. A lookup skips glyphs that have all of its
    /// property bits set.
    pub properties: u32,
    /// Index of the glyph this one originates from, before substitution.
    pub cluster: u32,
}

/// A glyph adjustment produced by GPOS.
///
/// All values are in font units with the y axis pointing up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    /// Horizontal placement.
    pub x_pos: i32,
    /// Vertical placement.
    pub y_pos: i32,
    /// Horizontal advance, added to the font advance unless `new_advance` is set.
    pub x_advance: i32,
    /// Vertical advance.
    pub y_advance: i32,
    /// Distance to the glyph this one is attached to. Zero when unattached.
    pub back: u16,
    /// `x_advance` replaces the font advance instead of adjusting it.
    pub new_advance: bool,
}

/// A glyph buffer processed by the layout tables.
#[derive(Clone, Debug, Default)]
pub struct hb_buffer_t {
    glyphs: Vec<GlyphItem>,
    positions: Vec<Position>,
}

impl hb_buffer_t {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of glyphs in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Checks that the buffer has no glyphs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Appends a glyph.
    pub fn add_glyph(&mut self, glyph: GlyphId, properties: u32, cluster: u32) {
        self.glyphs.push(GlyphItem {
            glyph,
            properties,
            cluster,
        });
        self.positions.clear();
    }

    /// Glyphs in the buffer.
    #[inline]
    pub fn glyphs(&self) -> &[GlyphItem] {
        &self.glyphs
    }

    /// Mutable glyphs in the buffer.
    #[inline]
    pub fn glyphs_mut(&mut self) -> &mut [GlyphItem] {
        &mut self.glyphs
    }

    /// Glyph positions.
    ///
    /// Empty until [`clear_positions`](Self::clear_positions) is called.
    #[inline]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Mutable glyph positions.
    #[inline]
    pub fn positions_mut(&mut self) -> &mut [Position] {
        &mut self.positions
    }

    /// Resets one zeroed position per glyph.
    pub fn clear_positions(&mut self) {
        self.positions.clear();
        self.positions.resize(self.glyphs.len(), Position::default());
    }

    /// Replaces the glyph id at `index`.
    pub fn replace_glyph(&mut self, index: usize, glyph: GlyphId) {
        if let Some(item) = self.glyphs.get_mut(index) {
            item.glyph = glyph;
        }
    }

    /// Replaces the glyph at `index` with a sequence of glyphs.
    ///
    /// New glyphs inherit the properties and cluster of the replaced one.
    /// An empty sequence removes the glyph.
    pub fn replace_with_sequence(&mut self, index: usize, glyphs: &[GlyphId]) {
        let Some(item) = self.glyphs.get(index).copied() else {
            return;
        };

        let sequence = glyphs.iter().map(|&glyph| GlyphItem { glyph, ..item });
        self.glyphs.splice(index..index + 1, sequence);
        self.positions.clear();
    }

    /// Replaces the glyph at `index` with `glyph` and removes `components`.
    ///
    /// `components` must be sorted and all greater than `index`. The ligature
    /// keeps the cluster of the first glyph. Glyphs between the components
    /// stay in place, so they end up after the ligature.
    pub fn ligate(&mut self, index: usize, components: &[usize], glyph: GlyphId) {
        debug_assert!(components.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(components.first().map_or(true, |&c| c > index));

        self.replace_glyph(index, glyph);
        for &c in components.iter().rev() {
            if c < self.glyphs.len() {
                self.glyphs.remove(c);
            }
        }
        self.positions.clear();
    }

    /// Removes all glyphs, keeping the allocation.
    pub fn clear(&mut self) {
        self.glyphs.clear();
        self.positions.clear();
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.glyphs.capacity()
    }
}

/// Script and feature lookup in a GSUB or GPOS table.
pub trait LayoutTable {
    /// Returns the index of a script, if the table has it.
    fn select_script(&self, tag: hb_tag_t) -> Option<ScriptIndex>;

    /// Returns the index of a feature of the default language system of a script.
    fn find_feature(&self, script: ScriptIndex, tag: hb_tag_t) -> Option<FeatureIndex>;

    /// Returns the feature tags of the default language system of a script,
    /// in table order.
    fn script_features(&self, script: ScriptIndex) -> Vec<hb_tag_t>;
}

/// A glyph substitution table.
pub trait SubstitutionTable: LayoutTable {
    /// Applies the lookups of `features` to the buffer.
    ///
    /// Each feature comes with the property bits glyphs need to lack for it
    /// to apply. Returns [`LayoutError::NotCovered`] when nothing was
    /// substituted.
    fn substitute(
        &self,
        features: &[(FeatureIndex, u32)],
        buffer: &mut hb_buffer_t,
    ) -> Result<(), LayoutError>;
}

/// A glyph positioning table.
pub trait PositioningTable: LayoutTable {
    /// Applies the lookups of `features` to the buffer positions.
    ///
    /// Positions are zeroed by the caller. Returns
    /// [`LayoutError::NotCovered`] when nothing was positioned.
    fn position(
        &self,
        features: &[(FeatureIndex, u32)],
        buffer: &mut hb_buffer_t,
    ) -> Result<(), LayoutError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(glyphs: &[u16]) -> hb_buffer_t {
        let mut buffer = hb_buffer_t::new();
        for (i, &g) in glyphs.iter().enumerate() {
            buffer.add_glyph(GlyphId(g), 0, i as u32);
        }
        buffer
    }

    fn ids(buffer: &hb_buffer_t) -> Vec<(u16, u32)> {
        buffer
            .glyphs()
            .iter()
            .map(|g| (g.glyph.0, g.cluster))
            .collect()
    }

    #[test]
    fn sequence_inherits_cluster() {
        let mut b = buffer(&[1, 2, 3]);
        b.replace_with_sequence(1, &[GlyphId(7), GlyphId(8)]);
        assert_eq!(ids(&b), [(1, 0), (7, 1), (8, 1), (3, 2)]);

        b.replace_with_sequence(0, &[]);
        assert_eq!(ids(&b), [(7, 1), (8, 1), (3, 2)]);
    }

    #[test]
    fn ligature_keeps_skipped_glyphs() {
        let mut b = buffer(&[1, 2, 3, 4]);
        b.ligate(0, &[1, 3], GlyphId(9));
        assert_eq!(ids(&b), [(9, 0), (3, 2)]);
    }

    #[test]
    fn positions_follow_glyphs() {
        let mut b = buffer(&[1, 2]);
        assert!(b.positions().is_empty());
        b.clear_positions();
        assert_eq!(b.positions().len(), 2);
        b.ligate(0, &[1], GlyphId(3));
        assert!(b.positions().is_empty());
    }

    #[test]
    fn clear_keeps_allocation() {
        let mut b = buffer(&[1, 2, 3, 4, 5]);
        let capacity = b.capacity();
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), capacity);
    }
}
