use alloc::vec::Vec;

use ttf_parser::gpos::{
    Anchor, MarkToBaseAdjustment, MarkToMarkAdjustment, PairAdjustment, PositioningSubtable,
    SingleAdjustment, ValueRecord,
};
use ttf_parser::opentype_layout::{FeatureIndex, Lookup, ScriptIndex};

use super::error::LayoutError;
use super::hb_tag_t;
use super::ot_layout::{hb_buffer_t, LayoutTable, PositioningTable, Position};
use super::ot_layout_common::{lookup_applies, ActiveLookup, GlyphFilter, LayoutTableExt};

/// A GPOS table read with `ttf-parser`.
///
/// Supports single and pair adjustments, mark-to-base and mark-to-mark
/// attachment. Anchors and values are used in font units; device tables
/// are ignored.
#[derive(Clone)]
pub struct TtfPositioningTable<'a> {
    table: ttf_parser::opentype_layout::LayoutTable<'a>,
    gdef: Option<ttf_parser::gdef::Table<'a>>,
}

impl<'a> TtfPositioningTable<'a> {
    /// Creates a new provider from a parsed GPOS table and an optional GDEF table.
    pub fn new(
        table: ttf_parser::opentype_layout::LayoutTable<'a>,
        gdef: Option<ttf_parser::gdef::Table<'a>>,
    ) -> Self {
        TtfPositioningTable { table, gdef }
    }

    /// Creates a new provider from the GPOS table of a face.
    pub fn from_face(face: &ttf_parser::Face<'a>) -> Option<Self> {
        let tables = face.tables();
        Some(Self::new(tables.gpos?, tables.gdef))
    }

    fn apply_lookup(
        &self,
        lookup: &Lookup,
        active: ActiveLookup,
        buffer: &mut hb_buffer_t,
    ) -> Result<bool, LayoutError> {
        let filter = GlyphFilter::new(self.gdef.as_ref(), lookup);
        let subtables: Vec<_> = lookup
            .subtables
            .into_iter::<PositioningSubtable>()
            .collect();

        let mut applied = false;
        let mut i = 0;
        while i < buffer.len() {
            let item = buffer.glyphs()[i];
            if !lookup_applies(&item, active.properties) || filter.skip(item.glyph) {
                i += 1;
                continue;
            }

            let mut next = None;
            for subtable in &subtables {
                let mut ctx = ApplyContext {
                    buffer: &mut *buffer,
                    filter: &filter,
                    lookup: active.index,
                    idx: i,
                };
                next = ctx.apply(subtable)?;
                if next.is_some() {
                    break;
                }
            }

            match next {
                Some(n) => {
                    applied = true;
                    i = n;
                }
                None => i += 1,
            }
        }

        Ok(applied)
    }
}

impl LayoutTable for TtfPositioningTable<'_> {
    fn select_script(&self, tag: hb_tag_t) -> Option<ScriptIndex> {
        self.table.script_index(tag)
    }

    fn find_feature(&self, script: ScriptIndex, tag: hb_tag_t) -> Option<FeatureIndex> {
        self.table.default_feature(script, tag)
    }

    fn script_features(&self, script: ScriptIndex) -> Vec<hb_tag_t> {
        self.table.default_features(script)
    }
}

impl PositioningTable for TtfPositioningTable<'_> {
    fn position(
        &self,
        features: &[(FeatureIndex, u32)],
        buffer: &mut hb_buffer_t,
    ) -> Result<(), LayoutError> {
        if buffer.positions().len() != buffer.len() {
            buffer.clear_positions();
        }

        let mut applied = false;
        for active in self.table.active_lookups(features)? {
            let lookup = self
                .table
                .lookups
                .get(active.index)
                .ok_or(LayoutError::InvalidLookup {
                    lookup: active.index,
                })?;

            if self.apply_lookup(&lookup, active, buffer)? {
                log::trace!("GPOS lookup {} applied", active.index);
                applied = true;
            }
        }

        if applied {
            Ok(())
        } else {
            Err(LayoutError::NotCovered)
        }
    }
}

trait ValueRecordExt {
    fn is_empty(&self) -> bool;
    fn apply_to_pos(&self, pos: &mut Position);
}

impl ValueRecordExt for ValueRecord<'_> {
    fn is_empty(&self) -> bool {
        self.x_placement == 0 && self.y_placement == 0 && self.x_advance == 0 && self.y_advance == 0
    }

    fn apply_to_pos(&self, pos: &mut Position) {
        pos.x_pos += i32::from(self.x_placement);
        pos.y_pos += i32::from(self.y_placement);
        pos.x_advance += i32::from(self.x_advance);
        pos.y_advance += i32::from(self.y_advance);
    }
}

struct ApplyContext<'a, 'b> {
    buffer: &'a mut hb_buffer_t,
    filter: &'a GlyphFilter<'b>,
    lookup: u16,
    idx: usize,
}

impl ApplyContext<'_, '_> {
    fn invalid(&self) -> LayoutError {
        LayoutError::InvalidSubtable {
            lookup: self.lookup,
        }
    }

    fn apply(&mut self, subtable: &PositioningSubtable) -> Result<Option<usize>, LayoutError> {
        match subtable {
            PositioningSubtable::Single(t) => self.apply_single(t),
            PositioningSubtable::Pair(t) => self.apply_pair(t),
            PositioningSubtable::MarkToBase(t) => self.apply_mark_to_base(t),
            PositioningSubtable::MarkToMark(t) => self.apply_mark_to_mark(t),
            _ => Ok(None),
        }
    }

    fn apply_value(&mut self, index: usize, record: &ValueRecord) {
        if let Some(pos) = self.buffer.positions_mut().get_mut(index) {
            record.apply_to_pos(pos);
        }
    }

    fn apply_single(&mut self, t: &SingleAdjustment) -> Result<Option<usize>, LayoutError> {
        let glyph = self.buffer.glyphs()[self.idx].glyph;
        let record = match t {
            SingleAdjustment::Format1 { coverage, value } => {
                if coverage.get(glyph).is_none() {
                    return Ok(None);
                }
                *value
            }
            SingleAdjustment::Format2 { coverage, values } => {
                let Some(index) = coverage.get(glyph) else {
                    return Ok(None);
                };
                values.get(index).ok_or(self.invalid())?
            }
        };

        self.apply_value(self.idx, &record);
        Ok(Some(self.idx + 1))
    }

    fn apply_pair(&mut self, t: &PairAdjustment) -> Result<Option<usize>, LayoutError> {
        let first_glyph = self.buffer.glyphs()[self.idx].glyph;
        let Some(first_index) = t.coverage().get(first_glyph) else {
            return Ok(None);
        };

        let Some(second) = self.filter.next(self.buffer.glyphs(), self.idx) else {
            return Ok(None);
        };
        let second_glyph = self.buffer.glyphs()[second].glyph;

        let records = match t {
            PairAdjustment::Format1 { sets, .. } => {
                let set = sets.get(first_index).ok_or(self.invalid())?;
                match set.get(second_glyph) {
                    Some(records) => records,
                    None => return Ok(None),
                }
            }
            PairAdjustment::Format2 {
                classes, matrix, ..
            } => {
                let classes = (classes.0.get(first_glyph), classes.1.get(second_glyph));
                match matrix.get(classes) {
                    Some(records) => records,
                    None => return Ok(None),
                }
            }
        };

        self.apply_value(self.idx, &records.0);
        self.apply_value(second, &records.1);

        if records.1.is_empty() {
            Ok(Some(second))
        } else {
            Ok(Some(second + 1))
        }
    }

    fn apply_mark_to_base(&mut self, t: &MarkToBaseAdjustment) -> Result<Option<usize>, LayoutError> {
        let mark_glyph = self.buffer.glyphs()[self.idx].glyph;
        let Some(mark_index) = t.mark_coverage.get(mark_glyph) else {
            return Ok(None);
        };

        // The closest preceding glyph that is not a mark.
        let glyphs = self.buffer.glyphs();
        let base = (0..self.idx).rev().find(|&j| {
            let glyph = glyphs[j].glyph;
            !self.filter.is_mark(glyph) && !self.filter.skip(glyph)
        });
        let Some(base) = base else {
            return Ok(None);
        };

        let Some(base_index) = t.base_coverage.get(glyphs[base].glyph) else {
            return Ok(None);
        };

        let (class, mark_anchor) = t.marks.get(mark_index).ok_or(self.invalid())?;
        let Some(base_anchor) = t.anchors.get(base_index, class) else {
            return Ok(None);
        };

        self.attach(base, mark_anchor, base_anchor);
        Ok(Some(self.idx + 1))
    }

    fn apply_mark_to_mark(&mut self, t: &MarkToMarkAdjustment) -> Result<Option<usize>, LayoutError> {
        let mark1_glyph = self.buffer.glyphs()[self.idx].glyph;
        let Some(mark1_index) = t.mark1_coverage.get(mark1_glyph) else {
            return Ok(None);
        };

        let Some(prev) = self.filter.prev(self.buffer.glyphs(), self.idx) else {
            return Ok(None);
        };

        let mark2_glyph = self.buffer.glyphs()[prev].glyph;
        if !self.filter.is_mark(mark2_glyph) {
            return Ok(None);
        }

        let Some(mark2_index) = t.mark2_coverage.get(mark2_glyph) else {
            return Ok(None);
        };

        let (class, mark1_anchor) = t.marks.get(mark1_index).ok_or(self.invalid())?;
        let Some(mark2_anchor) = t.mark2_matrix.get(mark2_index, class) else {
            return Ok(None);
        };

        self.attach(prev, mark1_anchor, mark2_anchor);
        Ok(Some(self.idx + 1))
    }

    fn attach(&mut self, to: usize, mark_anchor: Anchor, base_anchor: Anchor) {
        let idx = self.idx;
        if let Some(pos) = self.buffer.positions_mut().get_mut(idx) {
            *pos = Position {
                x_pos: i32::from(base_anchor.x) - i32::from(mark_anchor.x),
                y_pos: i32::from(base_anchor.y) - i32::from(mark_anchor.y),
                x_advance: 0,
                y_advance: 0,
                back: u16::try_from(idx - to).unwrap_or(0),
                new_advance: true,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hb::face::tests::{head, hhea, maxp, to_bytes};
    use crate::hb::ot_map::POSITIONING_PROPERTIES;
    use ttf_parser::GlyphId;

    // 'kern' kerns A V by -80, 'mark' attaches U+0301 to 'a'.
    fn positioning_table() -> Vec<u8> {
        to_bytes(&[
            // Header.
            1, 0, 10, 32, 58,
            // Script list: 'latn'.
            1, 0x6C61, 0x746E, 8,
            // Script.
            4, 0,
            // Language system: features 0 and 1.
            0, 0xFFFF, 2, 0, 1,
            // Feature list: 'kern' and 'mark'.
            2, 0x6B65, 0x726E, 14, 0x6D61, 0x726B, 20,
            // 'kern' uses lookup 0.
            0, 1, 0,
            // 'mark' uses lookup 1.
            0, 1, 1,
            // Lookup list.
            2, 6, 38,
            // Lookup 0: pair adjustment.
            2, 0, 1, 8,
            // Pair adjustment format 1, x advance on the first glyph.
            1, 12, 4, 0, 1, 18,
            // Coverage: 'A'.
            1, 1, 0x41,
            // Pair set: 'V', -80.
            1, 0x56, (-80i16) as u16,
            // Lookup 1: mark-to-base.
            4, 0, 1, 8,
            // Mark-to-base format 1, one mark class.
            1, 12, 18, 1, 24, 36,
            // Mark coverage.
            1, 1, 0x0301,
            // Base coverage.
            1, 1, 0x61,
            // Mark array: class 0.
            1, 0, 6,
            // Mark anchor.
            1, 50, 0,
            // Base array.
            1, 4,
            // Base anchor.
            1, 250, 700,
        ])
    }

    struct Font {
        head: Vec<u8>,
        hhea: Vec<u8>,
        maxp: Vec<u8>,
        gpos: Vec<u8>,
    }

    impl Font {
        fn new() -> Self {
            Font {
                head: head(),
                hhea: hhea(1),
                maxp: maxp(0x0400),
                gpos: positioning_table(),
            }
        }

        fn face(&self) -> ttf_parser::Face<'_> {
            ttf_parser::Face::from_raw_tables(ttf_parser::RawFaceTables {
                head: &self.head,
                hhea: &self.hhea,
                maxp: &self.maxp,
                gpos: Some(&self.gpos),
                ..Default::default()
            })
            .unwrap()
        }
    }

    fn buffer(glyphs: &[u16]) -> hb_buffer_t {
        let mut buffer = hb_buffer_t::new();
        for (i, &g) in glyphs.iter().enumerate() {
            buffer.add_glyph(GlyphId(g), 0, i as u32);
        }
        buffer.clear_positions();
        buffer
    }

    #[test]
    fn all_features_of_the_script() {
        let font = Font::new();
        let gpos = TtfPositioningTable::from_face(&font.face()).unwrap();

        let script = gpos.select_script(hb_tag_t::from_bytes(b"latn")).unwrap();
        assert_eq!(
            gpos.script_features(script),
            [hb_tag_t::from_bytes(b"kern"), hb_tag_t::from_bytes(b"mark")]
        );
    }

    #[test]
    fn kerning_and_marks() {
        let font = Font::new();
        let gpos = TtfPositioningTable::from_face(&font.face()).unwrap();

        let mut buf = buffer(&[0x41, 0x56, 0x61, 0x0301]);
        let features = [(0, POSITIONING_PROPERTIES), (1, POSITIONING_PROPERTIES)];
        gpos.position(&features, &mut buf).unwrap();

        let positions = buf.positions();
        assert_eq!(positions[0].x_advance, -80);
        assert_eq!(positions[1], Position::default());
        assert_eq!(positions[2], Position::default());
        assert_eq!(
            positions[3],
            Position {
                x_pos: 200,
                y_pos: 700,
                back: 1,
                new_advance: true,
                ..Position::default()
            }
        );
    }

    #[test]
    fn nothing_to_position() {
        let font = Font::new();
        let gpos = TtfPositioningTable::from_face(&font.face()).unwrap();

        let mut buf = buffer(&[0x56, 0x41, 0x0301]);
        let features = [(0, POSITIONING_PROPERTIES), (1, POSITIONING_PROPERTIES)];
        assert_eq!(gpos.position(&features, &mut buf), Err(LayoutError::NotCovered));
        assert!(buf.positions().iter().all(|p| *p == Position::default()));
    }
}
