use alloc::vec::Vec;

use smallvec::SmallVec;
use ttf_parser::gsub::{SingleSubstitution, SubstitutionSubtable};
use ttf_parser::opentype_layout::{FeatureIndex, Lookup, ScriptIndex};
use ttf_parser::GlyphId;

use super::error::LayoutError;
use super::hb_tag_t;
use super::ot_layout::{hb_buffer_t, LayoutTable, SubstitutionTable};
use super::ot_layout_common::{lookup_applies, ActiveLookup, GlyphFilter, LayoutTableExt};

/// A GSUB table read with `ttf-parser`.
///
/// Supports single, multiple, alternate and ligature substitutions.
/// Contextual lookups are ignored.
#[derive(Clone)]
pub struct TtfSubstitutionTable<'a> {
    table: ttf_parser::opentype_layout::LayoutTable<'a>,
    gdef: Option<ttf_parser::gdef::Table<'a>>,
}

impl<'a> TtfSubstitutionTable<'a> {
    /// Creates a new provider from a parsed GSUB table and an optional GDEF table.
    pub fn new(
        table: ttf_parser::opentype_layout::LayoutTable<'a>,
        gdef: Option<ttf_parser::gdef::Table<'a>>,
    ) -> Self {
        TtfSubstitutionTable { table, gdef }
    }

    /// Creates a new provider from the GSUB table of a face.
    pub fn from_face(face: &ttf_parser::Face<'a>) -> Option<Self> {
        let tables = face.tables();
        Some(Self::new(tables.gsub?, tables.gdef))
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
            .into_iter::<SubstitutionSubtable>()
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
                next = apply_subtable(subtable, active, &filter, i, buffer)?;
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

impl LayoutTable for TtfSubstitutionTable<'_> {
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

impl SubstitutionTable for TtfSubstitutionTable<'_> {
    fn substitute(
        &self,
        features: &[(FeatureIndex, u32)],
        buffer: &mut hb_buffer_t,
    ) -> Result<(), LayoutError> {
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
                log::trace!("GSUB lookup {} applied", active.index);
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

/// Applies a subtable at `i`.
///
/// Returns the index to continue from, or `None` when the subtable doesn't
/// cover the glyph.
fn apply_subtable(
    subtable: &SubstitutionSubtable,
    active: ActiveLookup,
    filter: &GlyphFilter,
    i: usize,
    buffer: &mut hb_buffer_t,
) -> Result<Option<usize>, LayoutError> {
    let invalid = LayoutError::InvalidSubtable {
        lookup: active.index,
    };
    let glyph = buffer.glyphs()[i].glyph;

    match subtable {
        SubstitutionSubtable::Single(t) => {
            let subst = match *t {
                SingleSubstitution::Format1 { coverage, delta } => {
                    if coverage.get(glyph).is_none() {
                        return Ok(None);
                    }

                    // Always truncated to 16 bits.
                    GlyphId((i32::from(glyph.0) + i32::from(delta)) as u16)
                }
                SingleSubstitution::Format2 {
                    coverage,
                    substitutes,
                } => {
                    let Some(index) = coverage.get(glyph) else {
                        return Ok(None);
                    };
                    substitutes.get(index).ok_or(invalid)?
                }
            };

            buffer.replace_glyph(i, subst);
            Ok(Some(i + 1))
        }
        SubstitutionSubtable::Multiple(t) => {
            let Some(index) = t.coverage.get(glyph) else {
                return Ok(None);
            };

            let sequence = t.sequences.get(index).ok_or(invalid)?;
            let glyphs: SmallVec<[GlyphId; 4]> = sequence.substitutes.into_iter().collect();
            buffer.replace_with_sequence(i, &glyphs);
            Ok(Some(i + glyphs.len()))
        }
        SubstitutionSubtable::Alternate(t) => {
            let Some(index) = t.coverage.get(glyph) else {
                return Ok(None);
            };

            let set = t.alternate_sets.get(index).ok_or(invalid)?;
            match set.alternates.get(0) {
                Some(alternate) => {
                    buffer.replace_glyph(i, alternate);
                    Ok(Some(i + 1))
                }
                None => Ok(None),
            }
        }
        SubstitutionSubtable::Ligature(t) => {
            let Some(index) = t.coverage.get(glyph) else {
                return Ok(None);
            };

            let set = t.ligature_sets.get(index).ok_or(invalid)?;
            for ligature in set {
                let mut components: SmallVec<[usize; 8]> = SmallVec::new();
                let mut j = i;
                let matched = ligature.components.into_iter().all(|component| {
                    match filter.next(buffer.glyphs(), j) {
                        Some(k) if buffer.glyphs()[k].glyph == component => {
                            components.push(k);
                            j = k;
                            true
                        }
                        _ => false,
                    }
                });

                if matched {
                    buffer.ligate(i, &components, ligature.glyph);
                    return Ok(Some(i + 1));
                }
            }

            Ok(None)
        }
        _ => Ok(None),
    }
}
