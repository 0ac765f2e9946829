use alloc::vec;
use alloc::vec::Vec;

use super::error::ShapeError;
use super::unicode::{self, combining_class, Codepoint, GeneralCategory};

/// Justification opportunity after a glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Justification {
    /// No justification point.
    #[default]
    NoJustification,
    /// Inter-word space.
    Space,
    /// Inter-character point.
    Character,
}

/// Per-glyph attributes produced by the shaper.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GlyphAttributes {
    /// The glyph is a combining mark.
    pub mark: bool,
    /// The glyph starts a cluster.
    pub cluster_start: bool,
    /// The glyph should not be drawn.
    pub dont_print: bool,
    /// Canonical combining class, or the class assigned to a zero class mark.
    pub combining_class: u8,
    /// Justification opportunity after the glyph.
    pub justification: Justification,
}

/// Assigns default glyph attributes and a character to glyph map to a run
/// mapped one glyph per code point.
///
/// Returns the attributes of `num_glyphs` glyphs and one cluster entry per
/// code unit of `text`. Fails with [`ShapeError::GlyphCount`] when
/// `num_glyphs` is not the number of code points in `text`.
pub fn heuristic_set_glyph_attributes(
    text: &[u16],
    num_glyphs: usize,
    symbol_font: bool,
) -> Result<(Vec<GlyphAttributes>, Vec<u32>), ShapeError> {
    check_glyph_count(text, num_glyphs)?;

    let mut attributes = vec![GlyphAttributes::default(); num_glyphs];
    let mut log_clusters = vec![0; text.len()];
    fill_glyph_attributes(text, symbol_font, &mut attributes, &mut log_clusters);
    Ok((attributes, log_clusters))
}

pub(crate) fn check_glyph_count(text: &[u16], num_glyphs: usize) -> Result<(), ShapeError> {
    let expected = unicode::code_points(text).count();
    if expected != num_glyphs {
        return Err(ShapeError::GlyphCount {
            expected,
            actual: num_glyphs,
        });
    }

    Ok(())
}

/// Fills `attributes` and `log_clusters`.
///
/// The glyph count must have been checked with `check_glyph_count`.
pub(crate) fn fill_glyph_attributes(
    text: &[u16],
    symbol_font: bool,
    attributes: &mut [GlyphAttributes],
    log_clusters: &mut [u32],
) {
    debug_assert_eq!(text.len(), log_clusters.len());

    if text.is_empty() {
        return;
    }

    let mut glyph = 0;
    let mut i = 0;
    while i < text.len() {
        let (_, len) = unicode::code_point_at(text, i);
        log_clusters[i..i + len].fill(glyph);
        glyph += 1;
        i += len;
    }

    let hidden = |u: Codepoint| (!symbol_font && u == 0x00AD) || unicode::is_control_char(u);

    let (first, first_len) = unicode::code_point_at(text, 0);
    attributes[0] = GlyphAttributes {
        mark: false,
        cluster_start: true,
        dont_print: hidden(first),
        combining_class: 0,
        justification: Justification::NoJustification,
    };

    let mut cluster_start = 0;
    let mut pos = 0;
    let mut last_category = unicode::general_category(first);
    let mut i = first_len;
    while i < text.len() {
        let (u, len) = unicode::code_point_at(text, i);
        let glyph = log_clusters[i] as usize;

        pos += 1;
        while pos < glyph {
            attributes[pos] = attributes[pos - 1];
            pos += 1;
        }

        let mut attrs = GlyphAttributes {
            dont_print: hidden(u),
            ..GlyphAttributes::default()
        };

        let (category, ccc) = unicode::char_properties(u);
        if category != GeneralCategory::NonspacingMark {
            attrs.cluster_start = true;
            cluster_start = log_clusters[i];
        } else {
            attrs.mark = true;
            attrs.combining_class = if ccc == 0 { zero_class_fixup(u) } else { ccc };
            log_clusters[i..i + len].fill(cluster_start);
        }
        attributes[pos] = attrs;

        attributes[pos - 1].justification = if last_category == GeneralCategory::SpaceSeparator {
            Justification::Space
        } else if category != GeneralCategory::NonspacingMark {
            Justification::Character
        } else {
            Justification::NoJustification
        };

        last_category = category;
        i += len;
    }

    let last = log_clusters[text.len() - 1] as usize;
    attributes[last].justification = if last_category == GeneralCategory::SpaceSeparator {
        Justification::Space
    } else {
        Justification::Character
    };
}

// Thai and Lao marks that stack visually but have no combining class.
fn zero_class_fixup(u: Codepoint) -> u8 {
    match u {
        0x0E31 | 0x0E34..=0x0E37 | 0x0E47 | 0x0E4C..=0x0E4E => combining_class::AboveRight,
        0x0EB1 | 0x0EB4..=0x0EB7 | 0x0EBB | 0x0ECC | 0x0ECD => combining_class::Above,
        0x0EBC => combining_class::Below,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn one_glyph_per_char() {
        let text = utf16("abc");
        let (attrs, clusters) = heuristic_set_glyph_attributes(&text, 3, false).unwrap();
        assert_eq!(clusters, [0, 1, 2]);
        assert!(attrs.iter().all(|a| a.cluster_start && !a.mark));
        assert!(attrs
            .iter()
            .all(|a| a.justification == Justification::Character));
    }

    #[test]
    fn marks_join_the_cluster() {
        let text = utf16("a\u{301}b");
        let (attrs, clusters) = heuristic_set_glyph_attributes(&text, 3, false).unwrap();
        assert_eq!(clusters, [0, 0, 2]);
        assert!(attrs[1].mark);
        assert!(!attrs[1].cluster_start);
        assert_eq!(attrs[1].combining_class, combining_class::Above);
        assert_eq!(attrs[0].justification, Justification::NoJustification);
        assert_eq!(attrs[1].justification, Justification::Character);
        assert_eq!(attrs[2].justification, Justification::Character);
    }

    #[test]
    fn first_glyph_is_never_a_mark() {
        let text = utf16("\u{301}a");
        let (attrs, clusters) = heuristic_set_glyph_attributes(&text, 2, false).unwrap();
        assert!(!attrs[0].mark);
        assert!(attrs[0].cluster_start);
        assert_eq!(clusters, [0, 1]);
    }

    #[test]
    fn space_justification() {
        let text = utf16("a b ");
        let (attrs, _) = heuristic_set_glyph_attributes(&text, 4, false).unwrap();
        assert_eq!(attrs[0].justification, Justification::Character);
        assert_eq!(attrs[1].justification, Justification::Space);
        assert_eq!(attrs[3].justification, Justification::Space);
    }

    #[test]
    fn hidden_chars() {
        let text = utf16("a\u{AD}\u{200D}");
        let (attrs, _) = heuristic_set_glyph_attributes(&text, 3, false).unwrap();
        assert!(!attrs[0].dont_print);
        assert!(attrs[1].dont_print);
        assert!(attrs[2].dont_print);

        let (attrs, _) = heuristic_set_glyph_attributes(&text, 3, true).unwrap();
        assert!(!attrs[1].dont_print);
        assert!(attrs[2].dont_print);

        let text = utf16("\u{AD}");
        let (attrs, _) = heuristic_set_glyph_attributes(&text, 1, false).unwrap();
        assert!(attrs[0].dont_print);
    }

    #[test]
    fn thai_and_lao_fixups() {
        let text = utf16("\u{E01}\u{E31}\u{E81}\u{EB1}\u{EBC}");
        let (attrs, clusters) = heuristic_set_glyph_attributes(&text, 5, false).unwrap();
        assert_eq!(attrs[1].combining_class, combining_class::AboveRight);
        assert_eq!(attrs[3].combining_class, combining_class::Above);
        assert_eq!(attrs[4].combining_class, combining_class::Below);
        assert_eq!(clusters, [0, 0, 2, 2, 2]);
    }

    #[test]
    fn surrogate_pairs_share_a_glyph() {
        let text = [0xD83D, 0xDE00, 0x61];
        let (attrs, clusters) = heuristic_set_glyph_attributes(&text, 2, false).unwrap();
        assert_eq!(clusters, [0, 0, 1]);
        assert_eq!(attrs.len(), 2);
        assert!(attrs[1].cluster_start);
    }

    #[test]
    fn glyph_count_mismatch() {
        let text = utf16("ab");
        assert_eq!(
            heuristic_set_glyph_attributes(&text, 3, false),
            Err(ShapeError::GlyphCount {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn empty() {
        let (attrs, clusters) = heuristic_set_glyph_attributes(&[], 0, false).unwrap();
        assert!(attrs.is_empty());
        assert!(clusters.is_empty());
    }
}
