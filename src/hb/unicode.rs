//! Unicode character properties used by the shaper.

pub use unicode_properties::GeneralCategory;
use unicode_properties::UnicodeGeneralCategory;

use super::line_break::LineBreakClass;

pub type Codepoint = u32;

#[allow(dead_code)]
pub mod combining_class {
    pub const NotReordered: u8 = 0;
    pub const Virama: u8 = 9;

    pub const AttachedBelowLeft: u8 = 200;
    pub const AttachedBelow: u8 = 202;
    pub const AttachedBelowRight: u8 = 204;
    pub const AttachedLeft: u8 = 208;
    pub const AttachedRight: u8 = 210;
    pub const AttachedAboveLeft: u8 = 212;
    pub const AttachedAbove: u8 = 214;
    pub const AttachedAboveRight: u8 = 216;

    pub const BelowLeft: u8 = 218;
    pub const Below: u8 = 220;
    pub const BelowRight: u8 = 222;
    pub const Left: u8 = 224;
    pub const Right: u8 = 226;
    pub const AboveLeft: u8 = 228;
    pub const Above: u8 = 230;
    pub const AboveRight: u8 = 232;

    pub const DoubleBelow: u8 = 233;
    pub const DoubleAbove: u8 = 234;
    pub const IotaSubscript: u8 = 240;
}

#[inline]
pub fn is_high_surrogate(u: u16) -> bool {
    (0xD800..0xDC00).contains(&u)
}

#[inline]
pub fn is_low_surrogate(u: u16) -> bool {
    (0xDC00..0xE000).contains(&u)
}

#[inline]
pub fn is_surrogate(u: Codepoint) -> bool {
    (0xD800..0xE000).contains(&u)
}

#[inline]
pub fn surrogate_to_ucs4(high: u16, low: u16) -> Codepoint {
    (((u32::from(high) & 0x3FF) << 10) | (u32::from(low) & 0x3FF)) + 0x10000
}

/// Returns the code point starting at `i` and the number of code units it occupies.
///
/// Unpaired surrogates are returned as is.
#[inline]
pub fn code_point_at(text: &[u16], i: usize) -> (Codepoint, usize) {
    let u = text[i];
    if is_high_surrogate(u) {
        if let Some(&low) = text.get(i + 1) {
            if is_low_surrogate(low) {
                return (surrogate_to_ucs4(u, low), 2);
            }
        }
    }

    (u32::from(u), 1)
}

/// Iterates over the code points of a UTF-16 slice.
///
/// Yields the code unit index of each code point along with the code point.
pub fn code_points(text: &[u16]) -> impl Iterator<Item = (usize, Codepoint)> + '_ {
    let mut i = 0;
    core::iter::from_fn(move || {
        if i >= text.len() {
            return None;
        }

        let start = i;
        let (cp, len) = code_point_at(text, i);
        i += len;
        Some((start, cp))
    })
}

pub fn general_category(u: Codepoint) -> GeneralCategory {
    match char::from_u32(u) {
        Some(c) => c.general_category(),
        None => GeneralCategory::Surrogate,
    }
}

pub fn combining_class(u: Codepoint) -> u8 {
    match char::from_u32(u) {
        Some(c) => unicode_ccc::get_canonical_combining_class(c) as u8,
        None => 0,
    }
}

#[inline]
pub fn char_properties(u: Codepoint) -> (GeneralCategory, u8) {
    (general_category(u), combining_class(u))
}

/// Zero-width and bidi control characters that are never printed.
#[inline]
pub fn is_control_char(u: Codepoint) -> bool {
    // ZWSP, ZWNJ, ZWJ, LRM, RLM
    (0x200B..=0x200F).contains(&u)
        // LS, PS, LRE, RLE, PDF, LRO, RLO, NNBSP
        || (0x2028..=0x202F).contains(&u)
        // ISS, ASS, IAFS, AIFS, NADS, NODS
        || (0x206A..=0x206F).contains(&u)
}

pub fn mirrored(u: Codepoint) -> Codepoint {
    char::from_u32(u)
        .and_then(unicode_bidi_mirroring::get_mirrored)
        .map_or(u, u32::from)
}

/// Returns the line break class of a code point.
///
/// Classes the break table doesn't know are resolved here.
pub fn line_break_class(u: Codepoint) -> LineBreakClass {
    use unicode_linebreak::BreakClass as B;
    use LineBreakClass as C;

    if is_surrogate(u) {
        return C::SG;
    }

    match unicode_linebreak::break_property(u) {
        B::OpenPunctuation => C::OP,
        B::ClosePunctuation | B::CloseParenthesis => C::CL,
        B::Quotation => C::QU,
        B::NonBreakingGlue => C::GL,
        B::NonStarter | B::ConditionalJapaneseStarter => C::NS,
        B::Exclamation => C::EX,
        B::Symbol => C::SY,
        B::InfixSeparator => C::IS,
        B::Prefix => C::PR,
        B::Postfix => C::PO,
        B::Numeric => C::NU,
        B::Ideographic | B::Contingent | B::EmojiBase | B::EmojiModifier => C::ID,
        B::Inseparable => C::IN,
        B::Hyphen => C::HY,
        B::After => C::BA,
        B::Before => C::BB,
        B::BeforeAndAfter => C::B2,
        B::ZeroWidthSpace => C::ZW,
        B::CombiningMark | B::ZeroWidthJoiner => C::CM,
        B::WordJoiner => C::WJ,
        B::HangulLvSyllable => C::H2,
        B::HangulLvtSyllable => C::H3,
        B::HangulLJamo => C::JL,
        B::HangulVJamo => C::JV,
        B::HangulTJamo => C::JT,
        B::ComplexContext => C::SA,
        B::Surrogate => C::SG,
        B::Space => C::SP,
        B::CarriageReturn => C::CR,
        B::LineFeed => C::LF,
        B::Mandatory | B::NextLine => C::BK,
        // AI, XX, HL, RI and anything newer.
        _ => C::AL,
    }
}
